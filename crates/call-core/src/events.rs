//! Event handling for call session operations
//!
//! Applications observe the session two ways, both fed by the same reducer
//! sites: an async [`SessionEventHandler`] registered on the manager, and a
//! broadcast stream obtained from
//! [`crate::session::manager::CallSessionManager::subscribe_events`].
//!
//! # Basic event handler
//!
//! ```rust
//! use telerehab_call_core::{RosterUpdate, SessionEventHandler, SessionStateInfo};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl SessionEventHandler for MyHandler {
//!     async fn on_session_state_changed(&self, info: SessionStateInfo) {
//!         println!("session {} is now {}", info.session_id, info.current);
//!     }
//!
//!     async fn on_roster_changed(&self, update: RosterUpdate) {
//!         println!("roster update: {:?}", update);
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::session::types::{ParticipantId, RemoteParticipant, SessionState};

/// A session lifecycle transition
#[derive(Debug, Clone)]
pub struct SessionStateInfo {
    /// Instance id of the session emitting the event
    pub session_id: Uuid,
    /// State before the transition
    pub previous: SessionState,
    /// State after the transition
    pub current: SessionState,
    /// Human-readable failure, set when the transition was caused by an error
    pub error: Option<String>,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

/// A change to the remote roster
#[derive(Debug, Clone)]
pub enum RosterUpdate {
    /// A participant entered the channel (media may still be disabled)
    ParticipantJoined { uid: ParticipantId },
    /// A participant's media availability changed; carries the full row
    MediaChanged { participant: RemoteParticipant },
    /// A participant left; its roster row was removed
    ParticipantLeft { uid: ParticipantId },
}

/// Events emitted by a call session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Lifecycle transition
    StateChanged { info: SessionStateInfo },
    /// Roster change
    RosterChanged { update: RosterUpdate },
    /// One-second appointment countdown tick
    CountdownTick { remaining_seconds: i64 },
}

/// Application-side receiver for session events
#[async_trait]
pub trait SessionEventHandler: Send + Sync {
    /// Called on every lifecycle transition, including error rollbacks
    async fn on_session_state_changed(&self, info: SessionStateInfo);

    /// Called whenever the remote roster changes
    async fn on_roster_changed(&self, update: RosterUpdate);

    /// Called once per second while an appointment countdown runs
    async fn on_countdown_tick(&self, _remaining_seconds: i64) {}
}
