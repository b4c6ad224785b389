//! # telerehab-call-core
//!
//! Video consultation session coordination layer for a rehabilitation
//! telehealth platform. Manages one client-side participation in an
//! SFU-backed media channel: the join/leave lifecycle, the roster of remote
//! participants, local microphone/camera ownership, render-target
//! reconciliation, and appointment-bound call duration.
//!
//! The transport itself (signaling, codecs, NAT traversal) is an external
//! collaborator consumed through the traits in [`transport::sdk`]; this
//! crate never talks to the network directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │    Call screen (UI)     │
//! └───────────┬─────────────┘
//!             │ join / leave / toggles
//! ┌───────────▼─────────────┐
//! │   CallSessionManager    │ ◄── state machine + roster + countdown
//! │  ┌───────────────────┐  │
//! │  │ TransportAdapter  │  │ ◄── typed-error boundary
//! │  └────────┬──────────┘  │
//! └───────────┼─────────────┘
//!             │ SDK capability traits
//! ┌───────────▼─────────────┐
//! │   Media transport SDK   │ (external)
//! └─────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telerehab_call_core::{
//!     CallCredentials, CallSessionConfig, CallSessionManager,
//! };
//! use telerehab_call_core::transport::sdk::{MediaTransport, RenderTargetRegistry};
//!
//! async fn start_call(
//!     transport: Arc<dyn MediaTransport>,
//!     targets: Arc<dyn RenderTargetRegistry>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CallSessionConfig::new(CallCredentials::new("A1", "room-5", "T1"));
//!     let session = CallSessionManager::new(config, transport, targets);
//!     session.join().await?;
//!     // ... call in progress ...
//!     session.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod events;
pub mod session;
pub mod transport;

pub use error::{CallError, CallResult};
pub use events::{RosterUpdate, SessionEvent, SessionEventHandler, SessionStateInfo};
pub use session::config::{AppointmentWindow, CallCredentials, CallSessionConfig, MediaSettings};
pub use session::manager::CallSessionManager;
pub use session::types::{
    MediaKind, ParticipantId, RemoteParticipant, SessionState, SessionStats,
};
pub use transport::adapter::TransportAdapter;
pub use transport::sdk::{
    AudioCaptureSettings, CameraInfo, ConnectionState, TransportFailure, VideoCaptureSettings,
};
