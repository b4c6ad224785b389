//! Type definitions for the call-core library
//!
//! Data structures used throughout the session coordinator: participant
//! identity, session lifecycle states, the remote roster row, local media
//! ownership, and session statistics.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::sdk::{LocalAudioTrack, LocalVideoTrack};

/// Opaque participant identity assigned by the transport
///
/// Unique within a channel. The local identity is only known after a
/// successful join; remote identities arrive with transport events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media kind carried by a track or a publish/unpublish event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// Microphone / incoming voice
    Audio,
    /// Camera / incoming video
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Lifecycle state of one session instance
///
/// Transitions: `Idle -> Connecting -> Joined -> Idle` on the normal path,
/// `Connecting -> Idle` when a join fails. There is no direct
/// `Joined -> Connecting` transition; a joined session leaves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Not in a channel
    Idle,
    /// Join in progress (transport join, track acquisition, publish)
    Connecting,
    /// In the channel with local media published
    Joined,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Joined => write!(f, "joined"),
        }
    }
}

/// One row of the remote roster
///
/// Exists from the first event that mentions the participant until a
/// participant-left event removes it. The two media flags are updated
/// independently; an event for one kind never touches the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteParticipant {
    /// Transport-assigned identity, unique within the session
    pub uid: ParticipantId,
    /// Whether the participant currently publishes audio we are subscribed to
    pub has_audio: bool,
    /// Whether the participant currently publishes video we are subscribed to
    pub has_video: bool,
}

impl RemoteParticipant {
    /// Create a roster row with both media kinds inactive
    pub fn new(uid: ParticipantId) -> Self {
        Self {
            uid,
            has_audio: false,
            has_video: false,
        }
    }
}

/// The local user's outgoing media, exclusively owned by the session
///
/// Tracks are acquired after the transport join succeeds and must be stopped
/// and closed on every exit path, including error paths, so no hardware
/// handle dangles past the session.
#[derive(Default)]
pub struct LocalMediaState {
    /// Live microphone track, if acquired
    pub audio_track: Option<Arc<dyn LocalAudioTrack>>,
    /// Live camera track, if acquired
    pub video_track: Option<Arc<dyn LocalVideoTrack>>,
    /// Whether the microphone is muted
    pub is_mic_muted: bool,
    /// Whether the camera is disabled
    pub is_camera_off: bool,
}

impl fmt::Debug for LocalMediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMediaState")
            .field("audio_track", &self.audio_track.is_some())
            .field("video_track", &self.video_track.is_some())
            .field("is_mic_muted", &self.is_mic_muted)
            .field("is_camera_off", &self.is_camera_off)
            .finish()
    }
}

/// Snapshot of the session's current state and activity
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,
    /// Channel this session joins
    pub channel: String,
    /// Local identity, if joined
    pub local_uid: Option<ParticipantId>,
    /// Number of remote participants in the roster
    pub remote_participants: usize,
    /// Whether a live microphone track is held
    pub has_local_audio: bool,
    /// Whether a live camera track is held
    pub has_local_video: bool,
    /// Whether the microphone is muted
    pub is_mic_muted: bool,
    /// Whether the camera is disabled
    pub is_camera_off: bool,
    /// When the session joined the channel, if joined
    pub joined_at: Option<DateTime<Utc>>,
}
