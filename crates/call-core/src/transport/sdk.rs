//! External transport SDK boundary
//!
//! The real-time media transport (an SFU client SDK) is consumed as a
//! black-box capability set behind the traits in this module: channel
//! membership, publish/subscribe, track primitives, device enumeration, and
//! event delivery. The core never implements these traits for a real
//! transport; it only calls them through the [`super::adapter::TransportAdapter`].
//! Tests supply mock implementations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::types::{MediaKind, ParticipantId};

/// Failure reported by the underlying transport SDK
///
/// Identity conflicts get their own case so the adapter can classify them;
/// everything else is carried as an opaque reason string.
#[derive(Debug, Clone, Error)]
pub enum TransportFailure {
    /// The identity is still considered present in the channel
    #[error("identity already present in channel")]
    IdentityConflict,
    /// Any other SDK-reported failure
    #[error("{0}")]
    Other(String),
}

/// Connection state of the transport client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not attached to any channel
    Disconnected,
    /// Join handshake in progress
    Connecting,
    /// Attached to a channel
    Connected,
}

/// Capture settings for the local microphone track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioCaptureSettings {
    /// Enable acoustic echo cancellation
    pub echo_cancellation: bool,
    /// Enable noise suppression
    pub noise_suppression: bool,
    /// Enable automatic gain control
    pub auto_gain_control: bool,
}

impl Default for AudioCaptureSettings {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Capture settings for the local camera track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCaptureSettings {
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Capture framerate in frames per second
    pub framerate: u32,
}

impl Default for VideoCaptureSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            framerate: 30,
        }
    }
}

/// A camera device reported by the transport's enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Stable device identifier usable with [`LocalVideoTrack::set_device`]
    pub device_id: String,
    /// Human-readable device label
    pub label: String,
}

/// Render target id for the local camera preview
pub const LOCAL_VIDEO_TARGET: &str = "local-video";

/// Render target id for one remote participant's video
pub fn remote_video_target(uid: ParticipantId) -> String {
    format!("remote-video-{uid}")
}

/// A mount point a track can be visually rendered into
///
/// The presentation layer supplies these; the core only requires that an
/// element can be looked up by a stable id and accepts play.
pub trait RenderTarget: Send + Sync {
    /// Stable id of the target, e.g. `local-video` or `remote-video-42`
    fn id(&self) -> &str;
}

/// Lookup of currently mounted render targets by id
///
/// A `None` result means the target is not mounted yet; the reconciler
/// retries on its next pass.
pub trait RenderTargetRegistry: Send + Sync {
    fn lookup(&self, id: &str) -> Option<Arc<dyn RenderTarget>>;
}

/// A live handle to a local capture track
#[async_trait]
pub trait LocalTrack: Send + Sync {
    /// Transport-assigned track id
    fn id(&self) -> &str;

    /// Which media kind this track carries
    fn kind(&self) -> MediaKind;

    /// Enable or disable the track without unpublishing it
    async fn set_enabled(&self, enabled: bool) -> Result<(), TransportFailure>;

    /// Render the track into a mounted target
    fn play(&self, target: &dyn RenderTarget) -> Result<(), TransportFailure>;

    /// Stop rendering and capturing
    fn stop(&self);

    /// Release the underlying hardware handle
    async fn close(&self);
}

/// Local microphone track
pub trait LocalAudioTrack: LocalTrack {}

/// Local camera track
#[async_trait]
pub trait LocalVideoTrack: LocalTrack {
    /// Switch the underlying capture device in place, keeping the track
    /// published
    async fn set_device(&self, device_id: &str) -> Result<(), TransportFailure>;

    /// Device currently backing the track, if known
    fn current_device(&self) -> Option<String>;
}

/// A subscribed remote media track
pub trait RemoteTrack: Send + Sync {
    /// Transport-assigned track id
    fn id(&self) -> &str;

    /// Which media kind this track carries
    fn kind(&self) -> MediaKind;

    /// Render the track into a mounted target
    fn play(&self, target: &dyn RenderTarget) -> Result<(), TransportFailure>;

    /// Stop rendering
    fn stop(&self);
}

/// Receiver for the four transport events the core reacts to
///
/// Registered through [`MediaTransport::set_event_sink`] on initialize and
/// released on teardown; the scoped registration replaces the SDK's raw
/// `on`/`off` pairs.
#[async_trait]
pub trait TransportEventSink: Send + Sync {
    async fn on_participant_joined(&self, uid: ParticipantId);
    async fn on_media_published(&self, uid: ParticipantId, kind: MediaKind);
    async fn on_media_unpublished(&self, uid: ParticipantId, kind: MediaKind);
    async fn on_participant_left(&self, uid: ParticipantId);
}

/// The transport client capability set
///
/// One client instance exists per mounted session and is exclusively owned
/// by it; the transport enforces single membership per identity in a channel.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Current connection state of the client
    fn connection_state(&self) -> ConnectionState;

    /// Register the event sink (participant/media events)
    fn set_event_sink(&self, sink: Arc<dyn TransportEventSink>);

    /// Unregister the event sink
    fn clear_event_sink(&self);

    /// Join a channel with backend-issued credentials, returning the
    /// assigned identity
    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: &str,
        uid_hint: Option<u64>,
    ) -> Result<ParticipantId, TransportFailure>;

    /// Leave the current channel
    async fn leave(&self) -> Result<(), TransportFailure>;

    /// Publish the local track pair; either both tracks publish or the call
    /// fails as a whole
    async fn publish(
        &self,
        audio: Arc<dyn LocalAudioTrack>,
        video: Arc<dyn LocalVideoTrack>,
    ) -> Result<(), TransportFailure>;

    /// Subscribe to one participant's media of one kind
    async fn subscribe(
        &self,
        uid: ParticipantId,
        kind: MediaKind,
    ) -> Result<Arc<dyn RemoteTrack>, TransportFailure>;

    /// Acquire the local microphone and camera tracks
    async fn create_microphone_and_camera_tracks(
        &self,
        audio: &AudioCaptureSettings,
        video: &VideoCaptureSettings,
    ) -> Result<(Arc<dyn LocalAudioTrack>, Arc<dyn LocalVideoTrack>), TransportFailure>;

    /// Enumerate available camera devices
    async fn list_cameras(&self) -> Result<Vec<CameraInfo>, TransportFailure>;
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}
