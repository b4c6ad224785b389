//! Transport client adapter
//!
//! Single point of contact with the external media transport. Wraps every
//! SDK call, translates [`TransportFailure`] into typed [`CallError`]s at
//! this boundary, and owns the scoped event-sink registration so handlers
//! are released on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{CallError, CallResult};
use crate::session::config::{CallCredentials, MediaSettings};
use crate::session::types::{MediaKind, ParticipantId};
use crate::transport::sdk::{
    CameraInfo, ConnectionState, LocalAudioTrack, LocalVideoTrack, MediaTransport, RemoteTrack,
    TransportEventSink, TransportFailure,
};

/// Owns the transport client for the lifetime of one session instance
pub struct TransportAdapter {
    client: Arc<dyn MediaTransport>,
    initialized: AtomicBool,
}

impl TransportAdapter {
    /// Wrap a transport client
    pub fn new(client: Arc<dyn MediaTransport>) -> Self {
        Self {
            client,
            initialized: AtomicBool::new(false),
        }
    }

    /// Register the event sink; idempotent, a second call is ignored
    pub fn initialize(&self, sink: Arc<dyn TransportEventSink>) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.client.set_event_sink(sink);
            debug!("transport adapter initialized");
        } else {
            debug!("transport adapter already initialized, ignoring");
        }
    }

    /// Unregister the event sink; safe to call when never initialized
    pub fn teardown(&self) {
        if self
            .initialized
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.client.clear_event_sink();
            debug!("transport adapter torn down");
        }
    }

    /// Join a channel with backend-issued credentials
    ///
    /// Fails fast with a configuration error before any transport call when
    /// a credential is missing. If the client is not disconnected, a cleanup
    /// leave runs first to avoid an identity collision; a failure of that
    /// cleanup is logged and does not abort the join.
    pub async fn join(&self, credentials: &CallCredentials) -> CallResult<ParticipantId> {
        if credentials.app_id.is_empty() {
            return Err(CallError::config("app_id"));
        }
        if credentials.token.is_empty() {
            return Err(CallError::config("token"));
        }
        if credentials.channel.is_empty() {
            return Err(CallError::config("channel"));
        }

        if self.client.connection_state() != ConnectionState::Disconnected {
            warn!(
                state = %self.client.connection_state(),
                "transport not disconnected before join, leaving first"
            );
            if let Err(e) = self.client.leave().await {
                warn!("cleanup leave before re-join failed: {e}");
            }
        }

        match self
            .client
            .join(
                &credentials.app_id,
                &credentials.channel,
                &credentials.token,
                credentials.uid_hint,
            )
            .await
        {
            Ok(uid) => {
                debug!(%uid, channel = %credentials.channel, "transport join succeeded");
                Ok(uid)
            }
            Err(TransportFailure::IdentityConflict) => Err(CallError::IdentityConflict {
                channel: credentials.channel.clone(),
            }),
            Err(e) => Err(CallError::transport_join(e.to_string())),
        }
    }

    /// Leave the channel; no-op when already disconnected
    pub async fn leave(&self) -> CallResult<()> {
        if self.client.connection_state() == ConnectionState::Disconnected {
            debug!("transport already disconnected, leave is a no-op");
            return Ok(());
        }
        self.client
            .leave()
            .await
            .map_err(|e| CallError::internal(format!("transport leave failed: {e}")))
    }

    /// Acquire the local microphone and camera tracks
    pub async fn create_local_tracks(
        &self,
        media: &MediaSettings,
    ) -> CallResult<(Arc<dyn LocalAudioTrack>, Arc<dyn LocalVideoTrack>)> {
        self.client
            .create_microphone_and_camera_tracks(&media.audio, &media.video)
            .await
            .map_err(|e| CallError::device(format!("track acquisition failed: {e}")))
    }

    /// Publish the local track pair atomically
    pub async fn publish_local_tracks(
        &self,
        audio: Arc<dyn LocalAudioTrack>,
        video: Arc<dyn LocalVideoTrack>,
    ) -> CallResult<()> {
        self.client
            .publish(audio, video)
            .await
            .map_err(|e| CallError::publish(e.to_string()))
    }

    /// Subscribe to one participant's media of one kind
    ///
    /// A failure here is scoped: the caller leaves the roster untouched for
    /// that kind and keeps processing other participants.
    pub async fn subscribe(
        &self,
        uid: ParticipantId,
        kind: MediaKind,
    ) -> CallResult<Arc<dyn RemoteTrack>> {
        self.client
            .subscribe(uid, kind)
            .await
            .map_err(|e| CallError::subscribe(uid, kind, e.to_string()))
    }

    /// Enumerate available camera devices
    pub async fn list_cameras(&self) -> CallResult<Vec<CameraInfo>> {
        self.client
            .list_cameras()
            .await
            .map_err(|e| CallError::device(format!("camera enumeration failed: {e}")))
    }
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAdapter")
            .field("initialized", &self.initialized.load(Ordering::SeqCst))
            .field("connection_state", &self.client.connection_state())
            .finish()
    }
}
