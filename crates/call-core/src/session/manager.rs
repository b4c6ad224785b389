//! Session state machine
//!
//! `CallSessionManager` coordinates one participation in a consultation
//! channel: the join/leave lifecycle, the remote roster, local media
//! ownership, and the appointment countdown. One manager exists per mounted
//! call screen; the transport client and the local tracks are exclusively
//! owned by it.
//!
//! Lifecycle: `Idle -> Connecting -> Joined -> Idle` on the normal path,
//! `Connecting -> Idle` with a recorded error when any join step fails. A
//! join issued while another is connecting (or while joined) is ignored,
//! not queued.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CallError, CallResult};
use crate::events::{RosterUpdate, SessionEvent, SessionEventHandler, SessionStateInfo};
use crate::session::config::CallSessionConfig;
use crate::session::renderer::{BoundTrack, RenderReconciler};
use crate::session::timer::CountdownTimer;
use crate::session::types::{
    LocalMediaState, MediaKind, ParticipantId, RemoteParticipant, SessionState, SessionStats,
};
use crate::transport::adapter::TransportAdapter;
use crate::transport::sdk::{
    remote_video_target, MediaTransport, RemoteTrack, RenderTargetRegistry, TransportEventSink,
    LOCAL_VIDEO_TARGET,
};

/// Delay before the single silent retry after an identity conflict
const IDENTITY_CONFLICT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Capacity of the broadcast event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Roster row plus the subscribed track handles it owns
pub(crate) struct RemoteParticipantEntry {
    pub info: RemoteParticipant,
    pub audio_track: Option<Arc<dyn RemoteTrack>>,
    pub video_track: Option<Arc<dyn RemoteTrack>>,
}

impl RemoteParticipantEntry {
    fn new(uid: ParticipantId) -> Self {
        Self {
            info: RemoteParticipant::new(uid),
            audio_track: None,
            video_track: None,
        }
    }
}

/// Coordinator for one call session instance
pub struct CallSessionManager {
    session_id: Uuid,
    config: CallSessionConfig,
    adapter: Arc<TransportAdapter>,
    state: RwLock<SessionState>,
    local: RwLock<LocalMediaState>,
    roster: DashMap<ParticipantId, RemoteParticipantEntry>,
    local_uid: RwLock<Option<ParticipantId>>,
    joined_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<CallError>>,
    event_handler: RwLock<Option<Arc<dyn SessionEventHandler>>>,
    event_tx: broadcast::Sender<SessionEvent>,
    reconciler: RenderReconciler,
    countdown: CountdownTimer,
    self_weak: Weak<CallSessionManager>,
}

impl CallSessionManager {
    /// Create a session over a transport client and a render-target registry
    ///
    /// Registers the transport event sink immediately; call
    /// [`shutdown`](Self::shutdown) on unmount to release it again.
    pub fn new(
        config: CallSessionConfig,
        transport: Arc<dyn MediaTransport>,
        targets: Arc<dyn RenderTargetRegistry>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let manager = Arc::new_cyclic(|weak| Self {
            session_id: Uuid::new_v4(),
            config,
            adapter: Arc::new(TransportAdapter::new(transport)),
            state: RwLock::new(SessionState::Idle),
            local: RwLock::new(LocalMediaState::default()),
            roster: DashMap::new(),
            local_uid: RwLock::new(None),
            joined_at: RwLock::new(None),
            last_error: RwLock::new(None),
            event_handler: RwLock::new(None),
            event_tx,
            reconciler: RenderReconciler::new(targets),
            countdown: CountdownTimer::new(),
            self_weak: weak.clone(),
        });
        manager.adapter.initialize(manager.clone());
        manager
    }

    /// Register the application event handler
    pub async fn set_event_handler(&self, handler: Arc<dyn SessionEventHandler>) {
        *self.event_handler.write().await = Some(handler);
    }

    /// Subscribe to the broadcast event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Join the configured channel, acquire local media, and publish it
    ///
    /// No-op while already connecting or joined. On any step failure the
    /// session rolls back to idle, partially acquired tracks are released,
    /// and the error is recorded; the session is never left connecting
    /// indefinitely. An identity conflict is retried once silently before
    /// being treated as a failure.
    pub async fn join(&self) -> CallResult<()> {
        {
            let mut state = self.state.write().await;
            match *state {
                SessionState::Connecting | SessionState::Joined => {
                    debug!(session_id = %self.session_id, current = %*state,
                        "join ignored: session already active");
                    return Ok(());
                }
                SessionState::Idle => {}
            }
            if let Err(e) = self.config.validate() {
                drop(state);
                self.record_error(&e).await;
                return Err(e);
            }
            *state = SessionState::Connecting;
        }
        self.emit_state(SessionState::Idle, SessionState::Connecting, None)
            .await;

        match self.join_inner().await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    *state = SessionState::Joined;
                }
                self.emit_state(SessionState::Connecting, SessionState::Joined, None)
                    .await;
                info!(session_id = %self.session_id,
                    channel = %self.config.credentials.channel, "call session joined");
                if let Some(window) = &self.config.appointment {
                    self.countdown.start(self.self_weak.clone(), window.clone());
                }
                self.refresh_render_targets().await;
                Ok(())
            }
            Err(err) => {
                self.record_error(&err).await;
                self.release_local_tracks().await;
                {
                    let mut state = self.state.write().await;
                    *state = SessionState::Idle;
                }
                self.emit_state(
                    SessionState::Connecting,
                    SessionState::Idle,
                    Some(err.to_string()),
                )
                .await;
                Err(err)
            }
        }
    }

    /// The join sequence proper: transport join, track acquisition, publish
    ///
    /// Cleans up after itself on failure (leaves the channel, closes any
    /// tracks it created) so the caller only has to reset session state.
    async fn join_inner(&self) -> CallResult<()> {
        let credentials = &self.config.credentials;

        let uid = match self.adapter.join(credentials).await {
            Ok(uid) => uid,
            Err(CallError::IdentityConflict { .. }) => {
                warn!(channel = %credentials.channel,
                    "identity conflict joining channel, retrying once");
                tokio::time::sleep(IDENTITY_CONFLICT_RETRY_DELAY).await;
                self.adapter.join(credentials).await?
            }
            Err(e) => return Err(e),
        };

        let (audio, video) = match self.adapter.create_local_tracks(&self.config.media).await {
            Ok(tracks) => tracks,
            Err(e) => {
                if let Err(leave_err) = self.adapter.leave().await {
                    warn!("leave after failed track acquisition failed: {leave_err}");
                }
                return Err(e);
            }
        };

        if let Err(e) = self
            .adapter
            .publish_local_tracks(audio.clone(), video.clone())
            .await
        {
            audio.stop();
            audio.close().await;
            video.stop();
            video.close().await;
            if let Err(leave_err) = self.adapter.leave().await {
                warn!("leave after failed publish failed: {leave_err}");
            }
            return Err(e);
        }

        {
            let mut local = self.local.write().await;
            local.audio_track = Some(audio);
            local.video_track = Some(video);
            local.is_mic_muted = false;
            local.is_camera_off = false;
        }
        *self.local_uid.write().await = Some(uid);
        *self.joined_at.write().await = Some(Utc::now());
        Ok(())
    }

    /// Leave the channel and release every held resource
    ///
    /// No-op when already idle. Stops and closes the local tracks exactly
    /// once, stops subscribed remote tracks, clears the roster and render
    /// bindings, and cancels the appointment countdown.
    pub async fn leave(&self) -> CallResult<()> {
        let previous = {
            let mut state = self.state.write().await;
            if *state == SessionState::Idle {
                debug!(session_id = %self.session_id, "leave ignored: session already idle");
                return Ok(());
            }
            let previous = *state;
            *state = SessionState::Idle;
            previous
        };

        self.countdown.stop();
        self.reconciler.clear().await;
        self.release_local_tracks().await;
        self.clear_roster();

        if let Err(e) = self.adapter.leave().await {
            warn!(session_id = %self.session_id, "transport leave failed: {e}");
        }

        *self.local_uid.write().await = None;
        *self.joined_at.write().await = None;

        self.emit_state(previous, SessionState::Idle, None).await;
        info!(session_id = %self.session_id, "call session left");
        Ok(())
    }

    /// Unmount path: leave if needed, then release the transport event sink
    ///
    /// Safe to call repeatedly and when the session never joined.
    pub async fn shutdown(&self) -> CallResult<()> {
        self.leave().await?;
        self.adapter.teardown();
        Ok(())
    }

    /// Re-scan all known video tracks against the mounted render targets
    ///
    /// The presentation layer calls this when a target mounts; the reducers
    /// call it on every roster change. Safe to invoke any number of times
    /// in any order relative to track readiness.
    pub async fn refresh_render_targets(&self) {
        let mut desired: Vec<(String, BoundTrack)> = Vec::new();
        {
            let local = self.local.read().await;
            if let Some(video) = &local.video_track {
                desired.push((
                    LOCAL_VIDEO_TARGET.to_string(),
                    BoundTrack::LocalVideo(video.clone()),
                ));
            }
        }
        for entry in self.roster.iter() {
            let e = entry.value();
            if e.info.has_video {
                if let Some(track) = &e.video_track {
                    desired.push((
                        remote_video_target(e.info.uid),
                        BoundTrack::Remote(track.clone()),
                    ));
                }
            }
        }
        self.reconciler.reconcile(desired).await;
    }

    // ===== Queries =====

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Last recorded operation failure, if any
    pub async fn last_error(&self) -> Option<CallError> {
        self.last_error.read().await.clone()
    }

    /// Local identity assigned by the transport, if joined
    pub async fn local_uid(&self) -> Option<ParticipantId> {
        *self.local_uid.read().await
    }

    /// Snapshot of the remote roster, ordered by uid for stable UI
    pub fn remote_participants(&self) -> Vec<RemoteParticipant> {
        let mut rows: Vec<RemoteParticipant> = self
            .roster
            .iter()
            .map(|entry| entry.value().info.clone())
            .collect();
        rows.sort_by_key(|p| p.uid);
        rows
    }

    /// Roster row for one participant, if present
    pub fn remote_participant(&self, uid: ParticipantId) -> Option<RemoteParticipant> {
        self.roster.get(&uid).map(|entry| entry.value().info.clone())
    }

    /// Whether the microphone is currently muted
    pub async fn is_mic_muted(&self) -> bool {
        self.local.read().await.is_mic_muted
    }

    /// Whether the camera is currently disabled
    pub async fn is_camera_off(&self) -> bool {
        self.local.read().await.is_camera_off
    }

    /// Snapshot of the session's current state and activity
    pub async fn stats(&self) -> SessionStats {
        let local = self.local.read().await;
        SessionStats {
            state: *self.state.read().await,
            channel: self.config.credentials.channel.clone(),
            local_uid: *self.local_uid.read().await,
            remote_participants: self.roster.len(),
            has_local_audio: local.audio_track.is_some(),
            has_local_video: local.video_track.is_some(),
            is_mic_muted: local.is_mic_muted,
            is_camera_off: local.is_camera_off,
            joined_at: *self.joined_at.read().await,
        }
    }

    /// Instance id of this session
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    // ===== Internal helpers =====

    pub(crate) fn adapter(&self) -> &TransportAdapter {
        &self.adapter
    }

    pub(crate) fn local_media(&self) -> &RwLock<LocalMediaState> {
        &self.local
    }

    pub(crate) async fn record_error(&self, err: &CallError) {
        warn!(session_id = %self.session_id, "operation failed: {err}");
        *self.last_error.write().await = Some(err.clone());
    }

    /// Stop and close both local tracks; each handle is taken first so the
    /// release runs at most once per track
    async fn release_local_tracks(&self) {
        let (audio, video) = {
            let mut local = self.local.write().await;
            let audio = local.audio_track.take();
            let video = local.video_track.take();
            local.is_mic_muted = false;
            local.is_camera_off = false;
            (audio, video)
        };
        if let Some(track) = audio {
            track.stop();
            track.close().await;
        }
        if let Some(track) = video {
            track.stop();
            track.close().await;
        }
    }

    /// Stop subscribed remote tracks and drop all roster rows
    fn clear_roster(&self) {
        let uids: Vec<ParticipantId> = self.roster.iter().map(|e| e.info.uid).collect();
        for uid in uids {
            if let Some((_, entry)) = self.roster.remove(&uid) {
                if let Some(track) = entry.audio_track {
                    track.stop();
                }
                if let Some(track) = entry.video_track {
                    track.stop();
                }
            }
        }
    }

    async fn emit_state(
        &self,
        previous: SessionState,
        current: SessionState,
        error: Option<String>,
    ) {
        let info = SessionStateInfo {
            session_id: self.session_id,
            previous,
            current,
            error,
            timestamp: Utc::now(),
        };
        debug!(session_id = %self.session_id, %previous, %current, "session state changed");
        self.emit(SessionEvent::StateChanged { info }).await;
    }

    pub(crate) async fn emit_countdown(&self, remaining_seconds: i64) {
        self.emit(SessionEvent::CountdownTick { remaining_seconds })
            .await;
    }

    /// Whether transport events should still be applied to the roster
    ///
    /// `leave` flips the state to idle before clearing the roster, so any
    /// event delivered during or after teardown is dropped here instead of
    /// repopulating a cleared roster.
    async fn accepts_transport_events(&self) -> bool {
        *self.state.read().await != SessionState::Idle
    }

    async fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event.clone());
        let handler = self.event_handler.read().await.clone();
        if let Some(handler) = handler {
            match event {
                SessionEvent::StateChanged { info } => {
                    handler.on_session_state_changed(info).await;
                }
                SessionEvent::RosterChanged { update } => {
                    handler.on_roster_changed(update).await;
                }
                SessionEvent::CountdownTick { remaining_seconds } => {
                    handler.on_countdown_tick(remaining_seconds).await;
                }
            }
        }
    }
}

/// Event reducers fed by the transport adapter
///
/// Each reducer takes its roster lock only for the duration of the update
/// and never across an await on application code; the event snapshot is
/// emitted afterwards.
#[async_trait::async_trait]
impl TransportEventSink for CallSessionManager {
    /// A participant entered the channel
    ///
    /// Creates a placeholder roster row with both media flags false so a
    /// participant joining fully muted is still visible.
    async fn on_participant_joined(&self, uid: ParticipantId) {
        if !self.accepts_transport_events().await {
            debug!(%uid, "participant-joined ignored: session idle");
            return;
        }
        debug!(%uid, "participant joined");
        self.roster
            .entry(uid)
            .or_insert_with(|| RemoteParticipantEntry::new(uid));
        self.emit(SessionEvent::RosterChanged {
            update: RosterUpdate::ParticipantJoined { uid },
        })
        .await;
    }

    /// A participant published media of one kind
    ///
    /// Subscribes first; on failure the roster stays untouched for that kind
    /// (the next publish event retries) and other participants are
    /// unaffected. On success the row is upserted with only that kind's
    /// flag raised.
    async fn on_media_published(&self, uid: ParticipantId, kind: MediaKind) {
        if !self.accepts_transport_events().await {
            debug!(%uid, %kind, "media-published ignored: session idle");
            return;
        }
        let track = match self.adapter.subscribe(uid, kind).await {
            Ok(track) => track,
            Err(e) => {
                warn!(%uid, %kind, "subscribe failed, roster unchanged: {e}");
                return;
            }
        };

        let snapshot = {
            let mut entry = self
                .roster
                .entry(uid)
                .or_insert_with(|| RemoteParticipantEntry::new(uid));
            match kind {
                MediaKind::Audio => {
                    entry.info.has_audio = true;
                    if let Some(old) = entry.audio_track.replace(track) {
                        old.stop();
                    }
                }
                MediaKind::Video => {
                    entry.info.has_video = true;
                    if let Some(old) = entry.video_track.replace(track) {
                        old.stop();
                    }
                }
            }
            entry.info.clone()
        };

        debug!(%uid, %kind, "remote media published");
        self.emit(SessionEvent::RosterChanged {
            update: RosterUpdate::MediaChanged {
                participant: snapshot,
            },
        })
        .await;
        self.refresh_render_targets().await;
    }

    /// A participant unpublished media of one kind
    ///
    /// Lowers only that kind's flag; a no-op when the row is absent.
    async fn on_media_unpublished(&self, uid: ParticipantId, kind: MediaKind) {
        if !self.accepts_transport_events().await {
            debug!(%uid, %kind, "media-unpublished ignored: session idle");
            return;
        }
        let snapshot = {
            let Some(mut entry) = self.roster.get_mut(&uid) else {
                debug!(%uid, %kind, "unpublish for unknown participant ignored");
                return;
            };
            match kind {
                MediaKind::Audio => {
                    entry.info.has_audio = false;
                    if let Some(track) = entry.audio_track.take() {
                        track.stop();
                    }
                }
                MediaKind::Video => {
                    entry.info.has_video = false;
                    if let Some(track) = entry.video_track.take() {
                        track.stop();
                    }
                }
            }
            entry.info.clone()
        };

        debug!(%uid, %kind, "remote media unpublished");
        self.emit(SessionEvent::RosterChanged {
            update: RosterUpdate::MediaChanged {
                participant: snapshot,
            },
        })
        .await;
        self.refresh_render_targets().await;
    }

    /// A participant left; its row and subscribed tracks are dropped
    async fn on_participant_left(&self, uid: ParticipantId) {
        if !self.accepts_transport_events().await {
            debug!(%uid, "participant-left ignored: session idle");
            return;
        }
        let Some((_, entry)) = self.roster.remove(&uid) else {
            debug!(%uid, "leave for unknown participant ignored");
            return;
        };
        if let Some(track) = entry.audio_track {
            track.stop();
        }
        if let Some(track) = entry.video_track {
            track.stop();
        }
        debug!(%uid, "participant left");
        self.emit(SessionEvent::RosterChanged {
            update: RosterUpdate::ParticipantLeft { uid },
        })
        .await;
        self.refresh_render_targets().await;
    }
}

impl std::fmt::Debug for CallSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSessionManager")
            .field("session_id", &self.session_id)
            .field("channel", &self.config.credentials.channel)
            .field("remote_participants", &self.roster.len())
            .finish()
    }
}
