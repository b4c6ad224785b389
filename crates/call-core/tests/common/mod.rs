//! Shared mock transport, tracks, and render registry for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use telerehab_call_core::session::types::{MediaKind, ParticipantId};
use telerehab_call_core::transport::sdk::{
    AudioCaptureSettings, CameraInfo, ConnectionState, LocalAudioTrack, LocalTrack,
    LocalVideoTrack, MediaTransport, RemoteTrack, RenderTarget, RenderTargetRegistry,
    TransportEventSink, TransportFailure, VideoCaptureSettings,
};
use telerehab_call_core::{CallCredentials, CallSessionConfig, CallSessionManager};

static TRACK_SEQ: AtomicUsize = AtomicUsize::new(0);

fn next_track_id(prefix: &str) -> String {
    format!("{prefix}-{}", TRACK_SEQ.fetch_add(1, Ordering::SeqCst))
}

/// One recorded transport join attempt
#[derive(Debug, Clone)]
pub struct RecordedJoin {
    pub app_id: String,
    pub channel: String,
    pub token: String,
    pub uid_hint: Option<u64>,
}

/// Local track double counting every lifecycle primitive
pub struct MockLocalTrack {
    id: String,
    kind: MediaKind,
    pub enabled: Mutex<Option<bool>>,
    pub stop_count: AtomicUsize,
    pub close_count: AtomicUsize,
    pub played_targets: Mutex<Vec<String>>,
    pub device: Mutex<Option<String>>,
    pub fail_set_enabled: AtomicBool,
    pub fail_set_device: AtomicBool,
}

impl MockLocalTrack {
    fn new(kind: MediaKind, device: Option<&str>) -> Self {
        let prefix = match kind {
            MediaKind::Audio => "mic",
            MediaKind::Video => "cam",
        };
        Self {
            id: next_track_id(prefix),
            kind,
            enabled: Mutex::new(None),
            stop_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
            played_targets: Mutex::new(Vec::new()),
            device: Mutex::new(device.map(String::from)),
            fail_set_enabled: AtomicBool::new(false),
            fail_set_device: AtomicBool::new(false),
        }
    }

    pub fn stops(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn played(&self) -> Vec<String> {
        self.played_targets.lock().unwrap().clone()
    }

    pub fn last_enabled(&self) -> Option<bool> {
        *self.enabled.lock().unwrap()
    }

    pub fn current_device_id(&self) -> Option<String> {
        self.device.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalTrack for MockLocalTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), TransportFailure> {
        if self.fail_set_enabled.load(Ordering::SeqCst) {
            return Err(TransportFailure::Other("set_enabled rejected".into()));
        }
        *self.enabled.lock().unwrap() = Some(enabled);
        Ok(())
    }

    fn play(&self, target: &dyn RenderTarget) -> Result<(), TransportFailure> {
        self.played_targets
            .lock()
            .unwrap()
            .push(target.id().to_string());
        Ok(())
    }

    fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }

    async fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl LocalAudioTrack for MockLocalTrack {}

#[async_trait]
impl LocalVideoTrack for MockLocalTrack {
    async fn set_device(&self, device_id: &str) -> Result<(), TransportFailure> {
        if self.fail_set_device.load(Ordering::SeqCst) {
            return Err(TransportFailure::Other("set_device rejected".into()));
        }
        *self.device.lock().unwrap() = Some(device_id.to_string());
        Ok(())
    }

    fn current_device(&self) -> Option<String> {
        self.device.lock().unwrap().clone()
    }
}

/// Remote track double recording play/stop
pub struct MockRemoteTrack {
    id: String,
    kind: MediaKind,
    pub uid: ParticipantId,
    pub stop_count: AtomicUsize,
    pub played_targets: Mutex<Vec<String>>,
}

impl MockRemoteTrack {
    fn new(uid: ParticipantId, kind: MediaKind) -> Self {
        Self {
            id: next_track_id("remote"),
            kind,
            uid,
            stop_count: AtomicUsize::new(0),
            played_targets: Mutex::new(Vec::new()),
        }
    }

    pub fn stops(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn played(&self) -> Vec<String> {
        self.played_targets.lock().unwrap().clone()
    }
}

impl RemoteTrack for MockRemoteTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn play(&self, target: &dyn RenderTarget) -> Result<(), TransportFailure> {
        self.played_targets
            .lock()
            .unwrap()
            .push(target.id().to_string());
        Ok(())
    }

    fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A mounted render target
pub struct MockRenderTarget {
    id: String,
}

impl RenderTarget for MockRenderTarget {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Registry whose targets tests mount and unmount on demand
pub struct MockRenderRegistry {
    targets: Mutex<HashMap<String, Arc<MockRenderTarget>>>,
}

impl MockRenderRegistry {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
        }
    }

    pub fn mount(&self, id: &str) {
        self.targets.lock().unwrap().insert(
            id.to_string(),
            Arc::new(MockRenderTarget { id: id.to_string() }),
        );
    }

    pub fn unmount(&self, id: &str) {
        self.targets.lock().unwrap().remove(id);
    }
}

impl RenderTargetRegistry for MockRenderRegistry {
    fn lookup(&self, id: &str) -> Option<Arc<dyn RenderTarget>> {
        self.targets
            .lock()
            .unwrap()
            .get(id)
            .map(|target| target.clone() as Arc<dyn RenderTarget>)
    }
}

/// Scriptable transport double
pub struct MockTransport {
    state: Mutex<ConnectionState>,
    sink: Mutex<Option<Arc<dyn TransportEventSink>>>,
    pub join_calls: Mutex<Vec<RecordedJoin>>,
    pub leave_count: AtomicUsize,
    pub publish_count: AtomicUsize,
    join_failures: Mutex<Vec<TransportFailure>>,
    pub fail_next_leave: AtomicBool,
    pub fail_publish: AtomicBool,
    pub fail_subscribe: AtomicBool,
    pub fail_create_tracks: AtomicBool,
    pub cameras: Mutex<Vec<CameraInfo>>,
    pub local_tracks: Mutex<Vec<(Arc<MockLocalTrack>, Arc<MockLocalTrack>)>>,
    pub remote_tracks: Mutex<Vec<Arc<MockRemoteTrack>>>,
    pub subscribe_calls: Mutex<Vec<(ParticipantId, MediaKind)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ConnectionState::Disconnected),
            sink: Mutex::new(None),
            join_calls: Mutex::new(Vec::new()),
            leave_count: AtomicUsize::new(0),
            publish_count: AtomicUsize::new(0),
            join_failures: Mutex::new(Vec::new()),
            fail_next_leave: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            fail_create_tracks: AtomicBool::new(false),
            cameras: Mutex::new(vec![CameraInfo {
                device_id: "cam-front".into(),
                label: "Front Camera".into(),
            }]),
            local_tracks: Mutex::new(Vec::new()),
            remote_tracks: Mutex::new(Vec::new()),
            subscribe_calls: Mutex::new(Vec::new()),
        })
    }

    /// Queue a failure consumed by the next join attempt
    pub fn queue_join_failure(&self, failure: TransportFailure) {
        self.join_failures.lock().unwrap().push(failure);
    }

    /// Force the reported connection state, e.g. a stale membership from a
    /// previous session
    pub fn set_connection_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn join_attempts(&self) -> usize {
        self.join_calls.lock().unwrap().len()
    }

    pub fn leaves(&self) -> usize {
        self.leave_count.load(Ordering::SeqCst)
    }

    pub fn publishes(&self) -> usize {
        self.publish_count.load(Ordering::SeqCst)
    }

    /// The most recently created local (audio, video) track pair
    pub fn last_local_tracks(&self) -> (Arc<MockLocalTrack>, Arc<MockLocalTrack>) {
        let tracks = self.local_tracks.lock().unwrap();
        let (audio, video) = tracks.last().expect("no local tracks created");
        (audio.clone(), video.clone())
    }

    /// The most recently subscribed remote track
    pub fn last_remote_track(&self) -> Arc<MockRemoteTrack> {
        self.remote_tracks
            .lock()
            .unwrap()
            .last()
            .expect("no remote tracks subscribed")
            .clone()
    }

    fn sink_handle(&self) -> Option<Arc<dyn TransportEventSink>> {
        self.sink.lock().unwrap().clone()
    }

    pub async fn emit_participant_joined(&self, uid: u64) {
        if let Some(sink) = self.sink_handle() {
            sink.on_participant_joined(ParticipantId(uid)).await;
        }
    }

    pub async fn emit_media_published(&self, uid: u64, kind: MediaKind) {
        if let Some(sink) = self.sink_handle() {
            sink.on_media_published(ParticipantId(uid), kind).await;
        }
    }

    pub async fn emit_media_unpublished(&self, uid: u64, kind: MediaKind) {
        if let Some(sink) = self.sink_handle() {
            sink.on_media_unpublished(ParticipantId(uid), kind).await;
        }
    }

    pub async fn emit_participant_left(&self, uid: u64) {
        if let Some(sink) = self.sink_handle() {
            sink.on_participant_left(ParticipantId(uid)).await;
        }
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    fn set_event_sink(&self, sink: Arc<dyn TransportEventSink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn clear_event_sink(&self) {
        self.sink.lock().unwrap().take();
    }

    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: &str,
        uid_hint: Option<u64>,
    ) -> Result<ParticipantId, TransportFailure> {
        self.join_calls.lock().unwrap().push(RecordedJoin {
            app_id: app_id.to_string(),
            channel: channel.to_string(),
            token: token.to_string(),
            uid_hint,
        });
        let queued = {
            let mut failures = self.join_failures.lock().unwrap();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };
        if let Some(failure) = queued {
            return Err(failure);
        }
        *self.state.lock().unwrap() = ConnectionState::Connected;
        Ok(ParticipantId(uid_hint.unwrap_or(1000)))
    }

    async fn leave(&self) -> Result<(), TransportFailure> {
        self.leave_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_leave.swap(false, Ordering::SeqCst) {
            return Err(TransportFailure::Other("leave rejected".into()));
        }
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
        Ok(())
    }

    async fn publish(
        &self,
        _audio: Arc<dyn LocalAudioTrack>,
        _video: Arc<dyn LocalVideoTrack>,
    ) -> Result<(), TransportFailure> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportFailure::Other("publish rejected".into()));
        }
        self.publish_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(
        &self,
        uid: ParticipantId,
        kind: MediaKind,
    ) -> Result<Arc<dyn RemoteTrack>, TransportFailure> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportFailure::Other("subscribe rejected".into()));
        }
        self.subscribe_calls.lock().unwrap().push((uid, kind));
        let track = Arc::new(MockRemoteTrack::new(uid, kind));
        self.remote_tracks.lock().unwrap().push(track.clone());
        Ok(track)
    }

    async fn create_microphone_and_camera_tracks(
        &self,
        _audio: &AudioCaptureSettings,
        _video: &VideoCaptureSettings,
    ) -> Result<(Arc<dyn LocalAudioTrack>, Arc<dyn LocalVideoTrack>), TransportFailure> {
        if self.fail_create_tracks.load(Ordering::SeqCst) {
            return Err(TransportFailure::Other("no capture devices".into()));
        }
        let audio = Arc::new(MockLocalTrack::new(MediaKind::Audio, None));
        let video = Arc::new(MockLocalTrack::new(MediaKind::Video, Some("cam-front")));
        self.local_tracks
            .lock()
            .unwrap()
            .push((audio.clone(), video.clone()));
        Ok((audio, video))
    }

    async fn list_cameras(&self) -> Result<Vec<CameraInfo>, TransportFailure> {
        Ok(self.cameras.lock().unwrap().clone())
    }
}

/// Credentials matching the values most tests assert against
pub fn test_credentials() -> CallCredentials {
    CallCredentials::new("A1", "room-5", "T1")
}

/// Initialize test logging once per process; `RUST_LOG` filters as usual
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A session over a fresh mock transport and empty render registry
pub fn build_session() -> (
    Arc<CallSessionManager>,
    Arc<MockTransport>,
    Arc<MockRenderRegistry>,
) {
    build_session_with(CallSessionConfig::new(test_credentials()))
}

/// Same as [`build_session`] with a caller-supplied config
pub fn build_session_with(
    config: CallSessionConfig,
) -> (
    Arc<CallSessionManager>,
    Arc<MockTransport>,
    Arc<MockRenderRegistry>,
) {
    init_test_tracing();
    let transport = MockTransport::new();
    let registry = Arc::new(MockRenderRegistry::new());
    let manager = CallSessionManager::new(config, transport.clone(), registry.clone());
    (manager, transport, registry)
}
