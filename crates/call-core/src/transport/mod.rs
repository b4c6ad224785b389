//! Transport boundary: external SDK capability traits and the adapter that
//! owns the client instance.

pub mod adapter;
pub mod sdk;

pub use adapter::TransportAdapter;
pub use sdk::{
    AudioCaptureSettings, CameraInfo, ConnectionState, LocalAudioTrack, LocalTrack,
    LocalVideoTrack, MediaTransport, RemoteTrack, RenderTarget, RenderTargetRegistry,
    TransportEventSink, TransportFailure, VideoCaptureSettings,
};
