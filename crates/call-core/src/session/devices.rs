//! Device control surface
//!
//! Mute/unmute, camera on/off, and camera switching for the local tracks.
//! Every operation is a no-op when the corresponding track has not been
//! acquired. Toggle flags update optimistically and roll back if the track
//! primitive fails, uniformly for microphone and camera; a failure here
//! leaves the session joined and only records the device error.

use tracing::{debug, info, warn};

use crate::error::{CallError, CallResult};
use crate::session::manager::CallSessionManager;

impl CallSessionManager {
    /// Flip the microphone mute flag and propagate it to the audio track
    ///
    /// Returns the new muted state. No-op (returning the current state)
    /// when no audio track is held.
    pub async fn toggle_microphone(&self) -> CallResult<bool> {
        let track = { self.local_media().read().await.audio_track.clone() };
        let Some(track) = track else {
            debug!("microphone toggle ignored: no local audio track");
            return Ok(self.local_media().read().await.is_mic_muted);
        };

        let muted = {
            let mut local = self.local_media().write().await;
            local.is_mic_muted = !local.is_mic_muted;
            local.is_mic_muted
        };

        if let Err(e) = track.set_enabled(!muted).await {
            {
                let mut local = self.local_media().write().await;
                local.is_mic_muted = !muted;
            }
            let err = CallError::device(format!("microphone toggle failed: {e}"));
            self.record_error(&err).await;
            return Err(err);
        }
        debug!(muted, "microphone toggled");
        Ok(muted)
    }

    /// Flip the camera-off flag and propagate it to the video track
    ///
    /// Returns the new camera-off state. No-op (returning the current
    /// state) when no video track is held.
    pub async fn toggle_camera(&self) -> CallResult<bool> {
        let track = { self.local_media().read().await.video_track.clone() };
        let Some(track) = track else {
            debug!("camera toggle ignored: no local video track");
            return Ok(self.local_media().read().await.is_camera_off);
        };

        let camera_off = {
            let mut local = self.local_media().write().await;
            local.is_camera_off = !local.is_camera_off;
            local.is_camera_off
        };

        if let Err(e) = track.set_enabled(!camera_off).await {
            {
                let mut local = self.local_media().write().await;
                local.is_camera_off = !camera_off;
            }
            let err = CallError::device(format!("camera toggle failed: {e}"));
            self.record_error(&err).await;
            return Err(err);
        }
        debug!(camera_off, "camera toggled");
        Ok(camera_off)
    }

    /// Switch the live camera track to a different capture device
    ///
    /// The track stays published; only its underlying hardware source
    /// changes. No-op with a warning when fewer than two cameras are
    /// available, and a no-op when no video track is held.
    pub async fn switch_camera(&self) -> CallResult<()> {
        let track = { self.local_media().read().await.video_track.clone() };
        let Some(track) = track else {
            debug!("camera switch ignored: no local video track");
            return Ok(());
        };

        let cameras = self.adapter().list_cameras().await?;
        if cameras.len() < 2 {
            warn!(
                available = cameras.len(),
                "camera switch ignored: need at least two devices"
            );
            return Ok(());
        }

        let current = track.current_device();
        let Some(next) = cameras
            .iter()
            .find(|cam| current.as_deref() != Some(cam.device_id.as_str()))
        else {
            warn!("camera switch ignored: no alternative device found");
            return Ok(());
        };

        if let Err(e) = track.set_device(&next.device_id).await {
            let err = CallError::device(format!("camera switch failed: {e}"));
            self.record_error(&err).await;
            return Err(err);
        }
        info!(device = %next.device_id, label = %next.label, "camera switched");
        Ok(())
    }
}
