//! Media rendering reconciler
//!
//! Binds live video tracks to their render targets. DOM mount and
//! track-ready events are not ordered relative to each other, so the
//! reconciler is re-entrant: every pass recomputes the desired bindings and
//! attaches whatever became possible since the last pass. A missing target
//! or a failed play is not an error, it is retried on the next pass.
//!
//! Stopping discarded tracks is the owner's job (the roster reducers and
//! `leave`), so the underlying hardware release happens exactly once per
//! track; the reconciler only keeps attachment bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::transport::sdk::{LocalVideoTrack, RemoteTrack, RenderTargetRegistry};

/// A video track that can be bound to a render target
#[derive(Clone)]
pub(crate) enum BoundTrack {
    LocalVideo(Arc<dyn LocalVideoTrack>),
    Remote(Arc<dyn RemoteTrack>),
}

impl BoundTrack {
    fn track_id(&self) -> &str {
        match self {
            BoundTrack::LocalVideo(track) => track.id(),
            BoundTrack::Remote(track) => track.id(),
        }
    }

    fn play(
        &self,
        target: &dyn crate::transport::sdk::RenderTarget,
    ) -> Result<(), crate::transport::sdk::TransportFailure> {
        match self {
            BoundTrack::LocalVideo(track) => track.play(target),
            BoundTrack::Remote(track) => track.play(target),
        }
    }
}

/// Reconciles (track, target) pairs against the mounted targets
pub(crate) struct RenderReconciler {
    registry: Arc<dyn RenderTargetRegistry>,
    // target id -> attached track id
    bindings: Mutex<HashMap<String, String>>,
}

impl RenderReconciler {
    pub fn new(registry: Arc<dyn RenderTargetRegistry>) -> Self {
        Self {
            registry,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// One reconciliation pass over the desired bindings
    ///
    /// Attaches tracks whose targets are mounted, skips (and will retry)
    /// those that are not, and drops bookkeeping for bindings no longer
    /// desired.
    pub async fn reconcile(&self, desired: Vec<(String, BoundTrack)>) {
        let mut bindings = self.bindings.lock().await;

        bindings.retain(|target_id, _| {
            desired.iter().any(|(desired_id, _)| desired_id == target_id)
        });

        for (target_id, track) in desired {
            if bindings.get(&target_id).map(String::as_str) == Some(track.track_id()) {
                continue;
            }
            let Some(target) = self.registry.lookup(&target_id) else {
                debug!(%target_id, "render target not mounted yet, will retry");
                continue;
            };
            match track.play(target.as_ref()) {
                Ok(()) => {
                    debug!(%target_id, track_id = %track.track_id(), "track attached");
                    bindings.insert(target_id, track.track_id().to_string());
                }
                Err(e) => {
                    warn!(%target_id, "track attach failed, will retry: {e}");
                }
            }
        }
    }

    /// Forget all bindings; the track owners stop the tracks themselves
    pub async fn clear(&self) {
        self.bindings.lock().await.clear();
    }
}
