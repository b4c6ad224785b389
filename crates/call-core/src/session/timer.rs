//! Appointment countdown
//!
//! Appointment-backed calls are bounded by a wall-clock deadline. The
//! countdown runs as a cancellable spawned task ticking once per second;
//! when the deadline is reached the session auto-leaves regardless of any
//! in-flight network state. The task holds only a weak manager handle so a
//! dropped session never keeps ticking.

use std::sync::{Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::session::config::AppointmentWindow;
use crate::session::manager::CallSessionManager;

/// Cancellable one-second countdown tied to the session lifecycle
pub(crate) struct CountdownTimer {
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            shutdown: Mutex::new(None),
        }
    }

    /// Start (or restart) the countdown for an appointment window
    pub fn start(&self, manager: Weak<CallSessionManager>, window: AppointmentWindow) {
        self.stop();

        let (tx, mut rx) = watch::channel(false);
        if let Ok(mut guard) = self.shutdown.lock() {
            *guard = Some(tx);
        }

        let remaining = window.remaining_seconds(Utc::now());
        debug!(remaining_seconds = remaining, "appointment countdown started");
        let deadline = Instant::now() + Duration::from_secs(remaining.max(0) as u64);

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            tick.tick().await;

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let Some(manager) = manager.upgrade() else { break };
                        let left = deadline
                            .saturating_duration_since(Instant::now())
                            .as_secs() as i64;
                        manager.emit_countdown(left).await;
                        if left <= 0 {
                            info!("appointment deadline reached, auto-leaving call");
                            if let Err(e) = manager.leave().await {
                                warn!("auto-leave at appointment deadline failed: {e}");
                            }
                            break;
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });
    }

    /// Cancel the countdown; no-op when none is running
    pub fn stop(&self) {
        let sender = match self.shutdown.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(tx) = sender {
            let _ = tx.send(true);
            debug!("appointment countdown stopped");
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
