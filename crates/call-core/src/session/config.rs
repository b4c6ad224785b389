//! Session configuration structures
//!
//! Configuration for one consultation call: backend-issued channel
//! credentials, local capture settings, and the optional appointment window
//! that bounds the call's duration.
//!
//! # Usage
//!
//! ```rust
//! use telerehab_call_core::{CallCredentials, CallSessionConfig};
//!
//! let config = CallSessionConfig::new(CallCredentials::new("A1", "room-5", "T1"))
//!     .with_uid_hint(7);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.credentials.channel, "room-5");
//! ```
//!
//! Credentials always originate from the backend; a missing application id
//! or token fails validation before any transport call is attempted:
//!
//! ```rust
//! use telerehab_call_core::{CallCredentials, CallSessionConfig, CallError};
//!
//! let config = CallSessionConfig::new(CallCredentials::new("A1", "room-5", ""));
//! assert!(matches!(
//!     config.validate(),
//!     Err(CallError::Configuration { .. })
//! ));
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CallError, CallResult};
use crate::transport::sdk::{AudioCaptureSettings, VideoCaptureSettings};

/// Backend-issued credentials for joining a channel
///
/// The core never fabricates any of these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCredentials {
    /// Application identifier of the transport project
    pub app_id: String,
    /// Channel (room) name to join
    pub channel: String,
    /// Short-lived auth token for this channel
    pub token: String,
    /// Optional numeric identity hint; the transport assigns the final uid
    pub uid_hint: Option<u64>,
}

impl CallCredentials {
    pub fn new(
        app_id: impl Into<String>,
        channel: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            channel: channel.into(),
            token: token.into(),
            uid_hint: None,
        }
    }
}

/// Local capture settings for the microphone and camera tracks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Microphone capture settings
    pub audio: AudioCaptureSettings,
    /// Camera capture settings
    pub video: VideoCaptureSettings,
}

/// Wall-clock bounds of an appointment-backed call
///
/// The effective deadline is the earlier of the supplied end time and
/// `start + duration`; when it is reached the session auto-leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWindow {
    /// Scheduled end of the appointment
    pub end_time: DateTime<Utc>,
    /// Maximum call duration in minutes
    pub duration_minutes: i64,
}

impl AppointmentWindow {
    pub fn new(end_time: DateTime<Utc>, duration_minutes: i64) -> Self {
        Self {
            end_time,
            duration_minutes,
        }
    }

    /// Effective deadline as seen from `now`
    pub fn deadline_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let by_duration = now + Duration::minutes(self.duration_minutes.max(0));
        self.end_time.min(by_duration)
    }

    /// Seconds remaining until the deadline, clamped at zero
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline_from(now) - now).num_seconds().max(0)
    }
}

/// Full configuration for one call session instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSessionConfig {
    /// Backend-issued join credentials
    pub credentials: CallCredentials,
    /// Local capture settings
    pub media: MediaSettings,
    /// Optional appointment window enforcing a call deadline
    pub appointment: Option<AppointmentWindow>,
}

impl CallSessionConfig {
    /// Create a configuration with default capture settings and no
    /// appointment bound
    pub fn new(credentials: CallCredentials) -> Self {
        Self {
            credentials,
            media: MediaSettings::default(),
            appointment: None,
        }
    }

    /// Replace the capture settings
    pub fn with_media(mut self, media: MediaSettings) -> Self {
        self.media = media;
        self
    }

    /// Set the numeric identity hint
    pub fn with_uid_hint(mut self, uid_hint: u64) -> Self {
        self.credentials.uid_hint = Some(uid_hint);
        self
    }

    /// Bound the call by an appointment window
    pub fn with_appointment(mut self, appointment: AppointmentWindow) -> Self {
        self.appointment = Some(appointment);
        self
    }

    /// Check that all required credentials are present
    pub fn validate(&self) -> CallResult<()> {
        if self.credentials.app_id.is_empty() {
            return Err(CallError::config("app_id"));
        }
        if self.credentials.token.is_empty() {
            return Err(CallError::config("token"));
        }
        if self.credentials.channel.is_empty() {
            return Err(CallError::config("channel"));
        }
        Ok(())
    }
}
