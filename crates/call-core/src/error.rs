//! Error types for the call-core library

use thiserror::Error;

use crate::session::types::{MediaKind, ParticipantId};

/// Result type for call session operations
pub type CallResult<T> = Result<T, CallError>;

/// Errors that can occur while coordinating a call session
///
/// Every failure from the transport or the local device layer is translated
/// into one of these variants at the adapter boundary; raw SDK errors never
/// reach the application layer.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// Required backend-issued credential is missing
    #[error("Configuration error: missing {field}")]
    Configuration { field: String },

    /// Transport join failed for a reason other than an identity conflict
    #[error("Transport join failed: {reason}")]
    TransportJoin { reason: String },

    /// The same identity is still considered present in the channel,
    /// usually the tail end of a previous session's teardown race
    #[error("Identity conflict joining channel {channel}")]
    IdentityConflict { channel: String },

    /// Subscribing to one participant's media of one kind failed
    #[error("Subscribe failed for participant {uid} ({kind}): {reason}")]
    Subscribe {
        uid: ParticipantId,
        kind: MediaKind,
        reason: String,
    },

    /// Publishing the local track pair failed
    #[error("Publish failed: {reason}")]
    Publish { reason: String },

    /// Acquiring, toggling, or switching local hardware failed
    #[error("Device error: {reason}")]
    Device { reason: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CallError {
    /// Create a configuration error for a missing credential field
    pub fn config(field: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
        }
    }

    /// Create a transport join error
    pub fn transport_join(reason: impl Into<String>) -> Self {
        Self::TransportJoin {
            reason: reason.into(),
        }
    }

    /// Create a subscribe error scoped to one participant and media kind
    pub fn subscribe(uid: ParticipantId, kind: MediaKind, reason: impl Into<String>) -> Self {
        Self::Subscribe {
            uid,
            kind,
            reason: reason.into(),
        }
    }

    /// Create a publish error
    pub fn publish(reason: impl Into<String>) -> Self {
        Self::Publish {
            reason: reason.into(),
        }
    }

    /// Create a device error
    pub fn device(reason: impl Into<String>) -> Self {
        Self::Device {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller is expected to recover without surfacing the
    /// error to the user
    ///
    /// Identity conflicts are retried once by the join sequence; subscribe
    /// failures are scoped to a single participant/kind and resolve on the
    /// next publish event.
    ///
    /// ```
    /// use telerehab_call_core::CallError;
    ///
    /// let err = CallError::IdentityConflict { channel: "room-5".into() };
    /// assert!(err.is_recoverable());
    ///
    /// let err = CallError::config("token");
    /// assert!(!err.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IdentityConflict { .. } | Self::Subscribe { .. }
        )
    }
}
