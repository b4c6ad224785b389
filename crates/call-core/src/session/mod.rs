//! Session coordination: state machine, configuration, device control,
//! render reconciliation, and the appointment countdown.

pub mod config;
pub mod devices;
pub mod manager;
pub(crate) mod renderer;
pub(crate) mod timer;
pub mod types;


pub use config::{AppointmentWindow, CallCredentials, CallSessionConfig, MediaSettings};
pub use manager::CallSessionManager;
pub use types::{
    LocalMediaState, MediaKind, ParticipantId, RemoteParticipant, SessionState, SessionStats,
};
