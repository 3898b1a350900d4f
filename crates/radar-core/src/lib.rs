//! Incident Radar Client Core
//!
//! Central coordination layer for the Incident Radar client: owns the
//! configuration and wires local storage, the authenticated transport and
//! the session manager into one context object.

mod client;
mod config;
mod error;

pub use client::RadarClient;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use radar_auth::{
    ApiTransport, AuthError, AuthEvent, CredentialScheme, SessionEvent, SessionManager,
    SessionPhase, SessionSnapshot, User,
};
pub use radar_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
