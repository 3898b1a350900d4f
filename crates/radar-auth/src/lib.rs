//! Incident Radar Session Management
//!
//! Maintains the authenticated-user session for the client:
//! - Session state holder with login/register/logout and error reporting
//! - Authenticated transport that recovers from token expiry by
//!   refreshing and retrying, deduplicating concurrent refreshes
//! - Durable per-device identity sent with every auth-sensitive request
//!
//! Access tokens live only in process memory; cookies are handled by the
//! HTTP client's cookie store.

mod device;
mod error;
mod events;
mod session;
mod transport;
mod types;

pub use device::get_or_create_device_id;
pub use error::AuthError;
pub use events::{AuthEvent, SessionEvent};
pub use session::{SessionManager, SessionPhase, SessionSnapshot, DEFAULT_REFRESH_INTERVAL};
pub use transport::{ApiTransport, CredentialScheme};
pub use types::{AuthResponse, User};

pub type Result<T> = std::result::Result<T, AuthError>;
