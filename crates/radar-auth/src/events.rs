//! Session event types
//!
//! Expiry is funneled through one broadcast channel so every consumer
//! learns of it the same way, whether the failing refresh was scheduled
//! or triggered by a 401.

/// Transport-level event, published by [`crate::ApiTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A refresh attempt failed; the session can no longer be renewed.
    SessionExpired,
}

/// Consumer-facing event, published by [`crate::SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session state changed; read the current snapshot.
    Changed,
    /// The session expired and was cleared.
    Expired,
}
