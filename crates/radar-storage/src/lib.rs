//! Incident Radar Storage Layer
//!
//! SQLite-based persistence for client-local state. The client keeps only
//! non-credential data here (device identity, local preferences); session
//! tokens never touch durable storage.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
