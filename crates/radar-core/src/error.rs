//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] radar_storage::StorageError),

    #[error("Auth error: {0}")]
    Auth(#[from] radar_auth::AuthError),

    #[error("Configuration error: {0}")]
    Config(String),
}
