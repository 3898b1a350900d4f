//! Client configuration

use radar_auth::CredentialScheme;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Incident Radar API
    pub api_base_url: String,
    /// Path to the local database file
    pub database_path: PathBuf,
    /// How session credentials travel with requests
    pub credentials: CredentialScheme,
    /// Interval between silent session refreshes
    pub refresh_interval: Duration,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let api_base_url = std::env::var("INCIDENT_RADAR_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self {
            api_base_url,
            database_path: data_dir.join("radar.db"),
            credentials: CredentialScheme::Bearer,
            refresh_interval: radar_auth::DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("IncidentRadar"))
            .unwrap_or_else(|| PathBuf::from(".incident-radar"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
