//! Client context object
//!
//! One `RadarClient` exists per process. It owns the storage, transport
//! and session manager, is passed by reference to consumers, and has an
//! explicit construction / initialize / shutdown lifecycle.

use radar_auth::{ApiTransport, SessionManager};
use radar_storage::Database;
use std::sync::Arc;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct RadarClient {
    /// Configuration
    config: Config,
    /// Local database (device identity, client-local settings)
    db: Database,
    /// Authenticated API transport
    transport: Arc<ApiTransport>,
    /// Session state holder
    session: SessionManager,
}

impl RadarClient {
    /// Builds the client: opens local storage, resolves the device
    /// identity and wires the session layer together.
    pub fn new(config: Config) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&config.database_path)?;
        let device_id = radar_auth::get_or_create_device_id(&db)?;
        let transport = Arc::new(ApiTransport::new(
            &config.api_base_url,
            config.credentials,
            device_id,
        )?);
        let session = SessionManager::new(Arc::clone(&transport), config.refresh_interval);

        Ok(Self {
            config,
            db,
            transport,
            session,
        })
    }

    /// Hydrates the session (persistent login) and readies the client.
    pub async fn initialize(&self) {
        self.session.hydrate().await;

        tracing::info!("Client initialized");
    }

    /// Stops background session tasks.
    pub fn shutdown(&self) {
        self.session.shutdown();

        tracing::info!("Client shut down");
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Transport for protected API calls (incidents, activity, …).
    pub fn transport(&self) -> &Arc<ApiTransport> {
        &self.transport
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for RadarClient {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
        }
    }
}

// Implement std::io::Error conversion for fs operations
impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_auth::{CredentialScheme, SessionPhase};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_base_url: String) -> Config {
        Config {
            api_base_url,
            database_path: PathBuf::from(":memory:"),
            credentials: CredentialScheme::Bearer,
            refresh_interval: Duration::from_secs(3000),
        }
    }

    #[tokio::test]
    async fn test_client_initialization_hydrates_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": "u1", "email": "ada@example.com", "name": "Ada"},
                "accessToken": "tok-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RadarClient::new(test_config(server.uri())).unwrap();
        assert_eq!(client.session().snapshot().phase(), SessionPhase::Hydrating);

        client.initialize().await;

        assert!(client.session().is_authenticated());
        client.shutdown();
    }

    #[tokio::test]
    async fn test_device_identity_is_stable_for_a_client() {
        let server = MockServer::start().await;
        let client = RadarClient::new(test_config(server.uri())).unwrap();

        let first = radar_auth::get_or_create_device_id(client.database()).unwrap();
        let second = radar_auth::get_or_create_device_id(client.database()).unwrap();

        assert_eq!(first, second);
        assert_eq!(client.transport().device_id(), first);
    }
}
