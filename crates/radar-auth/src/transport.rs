//! Authenticated API transport
//!
//! Wraps the HTTP client so authenticated calls transparently recover from
//! credential expiry: a 401 on a protected endpoint triggers one refresh
//! and one retry. Concurrent 401s join a single in-flight refresh, and a
//! refresh that cannot renew the session is announced through one
//! broadcast channel. Calls to the auth endpoints themselves never enter
//! the recovery path, so a 401 from refresh or login cannot recurse.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use url::Url;

use crate::error::AuthError;
use crate::events::AuthEvent;
use crate::types::{ApiErrorBody, AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::Result;

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const REFRESH_PATH: &str = "/api/auth/refresh-token";
const LOGOUT_PATH: &str = "/api/auth/logout";

/// How session credentials travel with requests. Chosen at construction;
/// both deployments of the backend are covered by one transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    /// Session proof carried entirely by `HttpOnly` cookies.
    Cookie,
    /// Short-lived bearer token held in process memory, with the refresh
    /// token in a cookie. The token is never written to durable storage.
    Bearer,
}

type SharedRefresh = Shared<BoxFuture<'static, std::result::Result<AuthResponse, Arc<AuthError>>>>;

pub struct ApiTransport {
    http: reqwest::Client,
    base_url: Url,
    scheme: CredentialScheme,
    device_id: String,
    /// In-memory access token (bearer scheme only)
    access_token: Arc<RwLock<Option<String>>>,
    /// Single in-flight refresh shared by all callers
    refresh_in_flight: Arc<Mutex<Option<SharedRefresh>>>,
    /// Session generation; refreshes from a previous generation are discarded
    epoch: Arc<AtomicU64>,
    events: broadcast::Sender<AuthEvent>,
}

impl ApiTransport {
    pub fn new(base_url: &str, scheme: CredentialScheme, device_id: String) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            base_url,
            scheme,
            device_id,
            access_token: Arc::new(RwLock::new(None)),
            refresh_in_flight: Arc::new(Mutex::new(None)),
            epoch: Arc::new(AtomicU64::new(0)),
            events,
        })
    }

    pub fn scheme(&self) -> CredentialScheme {
        self.scheme
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token;
    }

    /// Subscribe to transport events (session expiry).
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn session_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Starts a new session generation. A refresh still in flight for the
    /// previous generation will be discarded when it completes.
    pub fn bump_session_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    // === Auth endpoints (never intercepted) ===

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = LoginRequest {
            email,
            password,
            device_id: &self.device_id,
        };
        let response = self
            .send_once(Method::POST, self.endpoint(LOGIN_PATH)?, Some(&request))
            .await?;
        Self::into_json(response).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let request = RegisterRequest {
            name,
            email,
            password,
            device_id: &self.device_id,
        };
        let response = self
            .send_once(Method::POST, self.endpoint(REGISTER_PATH)?, Some(&request))
            .await?;
        Self::into_json(response).await
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .send_once(
                Method::POST,
                self.endpoint(LOGOUT_PATH)?,
                Some(&serde_json::json!({})),
            )
            .await?;
        Self::expect_success(response).await
    }

    /// Exchanges the refresh cookie for renewed credentials.
    ///
    /// All call sites share one in-flight refresh: the first caller issues
    /// the request, later callers await the same pending outcome, and the
    /// slot is released once it settles. On failure a session-expired
    /// event is sent exactly once, if `announce_failure` was set by the
    /// caller that initiated the refresh. Hydration passes `false` so a
    /// cold start without a valid cookie stays silent.
    pub async fn refresh_session(&self, announce_failure: bool) -> Result<AuthResponse> {
        let shared = {
            let mut slot = self.refresh_in_flight.lock();
            if let Some(pending) = slot.as_ref() {
                pending.clone()
            } else {
                let transport = self.clone();
                let pending: SharedRefresh = async move {
                    let result = transport.perform_refresh().await;
                    *transport.refresh_in_flight.lock() = None;
                    match result {
                        Ok(auth) => Ok(auth),
                        Err(err) => {
                            let superseded = matches!(err, AuthError::SessionSuperseded);
                            if announce_failure && !superseded {
                                let _ = transport.events.send(AuthEvent::SessionExpired);
                            }
                            Err(Arc::new(err))
                        }
                    }
                }
                .boxed()
                .shared();
                *slot = Some(pending.clone());
                pending
            }
        };

        shared.await.map_err(AuthError::RefreshFailed)
    }

    async fn perform_refresh(&self) -> Result<AuthResponse> {
        let epoch = self.session_epoch();
        let request = RefreshRequest {
            device_id: &self.device_id,
        };
        let response = self
            .send_once(Method::POST, self.endpoint(REFRESH_PATH)?, Some(&request))
            .await?;
        let auth: AuthResponse = Self::into_json(response).await?;

        if self.session_epoch() != epoch {
            // A login or logout happened while the call was in flight; the
            // result belongs to a session that no longer exists.
            return Err(AuthError::SessionSuperseded);
        }

        if self.scheme == CredentialScheme::Bearer {
            if let Some(token) = &auth.access_token {
                self.set_access_token(Some(token.clone()));
            }
        }

        tracing::debug!("Session refreshed");

        Ok(auth)
    }

    // === Protected endpoints (401 triggers refresh-and-retry) ===

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json::<(), T>(Method::GET, path, None).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(Method::POST, path, Some(body)).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .send_with_refresh::<()>(Method::DELETE, path, None)
            .await?;
        Self::expect_success(response).await
    }

    async fn request_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_with_refresh(method, path, body).await?;
        Self::into_json(response).await
    }

    async fn send_with_refresh<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let response = self.send_once(method.clone(), url.clone(), body).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Keep the original failure; it is what the caller sees if
        // recovery does not pan out.
        let original = Self::api_error(response).await;

        match self.refresh_session(true).await {
            // Exactly one retry; a second 401 surfaces to the caller as-is.
            Ok(_) => self.send_once(method, url, body).await,
            Err(err) => {
                tracing::debug!(error = %err, path = %path, "Refresh after 401 failed");
                Err(original)
            }
        }
    }

    async fn send_once<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.request(method, url);

        if self.scheme == CredentialScheme::Bearer {
            if let Some(token) = self.access_token() {
                request = request.bearer_auth(token);
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn into_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        AuthError::Api {
            status,
            message: body.server_message().map(str::to_string),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl Clone for ApiTransport {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            scheme: self.scheme,
            device_id: self.device_id.clone(),
            access_token: Arc::clone(&self.access_token),
            refresh_in_flight: Arc::clone(&self.refresh_in_flight),
            epoch: Arc::clone(&self.epoch),
            events: self.events.clone(),
        }
    }
}
