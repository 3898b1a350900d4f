//! Session state holder
//!
//! Owns the client's belief about the current authenticated identity and
//! the actions that change it. Hydrates once at startup from the refresh
//! cookie, silently refreshes on an interval while authenticated, and
//! reacts to the transport's session-expired broadcast by clearing state.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::events::{AuthEvent, SessionEvent};
use crate::transport::{ApiTransport, CredentialScheme};
use crate::types::{AuthResponse, User};
use crate::Result;

/// Matches the backend's one-hour token lifetime with headroom.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";
const LOGIN_FALLBACK_MESSAGE: &str = "Login failed";
const REGISTER_FALLBACK_MESSAGE: &str = "Registration failed";

/// Lifecycle of the session, derived from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Initial hydration attempt has not settled yet.
    Hydrating,
    Anonymous,
    Authenticated,
}

/// Point-in-time view of the session for UI consumers. The access token is
/// deliberately absent; it stays inside the transport.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Hydrating
        } else if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug)]
struct AuthState {
    user: Option<User>,
    is_loading: bool,
    last_error: Option<String>,
}

pub struct SessionManager {
    transport: Arc<ApiTransport>,
    state: Arc<RwLock<AuthState>>,
    events: broadcast::Sender<SessionEvent>,
    refresh_interval: Duration,
    /// Control handle for the scheduled-refresh task
    refresh_stop: Arc<Mutex<Option<watch::Sender<bool>>>>,
    /// Control handle for the expiry-listener task
    listener_stop: Arc<Mutex<Option<watch::Sender<bool>>>>,
    hydration_pending: Arc<AtomicBool>,
}

impl SessionManager {
    pub fn new(transport: Arc<ApiTransport>, refresh_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(16);

        Self {
            transport,
            state: Arc::new(RwLock::new(AuthState {
                user: None,
                is_loading: true,
                last_error: None,
            })),
            events,
            refresh_interval,
            refresh_stop: Arc::new(Mutex::new(None)),
            listener_stop: Arc::new(Mutex::new(None)),
            hydration_pending: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            user: state.user.clone(),
            is_loading: state.is_loading,
            last_error: state.last_error.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().user.is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.transport.access_token()
    }

    /// Subscribe to session events. Receivers only see events sent after
    /// they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Hydrates the session from the refresh cookie (persistent login).
    ///
    /// Invoked once at startup; later calls are no-ops. Failure is the
    /// normal cold-start path and is never surfaced to the user.
    pub async fn hydrate(&self) {
        if !self.hydration_pending.swap(false, Ordering::SeqCst) {
            return;
        }

        self.spawn_expiry_listener();

        let epoch = self.transport.session_epoch();
        match self.transport.refresh_session(false).await {
            Ok(auth) => {
                if self.transport.session_epoch() == epoch {
                    self.apply_session(&auth);
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "Session hydration failed; starting unauthenticated");
                self.clear_local_session();
            }
        }

        self.state.write().is_loading = false;
        self.emit(SessionEvent::Changed);

        tracing::info!(
            authenticated = self.is_authenticated(),
            "Session hydrated"
        );
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.state.write().last_error = None;

        match self.transport.login(email, password).await {
            Ok(auth) => {
                self.transport.bump_session_epoch();
                self.stop_scheduled_refresh();
                self.apply_session(&auth);

                if let Some(user) = self.snapshot().user {
                    tracing::info!(user_id = %user.id, "Logged in");
                }
                Ok(())
            }
            Err(err) => {
                let message = err
                    .server_message()
                    .unwrap_or(LOGIN_FALLBACK_MESSAGE)
                    .to_string();
                self.state.write().last_error = Some(message);
                self.emit(SessionEvent::Changed);
                Err(err)
            }
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        self.state.write().last_error = None;

        match self.transport.register(name, email, password).await {
            Ok(auth) => {
                self.transport.bump_session_epoch();
                self.stop_scheduled_refresh();
                self.apply_session(&auth);

                if let Some(user) = self.snapshot().user {
                    tracing::info!(user_id = %user.id, "Registered");
                }
                Ok(())
            }
            Err(err) => {
                let message = err
                    .server_message()
                    .unwrap_or(REGISTER_FALLBACK_MESSAGE)
                    .to_string();
                self.state.write().last_error = Some(message);
                self.emit(SessionEvent::Changed);
                Err(err)
            }
        }
    }

    /// Ends the session. The remote call is best-effort: local credentials
    /// are forgotten whether or not it succeeds.
    pub async fn logout(&self) {
        self.state.write().last_error = None;

        // Fence first so an in-flight refresh cannot resurrect the session.
        self.transport.bump_session_epoch();

        if let Err(err) = self.transport.logout().await {
            tracing::debug!(error = %err, "Logout request failed; clearing local session anyway");
        }

        self.clear_local_session();
        self.emit(SessionEvent::Changed);

        tracing::info!("Logged out");
    }

    pub fn clear_error(&self) {
        self.state.write().last_error = None;
        self.emit(SessionEvent::Changed);
    }

    /// Stops background tasks. Call on process teardown.
    pub fn shutdown(&self) {
        self.stop_scheduled_refresh();
        if let Some(stop) = self.listener_stop.lock().take() {
            let _ = stop.send(true);
        }
    }

    /// Applies an auth response according to the credential scheme: bearer
    /// deployments are keyed on the token, cookie-only ones on the user.
    fn apply_session(&self, auth: &AuthResponse) {
        self.spawn_expiry_listener();

        let renewed = match self.transport.scheme() {
            CredentialScheme::Bearer => {
                if let Some(token) = &auth.access_token {
                    self.transport.set_access_token(Some(token.clone()));
                    if let Some(user) = &auth.user {
                        self.state.write().user = Some(user.clone());
                    }
                    true
                } else {
                    false
                }
            }
            CredentialScheme::Cookie => {
                if let Some(user) = &auth.user {
                    self.state.write().user = Some(user.clone());
                    true
                } else {
                    false
                }
            }
        };

        if renewed {
            self.ensure_scheduled_refresh();
        } else {
            self.clear_local_session();
        }

        self.emit(SessionEvent::Changed);
    }

    fn clear_local_session(&self) {
        self.stop_scheduled_refresh();
        self.transport.set_access_token(None);
        self.state.write().user = None;
    }

    fn handle_expiry(&self) {
        self.clear_local_session();
        self.state.write().last_error = Some(SESSION_EXPIRED_MESSAGE.to_string());
        self.emit(SessionEvent::Expired);

        tracing::info!("Session expired");
    }

    /// Starts the silent periodic refresh if the session is authenticated
    /// and no task is running yet.
    fn ensure_scheduled_refresh(&self) {
        if self.state.read().user.is_none() {
            return;
        }

        let mut slot = self.refresh_stop.lock();
        if slot.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *slot = Some(stop_tx);
        drop(slot);

        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.refresh_interval);
            // interval fires immediately; the session was just renewed
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let epoch = manager.transport.session_epoch();
                        match manager.transport.refresh_session(true).await {
                            Ok(auth) => {
                                if manager.transport.session_epoch() == epoch {
                                    manager.apply_session(&auth);
                                }
                            }
                            Err(err) => {
                                // Expiry reaches consumers via the broadcast;
                                // this task just winds down.
                                tracing::debug!(error = %err, "Scheduled session refresh failed");
                                if !*stop_rx.borrow() {
                                    manager.refresh_stop.lock().take();
                                }
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    fn stop_scheduled_refresh(&self) {
        if let Some(stop) = self.refresh_stop.lock().take() {
            let _ = stop.send(true);
        }
    }

    fn spawn_expiry_listener(&self) {
        let mut slot = self.listener_stop.lock();
        if slot.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *slot = Some(stop_tx);
        drop(slot);

        let mut events = self.transport.subscribe();
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    event = events.recv() => match event {
                        Ok(AuthEvent::SessionExpired) => manager.handle_expiry(),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            refresh_interval: self.refresh_interval,
            refresh_stop: Arc::clone(&self.refresh_stop),
            listener_stop: Arc::clone(&self.listener_stop),
            hydration_pending: Arc::clone(&self.hydration_pending),
        }
    }
}
