//! Session lifecycle: startup restore, login, logout, forced teardown.
//!
//! `SessionManager` owns the tri-state session (`Unknown` until the stored
//! token has been checked) and is the only place that flips it. Login
//! rejections come back as values with the server's own message attached,
//! not as errors. A token rejected mid-session reaches the manager through
//! the auth event channel and signs the user out locally.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::error::extract_message;
use crate::api::{ApiClient, ApiError};

use super::events::{AuthEvent, Subscription};

/// Fallback when the backend rejects a login without a usable message.
const LOGIN_FAILED_MESSAGE: &str = "Giriş başarısız";

/// Fallback for failures that carry no displayable message of their own.
const GENERIC_ERROR_MESSAGE: &str = "Bir hata oluştu";

/// Where the session stands. `Unknown` lasts from construction until
/// [`SessionManager::restore`] has looked at the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time copy of the session. The token itself stays in the store.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: AuthState,
    pub username: Option<String>,
}

/// Body of a successful `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// What a login attempt came to. Wrong credentials are a `Failure` value
/// carrying the message to show, never an `Err`.
#[derive(Debug)]
pub enum LoginOutcome {
    Success(LoginResponse),
    Failure { message: String },
}

type LogoutHook = Box<dyn Fn() + Send + Sync>;

/// Owns the session state and the reactions to it changing.
pub struct SessionManager {
    client: ApiClient,
    session: Arc<RwLock<Session>>,
    logout_hook: Arc<Mutex<Option<LogoutHook>>>,
    _invalidation: Subscription,
}

impl SessionManager {
    /// Build a manager over the client and subscribe to forced-teardown
    /// notifications for the manager's lifetime.
    pub fn new(client: ApiClient) -> Self {
        let session = Arc::new(RwLock::new(Session::default()));
        let logout_hook: Arc<Mutex<Option<LogoutHook>>> = Arc::new(Mutex::new(None));

        let handler_session = Arc::clone(&session);
        let handler_hook = Arc::clone(&logout_hook);
        let invalidation = client.events().subscribe(move |event| match event {
            AuthEvent::SessionInvalidated => {
                let mut session = handler_session
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                if session.state == AuthState::Unauthenticated {
                    return;
                }
                *session = Session {
                    state: AuthState::Unauthenticated,
                    username: None,
                };
                drop(session);

                info!("Session invalidated, signed out locally");
                let hook = handler_hook.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(hook) = hook.as_ref() {
                    hook();
                }
            }
        });

        Self {
            client,
            session,
            logout_hook,
            _invalidation: invalidation,
        }
    }

    /// Resolve the startup state from the stored token.
    ///
    /// A stored token is trusted without a server round-trip; the first
    /// authenticated call settles whether it is still valid. An unreadable
    /// store resolves to `Unauthenticated` so startup never hangs on
    /// `Unknown`.
    pub async fn restore(&self) -> AuthState {
        match self.client.store().get().await {
            Ok(Some(_)) => {
                self.client.rearm_teardown();
                self.set_session(Session {
                    state: AuthState::Authenticated,
                    username: None,
                });
                debug!("Restored session from stored token");
                AuthState::Authenticated
            }
            Ok(None) => {
                self.set_session(Session {
                    state: AuthState::Unauthenticated,
                    username: None,
                });
                AuthState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored token at startup");
                self.set_session(Session {
                    state: AuthState::Unauthenticated,
                    username: None,
                });
                AuthState::Unauthenticated
            }
        }
    }

    /// Attempt a login. The session flips to `Authenticated` only after the
    /// token has been persisted.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let result: Result<LoginResponse, ApiError> = self
            .client
            .post("/login")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return LoginOutcome::Failure {
                    message: login_error_message(e),
                };
            }
        };

        let token = response.token.clone().filter(|token| !token.is_empty());
        let Some(token) = token.filter(|_| response.status) else {
            let message = response
                .message
                .clone()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            debug!("Login rejected by backend");
            return LoginOutcome::Failure { message };
        };

        // Store first; the state flips only once the token is durable.
        if let Err(e) = self.client.store().set(&token).await {
            warn!(error = %e, "Failed to persist token after login");
            return LoginOutcome::Failure {
                message: GENERIC_ERROR_MESSAGE.to_string(),
            };
        }

        self.client.rearm_teardown();
        self.set_session(Session {
            state: AuthState::Authenticated,
            username: response
                .username
                .clone()
                .or_else(|| Some(username.to_string())),
        });
        info!("Login succeeded");
        LoginOutcome::Success(response)
    }

    /// Explicit sign-out. The local session clears even when the store
    /// delete fails; the logout hook does not run for explicit sign-out.
    pub async fn logout(&self) {
        if let Err(e) = self.client.store().delete().await {
            warn!(error = %e, "Failed to delete token on logout, clearing session anyway");
        }
        self.set_session(Session {
            state: AuthState::Unauthenticated,
            username: None,
        });
        info!("Signed out");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AuthState {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Point-in-time copy of the session.
    pub fn snapshot(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a callback for forced sign-out after a rejected token.
    /// Explicit [`logout`](Self::logout) does not fire it. Replaces any
    /// previously registered hook.
    pub fn set_logout_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self
            .logout_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    /// The API client this manager wraps.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn set_session(&self, session: Session) {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }
}

/// Message shown for a login that failed before the credential check.
/// Fixed-message classes display themselves; an unclassified HTTP error
/// surfaces the backend's own message when it has one.
fn login_error_message(error: ApiError) -> String {
    match error {
        ApiError::Http { ref body, .. } => {
            extract_message(body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
        }
        ApiError::SessionExpired
        | ApiError::Connection(_)
        | ApiError::RateLimited
        | ApiError::Server { .. } => error.to_string(),
        ApiError::Storage(_) | ApiError::Encode(_) | ApiError::Decode(_) | ApiError::Unknown(_) => {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}
