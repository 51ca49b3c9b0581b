// src/session.rs

//! Login and signup state machine.
//!
//! States move `LoggedOut -> LoggingIn -> LoggedIn | Failed`, and
//! `SigningUp` chains into `LoggingIn` once the account exists. Each
//! attempt is numbered. Cancelling or logging out bumps the number and
//! aborts the outstanding request; a token that still arrives for an
//! abandoned attempt is dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::error::{AppError, Result};
use crate::models::AccessToken;
use crate::services::AccountApi;
use crate::storage::SnapshotStore;

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    LoggedOut,
    LoggingIn,
    SigningUp,
    LoggedIn { username: Option<String> },
    Failed { message: String },
}

impl LoginState {
    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, LoginState::LoggingIn | LoginState::SigningUp)
    }
}

/// OAuth authorization-code exchange parameters.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub code: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug)]
struct SessionInner {
    state: LoginState,
    attempt: u64,
    token: Option<AccessToken>,
}

/// The account session of this client.
pub struct Session {
    api: Arc<dyn AccountApi>,
    store: Option<Arc<dyn SnapshotStore>>,
    inner: Mutex<SessionInner>,
    /// Highest attempt number that was abandoned
    cancelled: watch::Sender<u64>,
}

impl Session {
    pub fn new(api: Arc<dyn AccountApi>) -> Self {
        Self {
            api,
            store: None,
            inner: Mutex::new(SessionInner {
                state: LoginState::LoggedOut,
                attempt: 0,
                token: None,
            }),
            cancelled: watch::channel(0).0,
        }
    }

    /// Persist remembered logins to `store`.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn state(&self) -> LoginState {
        self.inner.lock().await.state.clone()
    }

    /// Bearer token of the logged-in account.
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .token
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Resume a remembered login from the store, if its token is still valid.
    pub async fn restore(&self) -> Result<LoginState> {
        let Some(store) = &self.store else {
            return Ok(self.state().await);
        };
        let saved = store.load_session().await?;

        let mut inner = self.inner.lock().await;
        match saved.token {
            Some(token) if !token.is_expired(Utc::now()) => {
                log::info!(
                    "Restored session for {}",
                    saved.username.as_deref().unwrap_or("<unknown>")
                );
                inner.token = Some(token);
                inner.state = LoginState::LoggedIn {
                    username: saved.username,
                };
            }
            Some(_) => log::info!("Remembered token has expired"),
            None => {}
        }
        Ok(inner.state.clone())
    }

    /// Log in with username and password.
    ///
    /// Returns `LoggedOut` if the attempt was cancelled before it finished.
    pub async fn login(&self, username: &str, password: &str, keep_logged_in: bool) -> Result<LoginState> {
        let attempt = self.begin(LoginState::LoggingIn).await?;
        log::info!("Logging in as {}", username);
        let Some(result) = self
            .unless_cancelled(attempt, self.api.password_token(username, password))
            .await
        else {
            return Ok(self.state().await);
        };
        self.settle(attempt, Some(username.to_string()), keep_logged_in, result)
            .await
    }

    /// Log in by exchanging an OAuth authorization code.
    pub async fn login_with_auth_code(&self, code: &AuthCode, keep_logged_in: bool) -> Result<LoginState> {
        let attempt = self.begin(LoginState::LoggingIn).await?;
        let request = self.api.auth_code_token(
            &code.code,
            &code.client_id,
            &code.client_secret,
            &code.redirect_uri,
        );
        let Some(result) = self.unless_cancelled(attempt, request).await else {
            return Ok(self.state().await);
        };
        self.settle(attempt, None, keep_logged_in, result).await
    }

    /// Create an account, then log into it.
    pub async fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
        keep_logged_in: bool,
    ) -> Result<LoginState> {
        let attempt = self.begin(LoginState::SigningUp).await?;
        log::info!("Signing up {}", username);
        let Some(result) = self
            .unless_cancelled(attempt, self.api.create_account(email, username, password))
            .await
        else {
            return Ok(self.state().await);
        };

        {
            let mut inner = self.inner.lock().await;
            if inner.attempt != attempt {
                log::debug!("Ignoring signup result of cancelled attempt {}", attempt);
                return Ok(inner.state.clone());
            }
            if let Err(error) = result {
                log::warn!("Signup failed: {}", error);
                inner.state = LoginState::Failed {
                    message: error.to_string(),
                };
                return Err(error);
            }
            inner.state = LoginState::LoggingIn;
        }

        let Some(result) = self
            .unless_cancelled(attempt, self.api.password_token(username, password))
            .await
        else {
            return Ok(self.state().await);
        };
        self.settle(attempt, Some(username.to_string()), keep_logged_in, result)
            .await
    }

    /// Abandon an outstanding login or signup.
    ///
    /// Returns false when nothing was in progress.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_busy() {
            return false;
        }
        self.cancelled.send_replace(inner.attempt);
        inner.attempt += 1;
        inner.state = LoginState::LoggedOut;
        log::info!("Login cancelled");
        true
    }

    /// Drop the token and forget any remembered account.
    pub async fn logout(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            self.cancelled.send_replace(inner.attempt);
            inner.attempt += 1;
            inner.token = None;
            inner.state = LoginState::LoggedOut;
        }
        if let Some(store) = &self.store {
            let mut saved = store.load_session().await?;
            saved.clear_account();
            store.save_session(&saved).await?;
        }
        log::info!("Logged out");
        Ok(())
    }

    async fn begin(&self, next: LoginState) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        if inner.state.is_busy() {
            return Err(AppError::session("a login is already in progress"));
        }
        inner.attempt += 1;
        inner.state = next;
        Ok(inner.attempt)
    }

    /// Run a backend request, dropping it as soon as `attempt` is cancelled.
    ///
    /// Dropping the future aborts the underlying HTTP exchange.
    async fn unless_cancelled<T>(
        &self,
        attempt: u64,
        request: impl Future<Output = Result<T>>,
    ) -> Option<Result<T>> {
        let mut cancelled = self.cancelled.subscribe();
        tokio::select! {
            result = request => Some(result),
            _ = async {
                let _ = cancelled.wait_for(|&abandoned| abandoned >= attempt).await;
            } => {
                log::debug!("Aborted request of cancelled attempt {}", attempt);
                None
            }
        }
    }

    async fn settle(
        &self,
        attempt: u64,
        username: Option<String>,
        keep_logged_in: bool,
        result: Result<AccessToken>,
    ) -> Result<LoginState> {
        let (state, token) = {
            let mut inner = self.inner.lock().await;
            if inner.attempt != attempt {
                log::debug!("Ignoring login result of cancelled attempt {}", attempt);
                return Ok(inner.state.clone());
            }

            match result {
                Ok(token) => {
                    inner.token = Some(token.clone());
                    inner.state = LoginState::LoggedIn {
                        username: username.clone(),
                    };
                    (inner.state.clone(), token)
                }
                Err(error) => {
                    log::warn!("Login failed: {}", error);
                    inner.state = LoginState::Failed {
                        message: error.to_string(),
                    };
                    return Err(error);
                }
            }
        };

        log::info!("Login complete");
        self.remember(username, token, keep_logged_in).await;
        Ok(state)
    }

    /// Save or clear the remembered account; failures only cost persistence.
    async fn remember(&self, username: Option<String>, token: AccessToken, keep_logged_in: bool) {
        let Some(store) = &self.store else {
            return;
        };

        let result = async {
            let mut saved = store.load_session().await?;
            if keep_logged_in {
                saved.username = username;
                saved.token = Some(token);
            } else {
                saved.clear_account();
            }
            store.save_session(&saved).await
        }
        .await;

        if let Err(error) = result {
            log::warn!("Failed to persist session: {}", error);
        }
    }
}
