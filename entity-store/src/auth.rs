//! Authentication session.
//!
//! Exchanges credentials for an access token and keeps it in durable storage,
//! where the API client picks it up for every subsequent request.

use std::sync::{Arc, PoisonError, RwLock};

use common::errors::{AppError, AppResult};
use common::models::{AuthRequest, AuthResponse};

use crate::api::{decode, ApiRequest, RemoteApi};
use crate::storage::{self, LocalStorage};

const AUTH_FAILED: &str = "Something went wrong";

/// Observable auth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub has_jwt_token: bool,
    pub loading: bool,
    pub errors: Vec<String>,
}

/// Login/registration session bound to durable storage.
pub struct Session {
    api: Arc<dyn RemoteApi>,
    storage: Arc<dyn LocalStorage>,
    state: RwLock<AuthState>,
}

impl Session {
    /// Creates a session; it is authenticated if a token is already stored.
    pub fn new(api: Arc<dyn RemoteApi>, storage: Arc<dyn LocalStorage>) -> Self {
        let has_jwt_token = storage::token(storage.as_ref()).is_some();
        Self {
            api,
            storage,
            state: RwLock::new(AuthState {
                has_jwt_token,
                ..Default::default()
            }),
        }
    }

    /// Current auth state.
    pub fn state(&self) -> AuthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().has_jwt_token
    }

    /// Logs in, registers or completes a social login.
    ///
    /// Validation failures are recorded without contacting the server.
    pub async fn authenticate(&self, request: AuthRequest) {
        let kind = request.kind();
        if let Err(e) = request.validate() {
            tracing::debug!(kind, error = %e, "Auth request rejected");
            self.update(|s| s.errors = vec![e.to_string()]);
            return;
        }

        self.update(|s| {
            s.loading = true;
            s.errors.clear();
        });
        tracing::info!(kind, "Authenticating");

        match self.exchange(&request).await {
            Ok(Some(token)) => {
                let saved = storage::save_token(self.storage.as_ref(), &token);
                if let Err(e) = &saved {
                    tracing::warn!(kind, error = %e, "Failed to persist access token");
                }
                tracing::info!(kind, "Authenticated");
                self.update(|s| {
                    s.loading = false;
                    s.has_jwt_token = true;
                });
            }
            Ok(None) => {
                tracing::warn!(kind, "Auth response carried no access token");
                self.update(|s| s.loading = false);
            }
            Err(e) => {
                tracing::warn!(kind, error = %e, "Authentication failed");
                let message = failure_message(&e);
                self.update(|s| {
                    s.loading = false;
                    s.errors = vec![message];
                });
            }
        }
    }

    /// Forgets the stored token and resets the state.
    pub fn logout(&self) -> AppResult<()> {
        storage::delete_token(self.storage.as_ref())?;
        self.update(|s| *s = AuthState::default());
        tracing::info!("Logged out");
        Ok(())
    }

    async fn exchange(&self, request: &AuthRequest) -> AppResult<Option<String>> {
        let body = request.body()?;
        let response: AuthResponse = self
            .api
            .send(ApiRequest::post(request.path()).json(body))
            .await
            .and_then(decode)?;
        Ok(response.access_token.filter(|t| !t.is_empty()))
    }

    fn update(&self, f: impl FnOnce(&mut AuthState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

/// Server and validation messages are shown as-is; anything else is generic.
fn failure_message(err: &AppError) -> String {
    match err {
        AppError::Http { message, .. } | AppError::Validation(message) => message.clone(),
        _ => AUTH_FAILED.to_string(),
    }
}
