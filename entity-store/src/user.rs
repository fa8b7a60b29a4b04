//! Current user profile.

use std::sync::{Arc, PoisonError, RwLock};

use common::models::Record;

use crate::api::{decode, ApiRequest, RemoteApi};

const PROFILE_PATH: &str = "users/profile";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub loading: bool,
    pub user_data: Option<Record>,
    pub errors: Vec<String>,
}

/// Loads and caches the authenticated user's profile.
pub struct Profile {
    api: Arc<dyn RemoteApi>,
    state: RwLock<UserState>,
}

impl Profile {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn state(&self) -> UserState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Fetches the profile. Previous user data is kept on failure.
    pub async fn load_profile(&self) {
        self.update(|s| {
            s.loading = true;
            s.errors.clear();
        });

        let result = self
            .api
            .send(ApiRequest::get(PROFILE_PATH))
            .await
            .and_then(decode::<Record>);

        match result {
            Ok(user) => {
                tracing::debug!(user_id = ?user.id(), "Profile loaded");
                self.update(|s| {
                    s.loading = false;
                    s.user_data = Some(user);
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profile");
                self.update(|s| {
                    s.loading = false;
                    s.errors = vec![e.to_string()];
                });
            }
        }
    }

    /// Clears the cached profile, e.g. after logout.
    pub fn reset(&self) {
        self.update(|s| *s = UserState::default());
    }

    fn update(&self, f: impl FnOnce(&mut UserState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}
