//! Application state wiring.
//!
//! Builds every component once and shares the same store, storage and API
//! client between them.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;

use crate::actions::EntityActions;
use crate::api::{HttpApiClient, RemoteApi};
use crate::auth::Session;
use crate::query::QueryClient;
use crate::storage::{FileStorage, LocalStorage};
use crate::store::Store;
use crate::theme::Theme;
use crate::user::Profile;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<dyn LocalStorage>,
    pub api: Arc<dyn RemoteApi>,
    pub store: Arc<Store>,
    pub actions: EntityActions,
    pub session: Arc<Session>,
    pub profile: Arc<Profile>,
    pub theme: Arc<Theme>,
    pub queries: QueryClient,
}

impl AppState {
    /// Wires file-backed storage and the HTTP API client from configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::open(&config.storage_path));
        let api: Arc<dyn RemoteApi> = Arc::new(HttpApiClient::new(&config, storage.clone())?);
        tracing::info!(
            service = %config.service_name,
            api_url = %config.api_url,
            storage_path = %config.storage_path,
            "Application state initialized"
        );
        Ok(Self::with_parts(config, storage, api))
    }

    /// Wires the components over the given storage and API client.
    pub fn with_parts(config: AppConfig, storage: Arc<dyn LocalStorage>, api: Arc<dyn RemoteApi>) -> Self {
        let store = Arc::new(Store::rehydrate(storage.as_ref()));
        let actions = EntityActions::new(
            store.clone(),
            api.clone(),
            storage.clone(),
            config.default_page_size,
        );
        Self {
            session: Arc::new(Session::new(api.clone(), storage.clone())),
            profile: Arc::new(Profile::new(api.clone())),
            theme: Arc::new(Theme::new(storage.clone())),
            queries: QueryClient::new(api.clone()),
            config,
            storage,
            api,
            store,
            actions,
        }
    }
}
