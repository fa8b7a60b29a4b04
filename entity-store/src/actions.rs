//! Asynchronous entity actions.
//!
//! Each CRUD action dispatches a start transition, awaits one remote call and
//! dispatches exactly one settle transition. Failures never escape: they are
//! written into the collection's `error` field. Consumers read results through
//! the selectors.

use std::sync::Arc;

use serde_json::Value;

use common::errors::{AppError, AppResult};
use common::models::{describe_schema, DatabaseSchema, Record};
use common::response::{ConnectResponse, ListResponse};
use common::utils::IdGenerator;

use crate::api::{decode, ApiRequest, RemoteApi};
use crate::cancel::CancelToken;
use crate::selectors::{self, DATABASE_ENTITY};
use crate::storage::{self, LocalStorage};
use crate::store::Store;
use crate::transition::Transition;

const FETCH_FAILED: &str = "Failed to fetch data";
const CREATE_FAILED: &str = "Failed to create item";
const UPDATE_FAILED: &str = "Failed to update item";
const DELETE_FAILED: &str = "Failed to delete item";

/// Orchestrates remote calls and store transitions.
#[derive(Clone)]
pub struct EntityActions {
    store: Arc<Store>,
    api: Arc<dyn RemoteApi>,
    storage: Arc<dyn LocalStorage>,
    default_limit: u32,
}

impl EntityActions {
    /// Creates the action layer over a store and an API client.
    pub fn new(
        store: Arc<Store>,
        api: Arc<dyn RemoteApi>,
        storage: Arc<dyn LocalStorage>,
        default_limit: u32,
    ) -> Self {
        Self {
            store,
            api,
            storage,
            default_limit,
        }
    }

    /// The store this layer writes into.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Fetches one page of `entity` from `resource_path` (defaults to the
    /// entity name). `limit` defaults to the configured page size.
    pub async fn fetch_entities(
        &self,
        entity: &str,
        resource_path: Option<&str>,
        page: u32,
        limit: Option<u32>,
    ) {
        self.fetch_entities_with_cancel(entity, resource_path, page, limit, &CancelToken::new())
            .await
    }

    pub async fn fetch_entities_with_cancel(
        &self,
        entity: &str,
        resource_path: Option<&str>,
        page: u32,
        limit: Option<u32>,
        cancel: &CancelToken,
    ) {
        let limit = limit.unwrap_or(self.default_limit);
        let path = resource_path.unwrap_or(entity);
        let op = IdGenerator::operation_id();
        tracing::debug!(op = %op, entity, path, page, limit, "Fetching entities");

        self.store.dispatch(Transition::StartFetch {
            entity: entity.to_string(),
        });
        let request = ApiRequest::get(path).query("page", page).query("limit", limit);
        let result = self
            .api
            .send(request)
            .await
            .and_then(decode::<ListResponse<Record>>);

        if self.abandoned(entity, &op, cancel, true) {
            return;
        }
        let transition = match result {
            Ok(list) => {
                tracing::info!(op = %op, entity, count = list.data.len(), total = list.total, "Entities fetched");
                Transition::FetchSucceeded {
                    entity: entity.to_string(),
                    items: list.data,
                    total: list.total,
                    page,
                    limit,
                }
            }
            Err(e) => {
                tracing::warn!(op = %op, entity, error = %e, "Fetch failed");
                Transition::FetchFailed {
                    entity: entity.to_string(),
                    error: e.store_message(FETCH_FAILED),
                }
            }
        };
        self.store.dispatch(transition);
    }

    /// Creates a record; the server's representation is prepended.
    pub async fn create_entity(&self, entity: &str, payload: &Record, resource_path: Option<&str>) {
        self.create_entity_with_cancel(entity, payload, resource_path, &CancelToken::new())
            .await
    }

    pub async fn create_entity_with_cancel(
        &self,
        entity: &str,
        payload: &Record,
        resource_path: Option<&str>,
        cancel: &CancelToken,
    ) {
        let path = resource_path.unwrap_or(entity);
        let op = IdGenerator::operation_id();
        tracing::debug!(op = %op, entity, path, "Creating entity");

        self.store.dispatch(Transition::StartCreate {
            entity: entity.to_string(),
        });
        let result = match to_body(payload) {
            Ok(body) => self
                .api
                .send(ApiRequest::post(path).json(body))
                .await
                .and_then(decode::<Record>),
            Err(e) => Err(e),
        };

        if self.abandoned(entity, &op, cancel, true) {
            return;
        }
        let transition = match result {
            Ok(item) => {
                tracing::info!(op = %op, entity, id = ?item.id(), "Entity created");
                Transition::CreateSucceeded {
                    entity: entity.to_string(),
                    item,
                }
            }
            Err(e) => {
                tracing::warn!(op = %op, entity, error = %e, "Create failed");
                Transition::CreateFailed {
                    entity: entity.to_string(),
                    error: e.store_message(CREATE_FAILED),
                }
            }
        };
        self.store.dispatch(transition);
    }

    /// Partially updates a record; the server's representation replaces the
    /// cached one in place.
    pub async fn update_entity(
        &self,
        entity: &str,
        id: &str,
        payload: &Record,
        resource_path: Option<&str>,
    ) {
        self.update_entity_with_cancel(entity, id, payload, resource_path, &CancelToken::new())
            .await
    }

    pub async fn update_entity_with_cancel(
        &self,
        entity: &str,
        id: &str,
        payload: &Record,
        resource_path: Option<&str>,
        cancel: &CancelToken,
    ) {
        let path = format!("{}/{}", resource_path.unwrap_or(entity), id);
        let op = IdGenerator::operation_id();
        tracing::debug!(op = %op, entity, id, path = %path, "Updating entity");

        let started = self.store.dispatch(Transition::StartUpdate {
            entity: entity.to_string(),
        });
        let result = match to_body(payload) {
            Ok(body) => self
                .api
                .send(ApiRequest::patch(path).json(body))
                .await
                .and_then(decode::<Record>),
            Err(e) => Err(e),
        };

        if self.abandoned(entity, &op, cancel, started) || !self.tracked(entity, &op, started) {
            return;
        }
        let transition = match result {
            Ok(item) => {
                tracing::info!(op = %op, entity, id, "Entity updated");
                Transition::UpdateSucceeded {
                    entity: entity.to_string(),
                    item,
                }
            }
            Err(e) => {
                tracing::warn!(op = %op, entity, id, error = %e, "Update failed");
                Transition::UpdateFailed {
                    entity: entity.to_string(),
                    error: e.store_message(UPDATE_FAILED),
                }
            }
        };
        self.store.dispatch(transition);
    }

    /// Deletes a record by id.
    pub async fn delete_entity(&self, entity: &str, id: &str) {
        self.delete_entity_with_cancel(entity, id, &CancelToken::new()).await
    }

    pub async fn delete_entity_with_cancel(&self, entity: &str, id: &str, cancel: &CancelToken) {
        let op = IdGenerator::operation_id();
        tracing::debug!(op = %op, entity, id, "Deleting entity");

        let started = self.store.dispatch(Transition::StartDelete {
            entity: entity.to_string(),
        });
        let result = self
            .api
            .send(ApiRequest::delete(format!("{}/{}", entity, id)))
            .await;

        if self.abandoned(entity, &op, cancel, started) || !self.tracked(entity, &op, started) {
            return;
        }
        let transition = match result {
            Ok(_) => {
                tracing::info!(op = %op, entity, id, "Entity deleted");
                Transition::DeleteSucceeded {
                    entity: entity.to_string(),
                    id: id.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(op = %op, entity, id, error = %e, "Delete failed");
                Transition::DeleteFailed {
                    entity: entity.to_string(),
                    error: e.store_message(DELETE_FAILED),
                }
            }
        };
        self.store.dispatch(transition);
    }

    /// Connects the backend to a database and caches its schema.
    ///
    /// Collection loading and error state are left alone; the error is
    /// returned to the caller instead.
    pub async fn connect_to_database(&self, id: &str) -> AppResult<DatabaseSchema> {
        tracing::info!(database_id = %id, "Connecting to database");
        let response = self
            .api
            .send(ApiRequest::post(format!("database/{}/connect", id)))
            .await
            .and_then(decode::<ConnectResponse>)
            .map_err(|e| {
                tracing::warn!(database_id = %id, error = %e, "Database connection failed");
                e
            })?;

        tracing::info!(
            database_id = %id,
            tables = response.schema.len(),
            message = ?response.message,
            "Connected to database"
        );
        tracing::debug!(schema = %describe_schema(&response.schema), "Database schema");
        self.store.dispatch(Transition::SetSelectedDatabaseSchema {
            schema: response.schema.clone(),
        });
        Ok(response.schema)
    }

    /// Selects a database and remembers the choice in durable storage.
    pub fn select_database(&self, id: &str) {
        self.store.dispatch(Transition::SetSelectedDatabase {
            id: Some(id.to_string()),
        });
        if let Err(e) = storage::save_selected_database_id(self.storage.as_ref(), id) {
            tracing::warn!(database_id = %id, error = %e, "Failed to persist selected database");
        }
    }

    /// Keeps the current selection while it names a cached database, and
    /// otherwise falls back to the first one. A selection is kept as-is
    /// while no databases are cached.
    pub fn ensure_selection(&self) -> Option<String> {
        let (current, current_known, first) = self.store.select(|s| {
            let databases = selectors::select_entity_data(s, DATABASE_ENTITY);
            let current = s.selection.selected_database_id.clone();
            let known = current
                .as_deref()
                .is_some_and(|id| databases.iter().any(|db| db.has_id(id)));
            (current, known, databases.first().and_then(Record::id))
        });
        match (current, first) {
            (Some(id), _) if current_known => Some(id),
            (Some(id), None) => Some(id),
            (current, Some(first)) => {
                if let Some(stale) = current {
                    tracing::info!(database_id = %stale, fallback = %first, "Selected database no longer listed");
                }
                self.select_database(&first);
                Some(first)
            }
            (None, None) => None,
        }
    }

    /// Releases the in-flight slot of a cancelled operation. Operations that
    /// never took a slot release nothing.
    fn abandoned(&self, entity: &str, op: &str, cancel: &CancelToken, started: bool) -> bool {
        if !cancel.is_cancelled() {
            return false;
        }
        tracing::debug!(op = %op, entity, "Operation cancelled, discarding result");
        if started {
            self.store.dispatch(Transition::Abandon {
                entity: entity.to_string(),
            });
        }
        true
    }

    /// Update and delete only start on a cached entity type. When the start
    /// was a no-op the settle must be too, even if a concurrent fetch has
    /// created the collection since: it holds no slot for this operation.
    fn tracked(&self, entity: &str, op: &str, started: bool) -> bool {
        if !started {
            tracing::debug!(op = %op, entity, "Entity type was not cached, result not applied");
        }
        started
    }
}

fn to_body(payload: &Record) -> AppResult<Value> {
    serde_json::to_value(payload).map_err(|e| AppError::Validation(e.to_string()))
}
