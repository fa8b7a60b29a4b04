//! State transitions.
//!
//! Every change to [`StoreState`] is a [`Transition`]. Applying one is
//! synchronous, total and never panics.

use common::models::{DatabaseSchema, Record};

use crate::state::{EntityCollection, StoreState};

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    StartFetch { entity: String },
    FetchSucceeded {
        entity: String,
        items: Vec<Record>,
        total: u64,
        page: u32,
        limit: u32,
    },
    FetchFailed { entity: String, error: String },

    StartCreate { entity: String },
    CreateSucceeded { entity: String, item: Record },
    CreateFailed { entity: String, error: String },

    /// No-op when the entity type was never fetched or created.
    StartUpdate { entity: String },
    UpdateSucceeded { entity: String, item: Record },
    UpdateFailed { entity: String, error: String },

    /// No-op when the entity type was never fetched or created.
    StartDelete { entity: String },
    DeleteSucceeded { entity: String, id: String },
    DeleteFailed { entity: String, error: String },

    /// Settles an operation whose result is discarded.
    Abandon { entity: String },

    SetSelectedDatabase { id: Option<String> },
    SetSelectedDatabaseSchema { schema: DatabaseSchema },
}

impl Transition {
    /// Entity type targeted by this transition, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Transition::StartFetch { entity }
            | Transition::FetchSucceeded { entity, .. }
            | Transition::FetchFailed { entity, .. }
            | Transition::StartCreate { entity }
            | Transition::CreateSucceeded { entity, .. }
            | Transition::CreateFailed { entity, .. }
            | Transition::StartUpdate { entity }
            | Transition::UpdateSucceeded { entity, .. }
            | Transition::UpdateFailed { entity, .. }
            | Transition::StartDelete { entity }
            | Transition::DeleteSucceeded { entity, .. }
            | Transition::DeleteFailed { entity, .. }
            | Transition::Abandon { entity } => Some(entity),
            Transition::SetSelectedDatabase { .. } | Transition::SetSelectedDatabaseSchema { .. } => None,
        }
    }

    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Transition::StartFetch { .. } => "start_fetch",
            Transition::FetchSucceeded { .. } => "fetch_succeeded",
            Transition::FetchFailed { .. } => "fetch_failed",
            Transition::StartCreate { .. } => "start_create",
            Transition::CreateSucceeded { .. } => "create_succeeded",
            Transition::CreateFailed { .. } => "create_failed",
            Transition::StartUpdate { .. } => "start_update",
            Transition::UpdateSucceeded { .. } => "update_succeeded",
            Transition::UpdateFailed { .. } => "update_failed",
            Transition::StartDelete { .. } => "start_delete",
            Transition::DeleteSucceeded { .. } => "delete_succeeded",
            Transition::DeleteFailed { .. } => "delete_failed",
            Transition::Abandon { .. } => "abandon",
            Transition::SetSelectedDatabase { .. } => "set_selected_database",
            Transition::SetSelectedDatabaseSchema { .. } => "set_selected_database_schema",
        }
    }
}

impl StoreState {
    /// Applies a transition. Returns whether the state changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        match transition {
            Transition::StartFetch { entity } | Transition::StartCreate { entity } => {
                let collection = self.collection_or_default(&entity);
                collection.begin();
                collection.touch();
                true
            }
            Transition::StartUpdate { entity } | Transition::StartDelete { entity } => {
                self.patch(&entity, EntityCollection::begin)
            }
            Transition::FetchSucceeded {
                entity,
                items,
                total,
                page,
                limit,
            } => {
                let collection = self.collection_or_default(&entity);
                collection.items = items;
                collection.total = total;
                collection.page = page;
                collection.limit = limit;
                collection.error = None;
                collection.settle();
                collection.touch();
                true
            }
            Transition::FetchFailed { entity, error }
            | Transition::CreateFailed { entity, error }
            | Transition::UpdateFailed { entity, error }
            | Transition::DeleteFailed { entity, error } => self.patch(&entity, |c| {
                c.settle();
                c.error = Some(error);
            }),
            Transition::CreateSucceeded { entity, item } => self.patch(&entity, |c| {
                c.items.insert(0, item);
                c.total = c.total.saturating_add(1);
                c.settle();
            }),
            Transition::UpdateSucceeded { entity, item } => self.patch(&entity, |c| {
                if let Some(id) = item.id() {
                    if let Some(slot) = c.items.iter_mut().find(|existing| existing.has_id(&id)) {
                        *slot = item;
                    }
                }
                c.settle();
            }),
            Transition::DeleteSucceeded { entity, id } => self.patch(&entity, |c| {
                let before = c.items.len();
                c.items.retain(|item| !item.has_id(&id));
                if c.items.len() < before {
                    c.total = c.total.saturating_sub(1);
                }
                c.settle();
            }),
            Transition::Abandon { entity } => self.patch(&entity, EntityCollection::settle),
            Transition::SetSelectedDatabase { id } => {
                let id = id.filter(|id| !id.is_empty());
                if self.selection.selected_database_id == id {
                    return false;
                }
                self.selection.selected_database_id = id;
                true
            }
            Transition::SetSelectedDatabaseSchema { schema } => {
                self.selection.selected_database_schema = schema;
                true
            }
        }
    }

    /// Applies `f` to an existing collection; absent collections are left alone.
    fn patch<F>(&mut self, entity: &str, f: F) -> bool
    where
        F: FnOnce(&mut EntityCollection),
    {
        match self.collection_mut(entity) {
            Some(collection) => {
                f(collection);
                collection.touch();
                true
            }
            None => false,
        }
    }
}
