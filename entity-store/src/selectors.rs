//! Read-only projections over [`StoreState`].
//!
//! All selectors are pure and return safe defaults for entity types that
//! were never touched.

use std::sync::Arc;

use common::models::{DatabaseSchema, Record};
use common::response::Pagination;

use crate::state::{EntityCollection, StoreState, DEFAULT_PAGE};

/// Entity type holding the database connections.
pub const DATABASE_ENTITY: &str = "database";

/// Raw collection, or `None` if the entity type was never touched.
pub fn select_entity_state<'a>(state: &'a StoreState, entity: &str) -> Option<&'a EntityCollection> {
    state.collection(entity)
}

pub fn select_entity_loading(state: &StoreState, entity: &str) -> bool {
    select_entity_state(state, entity).is_some_and(EntityCollection::loading)
}

pub fn select_entity_error<'a>(state: &'a StoreState, entity: &str) -> Option<&'a str> {
    select_entity_state(state, entity).and_then(|c| c.error.as_deref())
}

pub fn select_entity_data<'a>(state: &'a StoreState, entity: &str) -> &'a [Record] {
    select_entity_state(state, entity)
        .map(|c| c.items.as_slice())
        .unwrap_or_default()
}

/// Pagination info; `{total: 0, page: 1, limit: 10}` for unseen entity types.
pub fn select_entity_pagination(state: &StoreState, entity: &str) -> Pagination {
    match select_entity_state(state, entity) {
        Some(c) => Pagination::new(c.page, c.limit, c.total),
        None => Pagination::new(DEFAULT_PAGE, common::config::DEFAULT_PAGE_SIZE, 0),
    }
}

/// Selected database id, or an empty string.
pub fn select_selected_database_id(state: &StoreState) -> &str {
    state.selection.selected_database_id.as_deref().unwrap_or_default()
}

/// The record in the `"database"` collection matching the selected id.
pub fn select_selected_database(state: &StoreState) -> Option<&Record> {
    let id = state.selection.selected_database_id.as_deref()?;
    select_entity_state(state, DATABASE_ENTITY)?.find(id)
}

pub fn select_selected_database_schema(state: &StoreState) -> &DatabaseSchema {
    &state.selection.selected_database_schema
}

/// Memoized [`select_selected_database`].
///
/// Returns the same `Arc` for as long as the `"database"` collection and the
/// selected id are unchanged, so consumers can skip re-rendering with
/// `Arc::ptr_eq`.
#[derive(Debug, Default)]
pub struct SelectedDatabaseMemo {
    key: Option<(Option<u64>, Option<String>)>,
    value: Option<Arc<Record>>,
}

impl SelectedDatabaseMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, state: &StoreState) -> Option<Arc<Record>> {
        let key = (
            select_entity_state(state, DATABASE_ENTITY).map(EntityCollection::revision),
            state.selection.selected_database_id.clone(),
        );
        if self.key.as_ref() != Some(&key) {
            self.value = select_selected_database(state).cloned().map(Arc::new);
            self.key = Some(key);
        }
        self.value.clone()
    }
}
