//! Entity store state shape.
//!
//! One [`EntityCollection`] per entity-type name, plus the cross-cutting
//! database selection.

use std::collections::HashMap;

use common::config::DEFAULT_PAGE_SIZE;
use common::models::{DatabaseSchema, Record};

/// Page requested when none is given.
pub const DEFAULT_PAGE: u32 = 1;

/// Cached list and request metadata for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection {
    /// Cached records; newest creations first.
    pub items: Vec<Record>,
    /// Server-side item count; may exceed `items.len()`.
    pub total: u64,
    /// Last requested page.
    pub page: u32,
    /// Last requested page size.
    pub limit: u32,
    /// Error message of the last failed operation.
    pub error: Option<String>,
    /// Operations started and not yet settled.
    pub(crate) in_flight: u32,
    /// Bumped by every transition that touches this collection.
    pub(crate) revision: u64,
}

impl Default for EntityCollection {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
            error: None,
            in_flight: 0,
            revision: 0,
        }
    }
}

impl EntityCollection {
    /// True while any operation on this entity type is outstanding.
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of outstanding operations.
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Revision counter, for memoization.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Finds a cached record by identifier.
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.items.iter().find(|item| item.has_id(id))
    }

    pub(crate) fn begin(&mut self) {
        self.in_flight = self.in_flight.saturating_add(1);
        self.error = None;
    }

    pub(crate) fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Currently selected database and its schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_database_id: Option<String>,
    pub selected_database_schema: DatabaseSchema,
}

/// The whole entity store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub(crate) entities: HashMap<String, EntityCollection>,
    pub selection: SelectionState,
}

impl StoreState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a restored database selection.
    pub fn with_selected_database(id: Option<String>) -> Self {
        Self {
            selection: SelectionState {
                selected_database_id: id.filter(|id| !id.is_empty()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns the collection for an entity type, if it was ever touched.
    pub fn collection(&self, entity: &str) -> Option<&EntityCollection> {
        self.entities.get(entity)
    }

    /// Entity types seen so far.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub(crate) fn collection_mut(&mut self, entity: &str) -> Option<&mut EntityCollection> {
        self.entities.get_mut(entity)
    }

    pub(crate) fn collection_or_default(&mut self, entity: &str) -> &mut EntityCollection {
        self.entities.entry(entity.to_string()).or_default()
    }
}
