//! Store container.
//!
//! [`Store`] owns one [`StoreState`] and is the only way to change it. Each
//! dispatched [`Transition`] is applied atomically under a lock that is never
//! held across an await point. Subscribers observe a version number that
//! increases whenever a transition actually changes the state.

use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use crate::state::StoreState;
use crate::storage::{self, LocalStorage};
use crate::transition::Transition;

/// Entity store container.
pub struct Store {
    state: RwLock<StoreState>,
    version: watch::Sender<u64>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_state(StoreState::new())
    }

    /// Creates a store from an existing state.
    pub fn with_state(state: StoreState) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            state: RwLock::new(state),
            version,
        }
    }

    /// Creates a store with the database selection restored from durable storage.
    pub fn rehydrate(storage: &dyn LocalStorage) -> Self {
        let selected = storage::selected_database_id(storage);
        if let Some(id) = &selected {
            tracing::debug!(database_id = %id, "Restored selected database");
        }
        Self::with_state(StoreState::with_selected_database(selected))
    }

    /// Applies a transition. Returns whether the state changed.
    pub fn dispatch(&self, transition: Transition) -> bool {
        let name = transition.name();
        let entity = transition.entity().map(str::to_string);
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.apply(transition)
        };
        if changed {
            self.version.send_modify(|v| *v += 1);
        }
        tracing::trace!(transition = name, entity = ?entity, changed, "Transition applied");
        changed
    }

    /// Runs a read-only projection over the current state.
    pub fn select<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Clones the current state.
    pub fn snapshot(&self) -> StoreState {
        self.select(StoreState::clone)
    }

    /// Current state version.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
