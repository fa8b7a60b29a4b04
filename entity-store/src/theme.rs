//! UI theme mode.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use common::errors::AppResult;

use crate::storage::{LocalStorage, THEME_MODE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Parses a stored value; anything but `"dark"` is light.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("dark") {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme mode rehydrated from and persisted to durable storage.
pub struct Theme {
    storage: Arc<dyn LocalStorage>,
    mode: RwLock<ThemeMode>,
}

impl Theme {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        let mode = storage
            .get(THEME_MODE_KEY)
            .map(|v| ThemeMode::parse(&v))
            .unwrap_or_default();
        Self {
            storage,
            mode: RwLock::new(mode),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the mode and persists it. The in-memory mode changes even if
    /// persisting fails.
    pub fn toggle(&self) -> AppResult<ThemeMode> {
        let next = {
            let mut mode = self.mode.write().unwrap_or_else(PoisonError::into_inner);
            *mode = mode.toggled();
            *mode
        };
        tracing::debug!(mode = %next, "Theme toggled");
        self.storage.set(THEME_MODE_KEY, next.as_str())?;
        Ok(next)
    }
}
