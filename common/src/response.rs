//! Remote API response envelopes.
//!
//! Typed shapes for the JSON bodies the dashboard backend returns.

use serde::{Deserialize, Serialize};

use crate::models::schema::DatabaseSchema;

/// Paginated list response: `{data, total}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Items in the requested window.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    /// Total number of items available server-side.
    #[serde(default)]
    pub total: u64,
}

/// Connect-to-database response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// Table name → columns.
    #[serde(default)]
    pub schema: DatabaseSchema,

    /// Informational message from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
}

/// Error message, either a single string or a list of validation messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorBody {
    /// Parses an error body, returning the human-readable message if any.
    pub fn message_from(bytes: &[u8]) -> Option<String> {
        let body: ErrorBody = serde_json::from_slice(bytes).ok()?;
        let message = match body.message? {
            ErrorMessage::One(m) => m,
            ErrorMessage::Many(ms) => ms.join(", "),
        };
        (!message.trim().is_empty()).then_some(message)
    }
}

/// Pagination information for a cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Total number of items.
    pub total: u64,

    /// Current page number (1-based).
    pub page: u32,

    /// Number of items per page.
    pub limit: u32,

    /// Total number of pages.
    pub total_pages: u32,

    /// Whether there is a next page.
    pub has_next: bool,

    /// Whether there is a previous page.
    pub has_prev: bool,
}

impl Pagination {
    /// Creates pagination info from total count and page parameters.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)).min(u64::from(u32::MAX)) as u32
        };
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 10, 0)
    }
}
