//! Outgoing request decoration shared by every API call.

pub mod auth;
pub mod request_id;

// Re-export commonly used types
pub use auth::bearer_header_value;
pub use request_id::{RequestId, REQUEST_ID_HEADER};
