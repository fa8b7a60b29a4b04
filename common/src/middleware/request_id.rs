//! Request ID tagging.
//!
//! Every outgoing API call carries a unique `x-request-id` header so client
//! logs can be correlated with server logs.

use std::fmt;

use reqwest::header::HeaderValue;
use reqwest::RequestBuilder;

use crate::utils::IdGenerator;

/// Header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ID of one outgoing API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(IdGenerator::request_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tags an outgoing request with this ID. IDs that are not valid header
    /// values are left off.
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => builder.header(REQUEST_ID_HEADER, value),
            Err(_) => builder,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
