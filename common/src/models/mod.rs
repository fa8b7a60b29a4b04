//! Shared data models.

pub mod auth;
pub mod query;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use auth::{AuthProvider, AuthRequest, AuthResponse, LoginRequest, RegisterRequest, SocialLoginRequest};
pub use query::{ChartKind, ChartSeries, ExecuteQueryRequest, GenerateSqlRequest, GenerateSqlResponse, PieSlice, QueryResults};
pub use record::{FieldValue, Record, FALLBACK_ID_FIELD, ID_FIELD};
pub use schema::{describe_schema, ColumnDescriptor, DatabaseSchema};
