//! 仪表盘实体状态缓存
//!
//! Client-side cache of remote entity collections, keyed by entity type.
//! Actions drive each CRUD call through a start and a settle transition;
//! views read the cache through pure selectors.

pub mod actions;
pub mod api;
pub mod app;
pub mod auth;
pub mod cancel;
pub mod query;
pub mod selectors;
pub mod state;
pub mod storage;
pub mod store;
pub mod theme;
pub mod transition;
pub mod user;

pub use actions::EntityActions;
pub use api::{ApiRequest, HttpApiClient, HttpMethod, RemoteApi};
pub use app::AppState;
pub use auth::{AuthState, Session};
pub use cancel::CancelToken;
pub use query::QueryClient;
pub use state::{EntityCollection, SelectionState, StoreState};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use store::Store;
pub use theme::{Theme, ThemeMode};
pub use transition::Transition;
pub use user::{Profile, UserState};
