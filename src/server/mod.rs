//! Reference remote document store for sync.

pub mod routes;
pub mod storage;

pub use routes::{router, ApiKeyStore, AppState, AuthUser};
pub use storage::{Document, DocumentStore, DocumentStoreError};
