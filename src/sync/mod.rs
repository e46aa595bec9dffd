//! One-way push of local state to a remote document store.
//!
//! Each class becomes one document in the `classes` collection, keyed by
//! class id. Local data always overwrites remote data; nothing is pulled
//! back or merged. Callers must check that a user is logged in before
//! syncing; the engine itself does not look at credentials.

mod engine;
mod http;
mod remote;

pub use engine::{ClassDocument, SyncEngine, SyncFailure, SyncReport, CLASSES_COLLECTION};
pub use http::HttpDocumentStore;
pub use remote::{RemoteDocumentStore, RemoteError, WriteMode};

/// Errors surfaced to the user around a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync not configured. Add sync.server_url to config.")]
    NotConfigured,
    #[error("Not logged in. Add sync.api_key to config or set ROLLCALL_SYNC_API_KEY.")]
    NotLoggedIn,
    #[error("Sync failed for class {}: {} ({} synced, {} not attempted)",
        .failure.class_id, .failure.error, .synced.len(), .not_attempted.len())]
    Partial {
        synced: Vec<String>,
        failure: SyncFailure,
        not_attempted: Vec<String>,
    },
}

impl SyncReport {
    /// Converts a failed run into [`SyncError::Partial`].
    pub fn into_result(self) -> Result<Vec<String>, SyncError> {
        match self.failed {
            None => Ok(self.synced),
            Some(failure) => Err(SyncError::Partial {
                synced: self.synced,
                failure,
                not_attempted: self.not_attempted,
            }),
        }
    }
}
