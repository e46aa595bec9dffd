use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// How a pushed document combines with what the remote already holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// The pushed fields become the whole document.
    #[default]
    Replace,
    /// Pushed top-level fields overwrite; other remote fields survive.
    Merge,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(WriteMode::Replace),
            "merge" => Ok(WriteMode::Merge),
            _ => Err(format!(
                "Invalid write mode '{}'. Valid options: replace, merge",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Http(String),
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to encode document: {0}")]
    Encode(String),
}

/// A remote collection-of-documents store. Writes are push-only.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mode: WriteMode,
    ) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_from_str() {
        assert_eq!(WriteMode::from_str("MERGE").unwrap(), WriteMode::Merge);
        assert_eq!(WriteMode::from_str("replace").unwrap(), WriteMode::Replace);
        assert!(WriteMode::from_str("upsert").is_err());
    }

    #[test]
    fn test_write_mode_default_is_replace() {
        assert_eq!(WriteMode::default(), WriteMode::Replace);
    }
}
