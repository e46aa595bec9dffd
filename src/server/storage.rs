//! JSON document storage for the docstore server.
//!
//! One file per document:
//! ```text
//! <DATA_DIR>/
//!   <collection>/
//!     <id>.json
//! ```

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::PathBuf;

/// A stored document: top-level field name to value.
pub type Document = Map<String, Value>;

/// Errors that can occur during document storage operations.
#[derive(Debug)]
pub enum DocumentStoreError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A stored file is not a JSON object.
    Corrupt(PathBuf, String),
    /// Collection or document id that cannot be used as a file name.
    InvalidName(String),
}

impl std::fmt::Display for DocumentStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStoreError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            DocumentStoreError::Corrupt(path, e) => {
                write!(f, "Failed to load document {}: {}", path.display(), e)
            }
            DocumentStoreError::InvalidName(name) => {
                write!(f, "Invalid collection or document id: {}", name)
            }
        }
    }
}

impl std::error::Error for DocumentStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentStoreError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

/// File-backed collection-of-documents store.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Rejects names that could escape the data directory.
    fn validate_name(name: &str) -> Result<(), DocumentStoreError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(DocumentStoreError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.data_dir.join(collection)
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    /// Loads a document. Returns `Ok(None)` if it doesn't exist yet.
    pub fn load(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError> {
        Self::validate_name(collection)?;
        Self::validate_name(id)?;

        let path = self.doc_path(collection, id);
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(doc)) => Ok(Some(doc)),
                Ok(_) => Err(DocumentStoreError::Corrupt(path, "not an object".into())),
                Err(e) => Err(DocumentStoreError::Corrupt(path, e.to_string())),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocumentStoreError::IoError(path, e)),
        }
    }

    /// Writes `fields` as the whole document.
    pub fn replace(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
    ) -> Result<(), DocumentStoreError> {
        Self::validate_name(collection)?;
        Self::validate_name(id)?;

        let dir = self.collection_dir(collection);
        let path = self.doc_path(collection, id);

        fs::create_dir_all(&dir).map_err(|e| DocumentStoreError::IoError(dir.clone(), e))?;

        let bytes = serde_json::to_vec_pretty(fields)
            .map_err(|e| DocumentStoreError::Corrupt(path.clone(), e.to_string()))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)
            .map_err(|e| DocumentStoreError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| DocumentStoreError::IoError(path, e))?;

        Ok(())
    }

    /// Overwrites the given top-level fields, keeping the rest of the
    /// stored document. Creates the document if it doesn't exist.
    pub fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Document, DocumentStoreError> {
        let mut doc = self.load(collection, id)?.unwrap_or_default();
        doc.extend(fields);
        self.replace(collection, id, &doc)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = DocumentStore::new(temp_dir.path());
        (storage, temp_dir)
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(DocumentStore::validate_name("classes").is_ok());
        assert!(DocumentStore::validate_name("1717171717171").is_ok());

        assert!(DocumentStore::validate_name("").is_err());
        assert!(DocumentStore::validate_name("../evil").is_err());
        assert!(DocumentStore::validate_name("foo/bar").is_err());
        assert!(DocumentStore::validate_name("foo\\bar").is_err());
        assert!(DocumentStore::validate_name(".hidden").is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let (storage, _temp) = setup();
        assert!(storage.load("classes", "1").unwrap().is_none());
    }

    #[test]
    fn test_replace_and_load() {
        let (storage, temp) = setup();
        let fields = doc(json!({"id": "1", "name": "Math"}));

        storage.replace("classes", "1", &fields).unwrap();

        assert!(temp.path().join("classes").join("1.json").exists());
        assert_eq!(storage.load("classes", "1").unwrap().unwrap(), fields);
    }

    #[test]
    fn test_replace_drops_old_fields() {
        let (storage, _temp) = setup();
        storage
            .replace("classes", "1", &doc(json!({"name": "Math", "extra": true})))
            .unwrap();
        storage
            .replace("classes", "1", &doc(json!({"name": "Physics"})))
            .unwrap();

        let loaded = storage.load("classes", "1").unwrap().unwrap();
        assert_eq!(loaded, doc(json!({"name": "Physics"})));
    }

    #[test]
    fn test_merge_keeps_other_fields() {
        let (storage, _temp) = setup();
        storage
            .replace("classes", "1", &doc(json!({"name": "Math", "teacher": "Ada"})))
            .unwrap();

        let merged = storage
            .merge("classes", "1", doc(json!({"name": "Physics"})))
            .unwrap();

        assert_eq!(merged["name"], "Physics");
        assert_eq!(merged["teacher"], "Ada");
        assert_eq!(storage.load("classes", "1").unwrap().unwrap(), merged);
    }

    #[test]
    fn test_merge_creates_missing_document() {
        let (storage, _temp) = setup();
        storage
            .merge("classes", "2", doc(json!({"name": "Art"})))
            .unwrap();
        assert_eq!(storage.load("classes", "2").unwrap().unwrap()["name"], "Art");
    }

    #[test]
    fn test_corrupt_document() {
        let (storage, temp) = setup();
        fs::create_dir_all(temp.path().join("classes")).unwrap();
        fs::write(temp.path().join("classes").join("1.json"), "[1, 2]").unwrap();

        let result = storage.load("classes", "1");
        assert!(matches!(result, Err(DocumentStoreError::Corrupt(_, _))));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let (storage, _temp) = setup();
        let result = storage.replace("classes", "../x", &Document::new());
        assert!(matches!(result, Err(DocumentStoreError::InvalidName(_))));
    }
}
