use async_trait::async_trait;

use super::{KeyValueBackend, StorageError};
use crate::db::KvRepository;

#[async_trait]
impl KeyValueBackend for KvRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(KvRepository::get(self, key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        Ok(self.put(key, &value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.delete(key).await?)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(KvRepository::keys(self).await?)
    }
}
