use serde::Serialize;
use serde_json::{Map, Value};

use super::remote::{RemoteDocumentStore, RemoteError, WriteMode};
use crate::ledger::AttendanceLedger;
use crate::models::{AttendanceBlob, Class, Student};

/// Remote collection holding one document per class.
pub const CLASSES_COLLECTION: &str = "classes";

/// The remote shape of a class: roster plus all recorded attendance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDocument {
    pub id: String,
    pub name: String,
    pub students: Vec<Student>,
    pub daily_attendance: AttendanceBlob,
}

impl ClassDocument {
    pub fn new(class: &Class, daily_attendance: AttendanceBlob) -> Self {
        Self {
            id: class.id.clone(),
            name: class.name.clone(),
            students: class.students.clone(),
            daily_attendance,
        }
    }

    pub fn into_fields(self) -> Result<Map<String, Value>, RemoteError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(RemoteError::Encode("document is not an object".into())),
            Err(e) => Err(RemoteError::Encode(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub class_id: String,
    pub error: RemoteError,
}

/// Per-class outcome of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Class ids written, in order.
    pub synced: Vec<String>,
    /// The class whose write failed and stopped the run.
    pub failed: Option<SyncFailure>,
    /// Class ids after the failure that were never attempted.
    pub not_attempted: Vec<String>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Pushes local classes, rosters and attendance to a remote document store.
///
/// One document per class, local state wins. There is no pull path.
/// The first failed write stops the run; earlier writes stay applied.
pub struct SyncEngine<R> {
    ledger: AttendanceLedger,
    remote: R,
    mode: WriteMode,
}

impl<R: RemoteDocumentStore> SyncEngine<R> {
    pub fn new(ledger: AttendanceLedger, remote: R, mode: WriteMode) -> Self {
        Self {
            ledger,
            remote,
            mode,
        }
    }

    pub async fn sync_all(&self, classes: &[Class]) -> SyncReport {
        let mut report = SyncReport::default();

        for (idx, class) in classes.iter().enumerate() {
            match self.sync_class(class).await {
                Ok(()) => {
                    tracing::info!("Synced class {}", class.id);
                    report.synced.push(class.id.clone());
                }
                Err(error) => {
                    tracing::error!("Failed to sync class {}: {}", class.id, error);
                    report.failed = Some(SyncFailure {
                        class_id: class.id.clone(),
                        error,
                    });
                    report.not_attempted = classes[idx + 1..].iter().map(|c| c.id.clone()).collect();
                    break;
                }
            }
        }

        report
    }

    pub async fn sync_class(&self, class: &Class) -> Result<(), RemoteError> {
        // Pushing an empty blob in replace mode would erase the remote copy.
        let attendance = self.ledger.read_blob(&class.id).await.ok_or_else(|| {
            RemoteError::Encode(format!("attendance for class {} is unreadable", class.id))
        })?;
        let fields = ClassDocument::new(class, attendance).into_fields()?;
        self.remote
            .write_document(CLASSES_COLLECTION, &class.id, fields, self.mode)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use crate::store::test_support::FaultyBackend;
    use crate::store::LocalStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FakeRemote {
        fail_ids: HashSet<String>,
        writes: Mutex<Vec<(String, String, Map<String, Value>, WriteMode)>>,
    }

    impl FakeRemote {
        fn failing(ids: &[&str]) -> Self {
            Self {
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl RemoteDocumentStore for FakeRemote {
        async fn write_document(
            &self,
            collection: &str,
            id: &str,
            fields: Map<String, Value>,
            mode: WriteMode,
        ) -> Result<(), RemoteError> {
            if self.fail_ids.contains(id) {
                return Err(RemoteError::Status {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.writes
                .lock()
                .await
                .push((collection.to_string(), id.to_string(), fields, mode));
            Ok(())
        }
    }

    fn classes(ids: &[&str]) -> Vec<Class> {
        ids.iter()
            .map(|id| {
                Class::with_id(*id, format!("Class {}", id))
                    .with_students(vec![Student::new("Ada", "1", "")])
            })
            .collect()
    }

    #[tokio::test]
    async fn test_sync_all_success() {
        let engine = SyncEngine::new(
            AttendanceLedger::new(LocalStore::in_memory()),
            FakeRemote::default(),
            WriteMode::Replace,
        );

        let report = engine.sync_all(&classes(&["1", "2"])).await;

        assert!(report.is_success());
        assert_eq!(report.synced, vec!["1", "2"]);
        let writes = engine.remote.writes.lock().await;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, "classes");
        assert_eq!(writes[1].1, "2");
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_per_class() {
        let engine = SyncEngine::new(
            AttendanceLedger::new(LocalStore::in_memory()),
            FakeRemote::failing(&["2"]),
            WriteMode::Replace,
        );

        let report = engine.sync_all(&classes(&["1", "2", "3"])).await;

        assert!(!report.is_success());
        assert_eq!(report.synced, vec!["1"]);
        assert_eq!(report.failed.as_ref().unwrap().class_id, "2");
        assert_eq!(report.not_attempted, vec!["3"]);
        assert_eq!(engine.remote.writes.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_first_class_failure() {
        let engine = SyncEngine::new(
            AttendanceLedger::new(LocalStore::in_memory()),
            FakeRemote::failing(&["1"]),
            WriteMode::Replace,
        );

        let report = engine.sync_all(&classes(&["1", "2"])).await;
        assert!(report.synced.is_empty());
        assert_eq!(report.not_attempted, vec!["2"]);
    }

    #[tokio::test]
    async fn test_document_includes_attendance() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ledger
            .set_status("1", date, "1", AttendanceStatus::Present)
            .await;

        let engine = SyncEngine::new(ledger, FakeRemote::default(), WriteMode::Merge);
        engine.sync_all(&classes(&["1"])).await;

        let writes = engine.remote.writes.lock().await;
        let (_, id, fields, mode) = &writes[0];
        assert_eq!(id, "1");
        assert_eq!(*mode, WriteMode::Merge);
        assert_eq!(fields["id"], "1");
        assert_eq!(fields["name"], "Class 1");
        assert_eq!(fields["students"][0]["rollNumber"], "1");
        assert_eq!(fields["dailyAttendance"]["2024-01-01"]["1"], "Present");
    }

    #[tokio::test]
    async fn test_empty_class_list() {
        let engine = SyncEngine::new(
            AttendanceLedger::new(LocalStore::in_memory()),
            FakeRemote::default(),
            WriteMode::Replace,
        );
        let report = engine.sync_all(&[]).await;
        assert!(report.is_success());
        assert!(report.synced.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_attendance_is_not_pushed() {
        let backend = FaultyBackend::default()
            .seeded("attendance-1", serde_json::json!("corrupt"))
            .await;
        let engine = SyncEngine::new(
            AttendanceLedger::new(LocalStore::new(backend)),
            FakeRemote::default(),
            WriteMode::Replace,
        );

        let report = engine.sync_all(&classes(&["1", "2"])).await;

        let failure = report.failed.as_ref().unwrap();
        assert_eq!(failure.class_id, "1");
        assert!(matches!(failure.error, RemoteError::Encode(_)));
        assert_eq!(report.not_attempted, vec!["2"]);
        assert!(engine.remote.writes.lock().await.is_empty());
    }
}
