//! Attendance ledger: per-class, per-date status maps and their persistence.
//!
//! All attendance for a class lives in a single blob under
//! `attendance-<classId>`. Writes are read-modify-write cycles that replace
//! one date key at a time; they are not atomic, so only one editor may be
//! active per class and date.
//!
//! Writes go through the untyped JSON so that entries this version cannot
//! decode are written back untouched. A blob that cannot be read, or that is
//! not a JSON object, is never overwritten.

mod session;

pub use session::{AttendanceSession, AutoSave, Direction};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{AttendanceBlob, AttendanceStatus, DailyStats, DateEntries};
use crate::store::{attendance_key, Fetched, LocalStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("No students in this class")]
    NoStudents,
    #[error("Student '{0}' is not on the roster")]
    UnknownStudent(String),
}

#[derive(Clone, Debug)]
pub struct AttendanceLedger {
    store: LocalStore,
}

impl AttendanceLedger {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Everything recorded for a class; empty when nothing is stored or the
    /// stored blob is unusable.
    pub async fn load_blob(&self, class_id: &str) -> AttendanceBlob {
        self.read_blob(class_id).await.unwrap_or_default()
    }

    /// Like [`load_blob`](Self::load_blob), but `None` when the stored value
    /// exists and cannot be used at all. Invalid dates and statuses are
    /// skipped one entry at a time.
    pub async fn read_blob(&self, class_id: &str) -> Option<AttendanceBlob> {
        let raw = self.read_raw(class_id).await?;
        Some(decode_blob(class_id, raw))
    }

    /// The stored blob as untyped JSON. `None` means it must not be
    /// overwritten.
    async fn read_raw(&self, class_id: &str) -> Option<Map<String, Value>> {
        match self.store.fetch::<Value>(&attendance_key(class_id)).await {
            Fetched::Missing => Some(Map::new()),
            Fetched::Found(Value::Object(raw)) => Some(raw),
            Fetched::Found(other) => {
                tracing::error!(
                    "Attendance for class {} is not an object: {}",
                    class_id,
                    other
                );
                None
            }
            Fetched::Failed => None,
        }
    }

    pub async fn get_entries_for_date(&self, class_id: &str, date: NaiveDate) -> DateEntries {
        self.load_blob(class_id)
            .await
            .remove(&date)
            .unwrap_or_default()
    }

    /// Replaces the entries stored for `date`, keeping every other date.
    ///
    /// Returns `false` without writing when the stored blob is unreadable.
    pub async fn persist_date(&self, class_id: &str, date: NaiveDate, entries: &DateEntries) -> bool {
        let Some(mut raw) = self.read_raw(class_id).await else {
            tracing::error!(
                "Not saving attendance for class {} on {}: stored data is unreadable",
                class_id,
                date
            );
            return false;
        };
        let Some(value) = encode(entries) else {
            return false;
        };
        raw.insert(date.to_string(), value);
        let saved = self.store.set(&attendance_key(class_id), &raw).await;
        if saved {
            tracing::debug!(
                "Saved {} entr(ies) for class {} on {}",
                entries.len(),
                class_id,
                date
            );
        }
        saved
    }

    /// Upserts a single student's status directly in storage.
    pub async fn set_status(
        &self,
        class_id: &str,
        date: NaiveDate,
        roll_number: &str,
        status: AttendanceStatus,
    ) -> bool {
        let Some(mut raw) = self.read_raw(class_id).await else {
            tracing::error!(
                "Not saving status of {} for class {} on {}: stored data is unreadable",
                roll_number,
                class_id,
                date
            );
            return false;
        };
        let Some(value) = encode(&status) else {
            return false;
        };
        let day = raw
            .entry(date.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !day.is_object() {
            tracing::warn!(
                "Replacing malformed attendance for class {} on {}: {}",
                class_id,
                date,
                day
            );
            *day = Value::Object(Map::new());
        }
        if let Value::Object(day) = day {
            day.insert(roll_number.to_string(), value);
        }
        self.store.set(&attendance_key(class_id), &raw).await
    }

    /// Dates with a stored record, oldest first.
    pub async fn recorded_dates(&self, class_id: &str) -> Vec<NaiveDate> {
        self.load_blob(class_id).await.into_keys().collect()
    }

    pub async fn stats_by_date(&self, class_id: &str) -> Vec<(NaiveDate, DailyStats)> {
        self.load_blob(class_id)
            .await
            .iter()
            .map(|(date, entries)| (*date, DailyStats::from_entries(entries)))
            .collect()
    }

    /// Drops all attendance for a class.
    pub async fn discard_class(&self, class_id: &str) -> bool {
        self.store.remove(&attendance_key(class_id)).await
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Error encoding attendance: {}", e);
            None
        }
    }
}

/// Decodes each date and status on its own, dropping the ones that fail.
fn decode_blob(class_id: &str, raw: Map<String, Value>) -> AttendanceBlob {
    let mut blob = AttendanceBlob::new();
    for (key, day) in raw {
        let Ok(date) = key.parse::<NaiveDate>() else {
            tracing::warn!(
                "Ignoring attendance for class {} under invalid date '{}'",
                class_id,
                key
            );
            continue;
        };
        let Value::Object(statuses) = day else {
            tracing::warn!(
                "Ignoring attendance for class {} on {}: not an object",
                class_id,
                date
            );
            continue;
        };
        let entries = blob.entry(date).or_default();
        for (roll_number, status) in statuses {
            match serde_json::from_value::<AttendanceStatus>(status) {
                Ok(status) => {
                    entries.insert(roll_number, status);
                }
                Err(e) => tracing::warn!(
                    "Ignoring status of {} for class {} on {}: {}",
                    roll_number,
                    class_id,
                    date,
                    e
                ),
            }
        }
    }
    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::FaultyBackend;
    use serde_json::json;
    use AttendanceStatus::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn entries(pairs: &[(&str, AttendanceStatus)]) -> DateEntries {
        pairs.iter().map(|(r, s)| (r.to_string(), *s)).collect()
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());
        assert!(ledger.load_blob("1").await.is_empty());
        assert!(ledger.get_entries_for_date("1", date(1)).await.is_empty());
        assert!(ledger.recorded_dates("1").await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_date_overwrites_only_that_date() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());

        ledger
            .persist_date("1", date(1), &entries(&[("1", Present), ("2", Absent)]))
            .await;
        ledger
            .persist_date("1", date(2), &entries(&[("1", Absent)]))
            .await;
        ledger
            .persist_date("1", date(1), &entries(&[("1", Skipped)]))
            .await;

        assert_eq!(
            ledger.get_entries_for_date("1", date(1)).await,
            entries(&[("1", Skipped)])
        );
        assert_eq!(
            ledger.get_entries_for_date("1", date(2)).await,
            entries(&[("1", Absent)])
        );
    }

    #[tokio::test]
    async fn test_classes_are_isolated() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());
        ledger.set_status("a", date(1), "1", Present).await;
        ledger.set_status("b", date(1), "1", Absent).await;

        assert_eq!(
            ledger.get_entries_for_date("a", date(1)).await,
            entries(&[("1", Present)])
        );
        assert_eq!(
            ledger.get_entries_for_date("b", date(1)).await,
            entries(&[("1", Absent)])
        );
    }

    #[tokio::test]
    async fn test_set_status_upserts() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());

        ledger.set_status("1", date(1), "7", Present).await;
        ledger.set_status("1", date(1), "7", Absent).await;
        ledger.set_status("1", date(1), "8", Present).await;

        assert_eq!(
            ledger.get_entries_for_date("1", date(1)).await,
            entries(&[("7", Absent), ("8", Present)])
        );
    }

    #[tokio::test]
    async fn test_set_status_is_idempotent() {
        let once = AttendanceLedger::new(LocalStore::in_memory());
        once.set_status("1", date(1), "7", Skipped).await;

        let twice = AttendanceLedger::new(LocalStore::in_memory());
        twice.set_status("1", date(1), "7", Skipped).await;
        twice.set_status("1", date(1), "7", Skipped).await;

        assert_eq!(once.load_blob("1").await, twice.load_blob("1").await);
    }

    #[tokio::test]
    async fn test_stats_and_dates() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());
        ledger
            .persist_date("1", date(3), &entries(&[("1", Present), ("2", Skipped)]))
            .await;
        ledger
            .persist_date("1", date(1), &entries(&[("1", Absent)]))
            .await;

        assert_eq!(ledger.recorded_dates("1").await, vec![date(1), date(3)]);

        let stats = ledger.stats_by_date("1").await;
        assert_eq!(stats[0].1.absent, 1);
        assert_eq!(stats[1].1.present, 1);
        assert_eq!(stats[1].1.skipped, 1);
    }

    #[tokio::test]
    async fn test_discard_class() {
        let ledger = AttendanceLedger::new(LocalStore::in_memory());
        ledger.set_status("1", date(1), "7", Present).await;
        assert!(ledger.discard_class("1").await);
        assert!(ledger.load_blob("1").await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_do_not_wipe_history() {
        let backend = FaultyBackend::default()
            .seeded(
                "attendance-1",
                json!({
                    "2024-01-01": {"1": "Present", "2": "Absent"},
                    "2024-01-02": {"1": "Late"}
                }),
            )
            .await;
        let store = LocalStore::new(backend);
        let ledger = AttendanceLedger::new(store.clone());

        assert_eq!(
            ledger.get_entries_for_date("1", date(1)).await,
            entries(&[("1", Present), ("2", Absent)])
        );
        assert!(ledger.get_entries_for_date("1", date(2)).await.is_empty());

        assert!(ledger.set_status("1", date(3), "1", Present).await);

        assert_eq!(
            ledger.get_entries_for_date("1", date(1)).await,
            entries(&[("1", Present), ("2", Absent)])
        );
        assert_eq!(
            ledger.get_entries_for_date("1", date(3)).await,
            entries(&[("1", Present)])
        );
        let raw: Value = store.get("attendance-1").await.unwrap();
        assert_eq!(raw["2024-01-02"]["1"], "Late");
    }

    #[tokio::test]
    async fn test_invalid_date_keys_are_kept_verbatim() {
        let backend = FaultyBackend::default()
            .seeded(
                "attendance-1",
                json!({"someday": {"1": "Present"}, "2024-01-01": {"1": "Absent"}}),
            )
            .await;
        let store = LocalStore::new(backend);
        let ledger = AttendanceLedger::new(store.clone());

        assert_eq!(ledger.recorded_dates("1").await, vec![date(1)]);
        assert!(
            ledger
                .persist_date("1", date(2), &entries(&[("1", Skipped)]))
                .await
        );

        let raw: Value = store.get("attendance-1").await.unwrap();
        assert_eq!(raw["someday"]["1"], "Present");
        assert_eq!(raw["2024-01-01"]["1"], "Absent");
        assert_eq!(raw["2024-01-02"]["1"], "Skipped");
    }

    #[tokio::test]
    async fn test_non_object_blob_is_never_overwritten() {
        let backend = FaultyBackend::default()
            .seeded("attendance-1", json!(["not", "a", "map"]))
            .await;
        let store = LocalStore::new(backend);
        let ledger = AttendanceLedger::new(store.clone());

        assert_eq!(ledger.read_blob("1").await, None);
        assert!(ledger.load_blob("1").await.is_empty());
        assert!(!ledger.set_status("1", date(1), "1", Present).await);
        assert!(
            !ledger
                .persist_date("1", date(1), &entries(&[("1", Present)]))
                .await
        );

        let raw: Value = store.get("attendance-1").await.unwrap();
        assert_eq!(raw, json!(["not", "a", "map"]));
    }

    #[tokio::test]
    async fn test_persist_date_reports_write_failure() {
        let ledger = AttendanceLedger::new(LocalStore::new(
            FaultyBackend::default().failing_writes(),
        ));
        assert!(
            !ledger
                .persist_date("1", date(1), &entries(&[("1", Present)]))
                .await
        );
        assert!(!ledger.set_status("1", date(1), "1", Present).await);
    }

    #[tokio::test]
    async fn test_persist_date_skips_write_when_read_fails() {
        let backend = FaultyBackend::default()
            .seeded("attendance-1", json!({"2024-01-01": {"1": "Present"}}))
            .await
            .failing_reads();
        let store = LocalStore::new(backend);
        let ledger = AttendanceLedger::new(store);

        assert_eq!(ledger.read_blob("1").await, None);
        assert!(
            !ledger
                .persist_date("1", date(2), &entries(&[("1", Absent)]))
                .await
        );
    }
}
