use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::status::AttendanceStatus;

/// Statuses recorded for one date, keyed by roll number.
pub type DateEntries = BTreeMap<String, AttendanceStatus>;

/// Everything recorded for one class, keyed by date.
///
/// Serialises as `{"YYYY-MM-DD": {"<rollNumber>": "Present"}}`.
pub type AttendanceBlob = BTreeMap<NaiveDate, DateEntries>;

/// Present/absent/skipped counts for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub present: usize,
    pub absent: usize,
    pub skipped: usize,
}

impl DailyStats {
    pub fn from_entries(entries: &DateEntries) -> Self {
        let mut stats = Self::default();
        for status in entries.values() {
            match status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Skipped => stats.skipped += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.present + self.absent + self.skipped
    }
}

impl fmt::Display for DailyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "present {}, absent {}, skipped {}",
            self.present, self.absent, self.skipped
        )
    }
}
