use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attendance status for one student on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Skipped,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Skipped,
    ];

    /// Present flips to Absent; anything else becomes Present.
    pub fn toggled(current: Option<AttendanceStatus>) -> AttendanceStatus {
        match current {
            Some(AttendanceStatus::Present) => AttendanceStatus::Absent,
            _ => AttendanceStatus::Present,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
            AttendanceStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" | "p" => Ok(AttendanceStatus::Present),
            "absent" | "a" => Ok(AttendanceStatus::Absent),
            "skipped" | "skip" | "s" => Ok(AttendanceStatus::Skipped),
            _ => Err(format!(
                "Invalid status '{}'. Valid options: Present, Absent, Skipped",
                s
            )),
        }
    }
}
