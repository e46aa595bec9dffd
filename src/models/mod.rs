mod attendance;
mod class;
mod status;
mod student;

pub use attendance::{AttendanceBlob, DailyStats, DateEntries};
pub use class::{Class, RosterOrder};
pub use status::AttendanceStatus;
pub use student::{Student, ValidationError};
