use chrono::NaiveDate;

use super::{AttendanceLedger, LedgerError};
use crate::models::{AttendanceStatus, Class, DailyStats, DateEntries, RosterOrder, Student};

/// Cursor movement through the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Result of [`AttendanceSession::auto_save_if_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSave {
    /// Every student has a status and the date was written.
    Saved,
    /// Some students are still unmarked; nothing was written.
    Incomplete,
    /// Every student has a status but the write failed.
    Failed,
}

/// Working copy of one class's attendance for one date.
///
/// The session is owned by the caller. Status changes stay in memory until
/// [`commit`](Self::commit) or a successful
/// [`auto_save_if_complete`](Self::auto_save_if_complete).
#[derive(Debug, Clone)]
pub struct AttendanceSession {
    class_id: String,
    date: NaiveDate,
    roster: Vec<Student>,
    entries: DateEntries,
    cursor: usize,
    dirty: bool,
}

impl AttendanceSession {
    /// Starts a session seeded with `entries` (usually what is already stored).
    pub fn new(class: &Class, date: NaiveDate, order: RosterOrder, entries: DateEntries) -> Self {
        Self {
            class_id: class.id.clone(),
            date,
            roster: class.ordered_roster(order),
            entries,
            cursor: 0,
            dirty: false,
        }
    }

    /// Starts a session from the entries persisted for `class` on `date`.
    pub async fn open(
        ledger: &AttendanceLedger,
        class: &Class,
        date: NaiveDate,
        order: RosterOrder,
    ) -> Self {
        let entries = ledger.get_entries_for_date(&class.id, date).await;
        Self::new(class, date, order, entries)
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn has_students(&self) -> bool {
        !self.roster.is_empty()
    }

    /// True when there are changes not yet written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current entries for the date, including any not yet saved.
    pub fn entries(&self) -> &DateEntries {
        &self.entries
    }

    pub fn status_of(&self, roll_number: &str) -> Option<AttendanceStatus> {
        self.entries.get(roll_number).copied()
    }

    /// Sets a student's status, replacing any earlier one for this date.
    pub fn set_status(
        &mut self,
        roll_number: &str,
        status: AttendanceStatus,
    ) -> Result<(), LedgerError> {
        if self.roster.is_empty() {
            return Err(LedgerError::NoStudents);
        }
        if !self.roster.iter().any(|s| s.roll_number == roll_number) {
            return Err(LedgerError::UnknownStudent(roll_number.to_string()));
        }
        if self.entries.insert(roll_number.to_string(), status) != Some(status) {
            self.dirty = true;
        }
        Ok(())
    }

    /// Marks the student under the cursor, then advances.
    pub fn mark_current(&mut self, status: AttendanceStatus) -> Result<&Student, LedgerError> {
        let idx = self.cursor;
        let roll_number = self
            .current_student()
            .map(|s| s.roll_number.clone())
            .ok_or(LedgerError::NoStudents)?;
        self.set_status(&roll_number, status)?;
        self.advance_cursor(Direction::Next);
        Ok(&self.roster[idx])
    }

    /// Flips Present and Absent; any other status becomes Present.
    pub fn toggle(&mut self, roll_number: &str) -> Result<AttendanceStatus, LedgerError> {
        let status = AttendanceStatus::toggled(self.status_of(roll_number));
        self.set_status(roll_number, status)?;
        Ok(status)
    }

    /// Moves the cursor one step, clamped to the roster bounds.
    pub fn advance_cursor(&mut self, direction: Direction) -> usize {
        let last = self.roster.len().saturating_sub(1);
        self.cursor = match direction {
            Direction::Next => (self.cursor + 1).min(last),
            Direction::Previous => self.cursor.saturating_sub(1),
        };
        self.cursor
    }

    /// Moves the cursor to a student. Returns false if they are not on the roster.
    pub fn jump_to(&mut self, roll_number: &str) -> bool {
        match self.roster.iter().position(|s| s.roll_number == roll_number) {
            Some(idx) => {
                self.cursor = idx;
                true
            }
            None => false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_student(&self) -> Option<&Student> {
        self.roster.get(self.cursor)
    }

    /// Fraction of the roster up to and including the cursor.
    pub fn progress(&self) -> f64 {
        if self.roster.is_empty() {
            return 0.0;
        }
        (self.cursor + 1) as f64 / self.roster.len() as f64
    }

    /// True when every student on the roster has a status.
    pub fn is_complete(&self) -> bool {
        self.has_students()
            && self
                .roster
                .iter()
                .all(|s| self.entries.contains_key(&s.roll_number))
    }

    pub fn skipped_students(&self) -> Vec<&Student> {
        self.roster
            .iter()
            .filter(|s| self.status_of(&s.roll_number) == Some(AttendanceStatus::Skipped))
            .collect()
    }

    pub fn unmarked_students(&self) -> Vec<&Student> {
        self.roster
            .iter()
            .filter(|s| !self.entries.contains_key(&s.roll_number))
            .collect()
    }

    pub fn stats(&self) -> DailyStats {
        DailyStats::from_entries(&self.entries)
    }

    /// Persists the date once every student has a status.
    pub async fn auto_save_if_complete(&mut self, ledger: &AttendanceLedger) -> AutoSave {
        if !self.is_complete() {
            return AutoSave::Incomplete;
        }
        if self.commit(ledger).await {
            AutoSave::Saved
        } else {
            AutoSave::Failed
        }
    }

    /// Writes the date's entries regardless of completion.
    pub async fn commit(&mut self, ledger: &AttendanceLedger) -> bool {
        let saved = ledger
            .persist_date(&self.class_id, self.date, &self.entries)
            .await;
        if saved {
            self.dirty = false;
        }
        saved
    }
}
