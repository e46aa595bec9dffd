use std::collections::HashSet;
use std::fmt;

use super::csv::parse_table;
use crate::models::Student;

pub const ROLL_NUMBER_COLUMN: &str = "rollNumber";
pub const NAME_COLUMN: &str = "name";
pub const EMAIL_COLUMN: &str = "email";

/// Whole-file failures. Nothing from the file is imported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("CSV file is empty or invalid")]
    Empty,
    #[error("CSV header must include a '{0}' column")]
    MissingColumn(&'static str),
    #[error("CSV file is empty or invalid: no valid rows ({skipped} skipped)")]
    NoValidRows { skipped: usize },
}

/// Why a single row was left out of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyRollNumber,
    /// Roll number already seen earlier in the same file.
    DuplicateRollNumber(String),
    /// Roll number already on the class roster being imported into.
    AlreadyEnrolled(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyRollNumber => write!(f, "empty roll number"),
            SkipReason::DuplicateRollNumber(r) => write!(f, "duplicate roll number '{}'", r),
            SkipReason::AlreadyEnrolled(r) => write!(f, "roll number '{}' already enrolled", r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

/// Accepted students in file order plus the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub students: Vec<Student>,
    pub skipped: Vec<SkippedRow>,
}

/// Parses roster CSV content into validated, de-duplicated students.
///
/// Rows with an empty roll number, or a roll number seen earlier in the file,
/// are skipped without failing the batch. The first occurrence wins.
pub fn import_students(content: &str) -> Result<ImportOutcome, ImportError> {
    import_students_into(content, &[])
}

/// Like [`import_students`], but also skips roll numbers already on `existing`.
pub fn import_students_into(
    content: &str,
    existing: &[Student],
) -> Result<ImportOutcome, ImportError> {
    let table = parse_table(content);
    if table.headers.is_empty() || table.rows.is_empty() {
        return Err(ImportError::Empty);
    }
    if !table.has_column(ROLL_NUMBER_COLUMN) {
        return Err(ImportError::MissingColumn(ROLL_NUMBER_COLUMN));
    }

    let enrolled: HashSet<&str> = existing.iter().map(|s| s.roll_number.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut outcome = ImportOutcome::default();

    for row in &table.rows {
        let student = Student::new(
            row.get(NAME_COLUMN).unwrap_or_default(),
            row.get(ROLL_NUMBER_COLUMN).unwrap_or_default(),
            row.get(EMAIL_COLUMN).unwrap_or_default(),
        )
        .trimmed();

        let reason = if student.roll_number.is_empty() {
            Some(SkipReason::EmptyRollNumber)
        } else if seen.contains(&student.roll_number) {
            Some(SkipReason::DuplicateRollNumber(student.roll_number.clone()))
        } else if enrolled.contains(student.roll_number.as_str()) {
            Some(SkipReason::AlreadyEnrolled(student.roll_number.clone()))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                tracing::warn!("Skipping CSV line {}: {}", row.line, reason);
                outcome.skipped.push(SkippedRow {
                    line: row.line,
                    reason,
                });
            }
            None => {
                seen.insert(student.roll_number.clone());
                outcome.students.push(student);
            }
        }
    }

    if outcome.students.is_empty() {
        return Err(ImportError::NoValidRows {
            skipped: outcome.skipped.len(),
        });
    }

    tracing::debug!(
        "Imported {} student(s), skipped {} row(s)",
        outcome.students.len(),
        outcome.skipped.len()
    );

    Ok(outcome)
}
