//! Roster import from delimited text.

pub mod csv;
mod import;

pub use import::{
    import_students, import_students_into, ImportError, ImportOutcome, SkipReason, SkippedRow,
};
