//! Class and roster persistence on top of the local store.
//!
//! Classes live as an ordered list under the `classes` key with their
//! students embedded. Older data may keep a roster under `class-<id>`
//! instead; it is read when the embedded list is empty.
//!
//! List elements that do not decode as a class are skipped on read and
//! written back unchanged. If the list itself cannot be read, mutations fail
//! instead of overwriting it.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::ledger::AttendanceLedger;
use crate::models::{Class, Student, ValidationError};
use crate::roster::{import_students_into, ImportError, ImportOutcome};
use crate::store::{roster_key, Fetched, LocalStore, CLASSES_KEY};

#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    #[error("Class not found: {0}")]
    NotFound(String),
    #[error("Class name cannot be empty")]
    EmptyName,
    #[error("Student not found: {0}")]
    StudentNotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Stored classes could not be read")]
    LoadFailed,
    #[error("Failed to save classes")]
    SaveFailed,
    #[error("Failed to remove stored data for class {0}")]
    RemoveFailed(String),
}

/// One element of the stored class list.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum StoredClass {
    Class(Class),
    /// Kept verbatim so a save does not drop it.
    Unreadable(Value),
}

impl StoredClass {
    fn decode(position: usize, raw: Value) -> Self {
        match serde_json::from_value(raw.clone()) {
            Ok(class) => StoredClass::Class(class),
            Err(e) => {
                tracing::warn!("Ignoring unreadable class at position {}: {}", position, e);
                StoredClass::Unreadable(raw)
            }
        }
    }

    fn as_class(&self) -> Option<&Class> {
        match self {
            StoredClass::Class(class) => Some(class),
            StoredClass::Unreadable(_) => None,
        }
    }

    fn as_class_mut(&mut self) -> Option<&mut Class> {
        match self {
            StoredClass::Class(class) => Some(class),
            StoredClass::Unreadable(_) => None,
        }
    }
}

pub struct ClassRepository {
    store: LocalStore,
}

impl ClassRepository {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// All readable classes in creation order, rosters resolved.
    pub async fn list(&self) -> Vec<Class> {
        let mut classes = self.load_all().await;
        for class in &mut classes {
            if class.students.is_empty() {
                class.students = self.legacy_roster(&class.id).await.unwrap_or_default();
            }
        }
        classes
    }

    pub async fn get(&self, id: &str) -> Option<Class> {
        let mut class = self.load_all().await.into_iter().find(|c| c.id == id)?;
        if class.students.is_empty() {
            class.students = self.legacy_roster(id).await.unwrap_or_default();
        }
        Some(class)
    }

    /// Finds a class by id, falling back to a case-insensitive name match.
    pub async fn find(&self, identifier: &str) -> Option<Class> {
        if let Some(class) = self.get(identifier).await {
            return Some(class);
        }
        let wanted = identifier.to_lowercase();
        let id = self
            .load_all()
            .await
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted)?
            .id;
        self.get(&id).await
    }

    pub async fn roster(&self, id: &str) -> Result<Vec<Student>, ClassError> {
        self.get(id)
            .await
            .map(|c| c.students)
            .ok_or_else(|| ClassError::NotFound(id.to_string()))
    }

    /// Creates a class. The roster may come from an initial CSV import.
    pub async fn create(&self, name: &str, students: Vec<Student>) -> Result<Class, ClassError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClassError::EmptyName);
        }

        let mut entries = self.load_entries().await?;
        let mut id = Utc::now().timestamp_millis();
        while entries
            .iter()
            .filter_map(StoredClass::as_class)
            .any(|c| c.id == id.to_string())
        {
            id += 1;
        }

        let class = Class::with_id(id.to_string(), name).with_students(students);
        entries.push(StoredClass::Class(class.clone()));
        self.save_entries(&entries).await?;

        tracing::info!("Created class {} ({})", class.name, class.id);
        Ok(class)
    }

    /// Creates a class whose roster is the imported CSV content.
    pub async fn create_from_csv(
        &self,
        name: &str,
        content: &str,
    ) -> Result<(Class, ImportOutcome), ClassError> {
        let outcome = import_students_into(content, &[])?;
        let class = self.create(name, outcome.students.clone()).await?;
        Ok((class, outcome))
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<Class, ClassError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClassError::EmptyName);
        }
        self.modify(id, |class| {
            class.name = name.to_string();
            Ok(())
        })
        .await
    }

    /// Deletes a class together with its legacy roster and attendance blob.
    ///
    /// Attendance is removed first; if that fails the class is left in place.
    pub async fn delete(&self, id: &str) -> Result<Class, ClassError> {
        let mut entries = self.load_entries().await?;
        let removed = entries
            .iter()
            .filter_map(StoredClass::as_class)
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ClassError::NotFound(id.to_string()))?;

        if !AttendanceLedger::new(self.store.clone())
            .discard_class(id)
            .await
        {
            return Err(ClassError::RemoveFailed(id.to_string()));
        }

        entries.retain(|e| e.as_class().map_or(true, |c| c.id != id));
        self.save_entries(&entries).await?;

        if !self.store.remove(&roster_key(id)).await {
            tracing::warn!("Class {} deleted but its legacy roster was left behind", id);
        }

        tracing::info!("Deleted class {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub async fn add_student(&self, id: &str, student: Student) -> Result<Class, ClassError> {
        let student = student.trimmed();
        student.validate_entry()?;
        self.modify(id, |class| {
            if class.has_student(&student.roll_number) {
                return Err(ValidationError::DuplicateRollNumber(student.roll_number.clone()).into());
            }
            class.students.push(student.clone());
            Ok(())
        })
        .await
    }

    /// Replaces the student identified by `roll_number`, which may itself change.
    pub async fn update_student(
        &self,
        id: &str,
        roll_number: &str,
        student: Student,
    ) -> Result<Class, ClassError> {
        let student = student.trimmed();
        student.validate_entry()?;
        self.modify(id, |class| {
            let pos = class
                .students
                .iter()
                .position(|s| s.roll_number == roll_number)
                .ok_or_else(|| ClassError::StudentNotFound(roll_number.to_string()))?;
            if student.roll_number != roll_number && class.has_student(&student.roll_number) {
                return Err(ValidationError::DuplicateRollNumber(student.roll_number.clone()).into());
            }
            class.students[pos] = student.clone();
            Ok(())
        })
        .await
    }

    /// Removes a student. Their recorded attendance is left in place.
    pub async fn remove_student(&self, id: &str, roll_number: &str) -> Result<Class, ClassError> {
        self.modify(id, |class| {
            let before = class.students.len();
            class.students.retain(|s| s.roll_number != roll_number);
            if class.students.len() == before {
                return Err(ClassError::StudentNotFound(roll_number.to_string()));
            }
            Ok(())
        })
        .await
    }

    /// Appends imported students to the existing roster.
    pub async fn import_students(
        &self,
        id: &str,
        content: &str,
    ) -> Result<(Class, ImportOutcome), ClassError> {
        let current = self.roster(id).await?;
        let outcome = import_students_into(content, &current)?;
        let students = outcome.students.clone();
        let class = self
            .modify(id, |class| {
                class.students.extend(students.iter().cloned());
                Ok(())
            })
            .await?;
        Ok((class, outcome))
    }

    async fn modify<F>(&self, id: &str, change: F) -> Result<Class, ClassError>
    where
        F: FnOnce(&mut Class) -> Result<(), ClassError>,
    {
        let mut entries = self.load_entries().await?;
        let class = entries
            .iter_mut()
            .filter_map(StoredClass::as_class_mut)
            .find(|c| c.id == id)
            .ok_or_else(|| ClassError::NotFound(id.to_string()))?;

        let migrating = class.students.is_empty();
        if migrating {
            class.students = self.legacy_roster(id).await?;
        }

        change(class)?;
        let updated = class.clone();
        self.save_entries(&entries).await?;

        // roster now lives in the class entry
        if migrating && !self.store.remove(&roster_key(id)).await {
            tracing::warn!("Failed to remove legacy roster of class {}", id);
        }
        Ok(updated)
    }

    /// Readable classes only; empty when the list cannot be read.
    async fn load_all(&self) -> Vec<Class> {
        self.load_entries()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry {
                StoredClass::Class(class) => Some(class),
                StoredClass::Unreadable(_) => None,
            })
            .collect()
    }

    async fn load_entries(&self) -> Result<Vec<StoredClass>, ClassError> {
        match self.store.fetch::<Vec<Value>>(CLASSES_KEY).await {
            Fetched::Missing => Ok(Vec::new()),
            Fetched::Found(raw) => Ok(raw
                .into_iter()
                .enumerate()
                .map(|(position, value)| StoredClass::decode(position, value))
                .collect()),
            Fetched::Failed => Err(ClassError::LoadFailed),
        }
    }

    async fn save_entries(&self, entries: &[StoredClass]) -> Result<(), ClassError> {
        if self.store.set(CLASSES_KEY, entries).await {
            Ok(())
        } else {
            Err(ClassError::SaveFailed)
        }
    }

    /// Roster kept under the legacy key. An unreadable roster is an error so
    /// that migration never replaces it with an empty one.
    async fn legacy_roster(&self, id: &str) -> Result<Vec<Student>, ClassError> {
        match self.store.fetch(&roster_key(id)).await {
            Fetched::Missing => Ok(Vec::new()),
            Fetched::Found(students) => Ok(students),
            Fetched::Failed => Err(ClassError::LoadFailed),
        }
    }
}
