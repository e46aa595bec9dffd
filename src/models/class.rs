use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::student::Student;

/// A class and its ordered roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub students: Vec<Student>,
}

/// Traversal order used when taking attendance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterOrder {
    /// Order in which students were added or imported.
    #[default]
    Roster,
    /// Alphabetical by student name.
    Name,
}

impl Class {
    /// Creates a class with a time-based id (epoch milliseconds).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Utc::now().timestamp_millis().to_string(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            students: Vec::new(),
        }
    }

    pub fn with_students(mut self, students: Vec<Student>) -> Self {
        self.students = students;
        self
    }

    pub fn has_student(&self, roll_number: &str) -> bool {
        self.students.iter().any(|s| s.roll_number == roll_number)
    }

    pub fn student(&self, roll_number: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.roll_number == roll_number)
    }

    /// Returns the roster in the requested traversal order.
    pub fn ordered_roster(&self, order: RosterOrder) -> Vec<Student> {
        let mut roster = self.students.clone();
        if order == RosterOrder::Name {
            // stable, so equal names keep roster order
            roster.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        roster
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;

        if self.students.is_empty() {
            writeln!(f, "\nNo students")?;
        } else {
            writeln!(f, "\nStudents ({}):", self.students.len())?;
            for student in &self.students {
                writeln!(f, "  - {}", student)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for RosterOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterOrder::Roster => write!(f, "roster"),
            RosterOrder::Name => write!(f, "name"),
        }
    }
}

impl FromStr for RosterOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roster" => Ok(RosterOrder::Roster),
            "name" => Ok(RosterOrder::Name),
            _ => Err(format!(
                "Invalid roster order '{}'. Valid options: roster, name",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Class {
        Class::with_id("1", "Math").with_students(vec![
            Student::new("Zoe", "1", ""),
            Student::new("adam", "2", ""),
            Student::new("Mia", "3", ""),
        ])
    }

    #[test]
    fn test_new_uses_time_based_id() {
        let class = Class::new("History");
        assert!(class.id.parse::<i64>().unwrap() > 0);
        assert!(class.students.is_empty());
    }

    #[test]
    fn test_ordered_roster() {
        let class = sample();

        let roster: Vec<_> = class
            .ordered_roster(RosterOrder::Roster)
            .into_iter()
            .map(|s| s.roll_number)
            .collect();
        assert_eq!(roster, vec!["1", "2", "3"]);

        let by_name: Vec<_> = class
            .ordered_roster(RosterOrder::Name)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(by_name, vec!["adam", "Mia", "Zoe"]);
    }

    #[test]
    fn test_student_lookup() {
        let class = sample();
        assert!(class.has_student("2"));
        assert!(!class.has_student("9"));
        assert_eq!(class.student("3").unwrap().name, "Mia");
    }

    #[test]
    fn test_roster_order_from_str() {
        assert_eq!(RosterOrder::from_str("NAME").unwrap(), RosterOrder::Name);
        assert_eq!(
            RosterOrder::from_str("roster").unwrap(),
            RosterOrder::Roster
        );
        assert!(RosterOrder::from_str("alpha").is_err());
    }

    #[test]
    fn test_class_json_roundtrip() {
        let class = sample();
        let json = serde_json::to_string(&class).unwrap();
        assert!(json.contains("\"rollNumber\":\"1\""));

        let parsed: Class = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, class);
    }
}
