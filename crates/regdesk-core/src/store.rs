//! Persistence seam for student records.
//!
//! [`StudentStore`] is what the service layer needs from a document
//! database. [`MemoryStudentStore`] keeps everything in process and is what
//! the web binary and the tests run against.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::access::Department;
use crate::error::{CoreError, CoreResult};
use crate::student::{Lookup, StudentRecord, Transition};

/// Storage operations for student records.
///
/// Implementations must apply a [`Transition`] atomically with respect to
/// other calls touching the same record.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// Returns [`CoreError::Conflict`] if the student id or email is taken.
    async fn insert(&self, record: StudentRecord) -> CoreResult<StudentRecord>;

    async fn find(&self, lookup: &Lookup) -> CoreResult<Option<StudentRecord>>;

    /// Applies `transition` to the record with `student_id` and returns the result.
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id and
    /// [`CoreError::Conflict`] if a captured application number belongs to
    /// another record.
    async fn apply(&self, student_id: &str, transition: Transition) -> CoreResult<StudentRecord>;

    /// All records of `department`, newest first.
    async fn list_by_department(&self, department: Department) -> CoreResult<Vec<StudentRecord>>;
}

#[derive(Default)]
struct Tables {
    records: HashMap<String, StudentRecord>,
    by_email: HashMap<String, String>,
    by_application: HashMap<String, String>,
}

/// An in-process [`StudentStore`] guarded by a single `RwLock`.
#[derive(Default)]
pub struct MemoryStudentStore {
    tables: RwLock<Tables>,
}

impl MemoryStudentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn insert(&self, record: StudentRecord) -> CoreResult<StudentRecord> {
        let mut tables = self.tables.write().await;
        if tables.records.contains_key(&record.student_id) {
            return Err(CoreError::Conflict(format!(
                "student id {} already exists",
                record.student_id
            )));
        }
        if tables.by_email.contains_key(&record.email) {
            return Err(CoreError::Conflict(
                "a student with this email already exists".to_string(),
            ));
        }
        tables
            .by_email
            .insert(record.email.clone(), record.student_id.clone());
        tables
            .records
            .insert(record.student_id.clone(), record.clone());
        Ok(record)
    }

    async fn find(&self, lookup: &Lookup) -> CoreResult<Option<StudentRecord>> {
        let tables = self.tables.read().await;
        let id = match lookup {
            Lookup::StudentId(id) => Some(id),
            Lookup::Email(email) => tables.by_email.get(email),
            Lookup::ApplicationNumber(no) => tables.by_application.get(no),
            Lookup::Phone(_) => {
                return Ok(tables.records.values().find(|r| r.matches(lookup)).cloned());
            }
        };
        Ok(id.and_then(|id| tables.records.get(id)).cloned())
    }

    async fn apply(&self, student_id: &str, transition: Transition) -> CoreResult<StudentRecord> {
        let mut tables = self.tables.write().await;

        if let Transition::PhotoCaptured {
            application_number, ..
        } = &transition
        {
            if let Some(owner) = tables.by_application.get(application_number) {
                if owner != student_id {
                    return Err(CoreError::Conflict(format!(
                        "application number {application_number} already assigned"
                    )));
                }
            }
        }

        let record = tables
            .records
            .get_mut(student_id)
            .ok_or_else(|| CoreError::not_found(format!("student {student_id} not found")))?;
        let previous_application = record.application_number.clone();
        transition.apply_to(record, Utc::now())?;
        let updated = record.clone();

        if updated.application_number != previous_application {
            if let Some(old) = previous_application {
                tables.by_application.remove(&old);
            }
            if let Some(new) = &updated.application_number {
                tables
                    .by_application
                    .insert(new.clone(), updated.student_id.clone());
            }
        }
        Ok(updated)
    }

    async fn list_by_department(&self, department: Department) -> CoreResult<Vec<StudentRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<StudentRecord> = tables
            .records
            .values()
            .filter(|r| r.department == department)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
