//! Student operations exposed to the transport layer.

use std::sync::Arc;

use chrono::Utc;

use crate::access::{Department, Scope};
use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, CoreResult};
use crate::store::StudentStore;
use crate::student::ids::{self, MAX_ID_ATTEMPTS};
use crate::student::{DocumentCheck, Lookup, NewStudent, StudentRecord, Transition};

/// Registration, photo capture, document review and status lookup.
#[derive(Clone)]
pub struct Students {
    store: Arc<dyn StudentStore>,
    clock: Arc<dyn Clock>,
}

impl Students {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn StudentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validates `input` and creates a `pending` record with a fresh student id.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] for missing or malformed fields.
    /// - [`CoreError::Conflict`] if the email is already registered.
    pub async fn register(&self, input: NewStudent) -> CoreResult<StudentRecord> {
        let registration = input.validate()?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let now = Utc::now();
            let record = StudentRecord::new(ids::student_id(now), registration.clone(), now);
            let student_id = record.student_id.clone();

            match self.store.insert(record).await {
                Ok(created) => {
                    tracing::info!(
                        student_id = %created.student_id,
                        department = %created.department,
                        "student registered"
                    );
                    return Ok(created);
                }
                Err(CoreError::Conflict(msg)) => {
                    // Only a clash on the generated id is retried.
                    let id_taken = self
                        .store
                        .find(&Lookup::StudentId(student_id.clone()))
                        .await?
                        .is_some();
                    if !id_taken {
                        return Err(CoreError::Conflict(msg));
                    }
                    tracing::debug!(
                        attempt,
                        student_id = %student_id,
                        "generated student id taken, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Storage(
            "could not allocate a unique student id".to_string(),
        ))
    }

    /// Attaches `photo_ref` and a new application number; status becomes `photo_taken`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has `student_id`.
    pub async fn attach_photo(
        &self,
        student_id: &str,
        photo_ref: String,
    ) -> CoreResult<StudentRecord> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let application_number = ids::application_number(self.clock.now_millis());
            let transition = Transition::PhotoCaptured {
                photo_ref: photo_ref.clone(),
                application_number,
            };
            match self.store.apply(student_id, transition).await {
                Ok(record) => {
                    tracing::info!(
                        student_id,
                        application_number =
                            record.application_number.as_deref().unwrap_or_default(),
                        "photo captured"
                    );
                    return Ok(record);
                }
                Err(CoreError::Conflict(msg)) => {
                    tracing::debug!(attempt, student_id, "{msg}, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Storage(
            "could not allocate a unique application number".to_string(),
        ))
    }

    /// Replaces the checklist verification flags of `student_id`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record has `student_id`.
    /// - [`CoreError::Forbidden`] if `scope` does not cover the record's department.
    /// - [`CoreError::Validation`] if `documents` does not match the checklist.
    pub async fn update_documents(
        &self,
        scope: Scope,
        student_id: &str,
        documents: Vec<DocumentCheck>,
    ) -> CoreResult<StudentRecord> {
        let current = self.find(&Lookup::StudentId(student_id.to_owned())).await?;
        scope.require(current.department)?;

        let record = self
            .store
            .apply(student_id, Transition::DocumentsReviewed { documents })
            .await?;
        tracing::info!(student_id, status = %record.status, "documents reviewed");
        Ok(record)
    }

    /// Looks a record up by any of its unique fields.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if nothing matches.
    pub async fn get_status(&self, lookup: &Lookup) -> CoreResult<StudentRecord> {
        self.find(lookup).await
    }

    /// All students of `department`, newest first.
    ///
    /// # Errors
    ///
    /// [`CoreError::Forbidden`] if `scope` does not cover `department`.
    pub async fn list_department(
        &self,
        scope: Scope,
        department: Department,
    ) -> CoreResult<Vec<StudentRecord>> {
        scope.require(department)?;
        self.store.list_by_department(department).await
    }

    async fn find(&self, lookup: &Lookup) -> CoreResult<StudentRecord> {
        self.store.find(lookup).await?.ok_or_else(|| {
            CoreError::not_found("no registration found with the provided information")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStudentStore;
    use crate::student::registration::sample;
    use crate::student::{default_checklist, Status};

    fn students() -> Students {
        Students::new(Arc::new(MemoryStudentStore::new()))
    }

    fn checklist(verified: [bool; 5]) -> Vec<DocumentCheck> {
        default_checklist()
            .into_iter()
            .zip(verified)
            .map(|(d, v)| DocumentCheck { verified: v, ..d })
            .collect()
    }

    #[tokio::test]
    async fn register_creates_pending_record_with_default_checklist() {
        let svc = students();
        let rec = svc.register(sample("asha@example.com")).await.unwrap();
        assert_eq!(rec.department, Department::ComputerScience);
        assert_eq!(rec.status, Status::Pending);
        assert_eq!(rec.documents, default_checklist());
        assert!(rec.photo_ref.is_none());
        assert!(rec.application_number.is_none());
        assert_eq!(rec.student_id.len(), 10);
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let svc = students();
        svc.register(sample("asha@example.com")).await.unwrap();
        assert!(matches!(
            svc.register(sample("asha@example.com")).await,
            Err(CoreError::Conflict(_))
        ));
        assert!(svc.register(sample("other@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn register_invalid_input_is_validation_error() {
        let mut input = sample("asha@example.com");
        input.name.clear();
        assert!(matches!(
            students().register(input).await,
            Err(CoreError::Validation(msg)) if msg == "name is required"
        ));
    }

    #[tokio::test]
    async fn attach_photo_twice_gives_new_application_numbers() {
        let clock = Arc::new(crate::clock::ManualClock::new(1_718_000_000_000));
        let svc = Students::with_clock(Arc::new(MemoryStudentStore::new()), clock.clone());
        let rec = svc.register(sample("asha@example.com")).await.unwrap();

        let first = svc.attach_photo(&rec.student_id, "ref-1".to_string()).await.unwrap();
        clock.advance(std::time::Duration::from_millis(1));
        let second = svc.attach_photo(&rec.student_id, "ref-2".to_string()).await.unwrap();

        assert_eq!(second.status, Status::PhotoTaken);
        assert_eq!(second.photo_ref.as_deref(), Some("ref-2"));
        let (a, b) = (first.application_number.unwrap(), second.application_number.unwrap());
        assert!(a.starts_with("APP") && b.starts_with("APP"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn attach_photo_unknown_student_is_not_found() {
        assert!(matches!(
            students().attach_photo("2025000000", "ref".to_string()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_documents_drives_status() {
        let svc = students();
        let rec = svc.register(sample("asha@example.com")).await.unwrap();
        svc.attach_photo(&rec.student_id, "ref".to_string()).await.unwrap();
        let scope = Scope::Department(Department::ComputerScience);

        let mixed = svc
            .update_documents(scope, &rec.student_id, checklist([true, false, true, true, true]))
            .await
            .unwrap();
        assert_eq!(mixed.status, Status::PhotoTaken);

        let full = svc
            .update_documents(scope, &rec.student_id, checklist([true; 5]))
            .await
            .unwrap();
        assert_eq!(full.status, Status::DocumentsVerified);
    }

    #[tokio::test]
    async fn update_documents_checks_department_scope() {
        let svc = students();
        let rec = svc.register(sample("asha@example.com")).await.unwrap();
        let err = svc
            .update_documents(
                Scope::Department(Department::Civil),
                &rec.student_id,
                checklist([true; 5]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let ok = svc
            .update_documents(Scope::Unrestricted, &rec.student_id, checklist([true; 5]))
            .await
            .unwrap();
        assert_eq!(ok.status, Status::DocumentsVerified);
    }

    #[tokio::test]
    async fn update_documents_unknown_student_is_not_found() {
        assert!(matches!(
            students()
                .update_documents(Scope::Unrestricted, "missing", checklist([true; 5]))
                .await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_status_by_email_and_unknown() {
        let svc = students();
        let rec = svc.register(sample("asha@example.com")).await.unwrap();
        let found = svc
            .get_status(&Lookup::Email("asha@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(found.student_id, rec.student_id);
        assert!(matches!(
            svc.get_status(&Lookup::Email("nobody@example.com".to_string())).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_department_respects_scope() {
        let svc = students();
        svc.register(sample("asha@example.com")).await.unwrap();
        let listed = svc
            .list_department(Scope::Unrestricted, Department::ComputerScience)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(svc
            .list_department(Scope::Department(Department::Civil), Department::ComputerScience)
            .await
            .is_err());
    }
}
