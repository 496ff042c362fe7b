//! Student records and the registration lifecycle.
//!
//! - [`registration`] — raw registration input and its validation.
//! - [`lifecycle`] — the [`Status`] progression and the [`Transition`]s that drive it.
//! - [`ids`] — student id and application number generation.

pub mod ids;
pub mod lifecycle;
pub mod registration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Department;

pub use lifecycle::{Status, Transition};
pub use registration::{NewStudent, Registration};

/// Document names every new student must present, in checklist order.
pub const DEFAULT_DOCUMENTS: [&str; 5] = [
    "10th Marksheet",
    "12th Marksheet",
    "Transfer Certificate",
    "Character Certificate",
    "Caste Certificate (if applicable)",
];

/// One entry of a student's document checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCheck {
    pub name: String,
    #[serde(default)]
    pub verified: bool,
}

impl DocumentCheck {
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verified: false,
        }
    }
}

/// The checklist attached to every record at registration.
#[must_use]
pub fn default_checklist() -> Vec<DocumentCheck> {
    DEFAULT_DOCUMENTS.iter().map(|name| DocumentCheck::pending(*name)).collect()
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: Department,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub dob: NaiveDate,
    pub photo_ref: Option<String>,
    pub application_number: Option<String>,
    pub documents: Vec<DocumentCheck>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    /// Builds the initial `pending` record for a validated registration.
    #[must_use]
    pub fn new(student_id: String, registration: Registration, now: DateTime<Utc>) -> Self {
        Self {
            student_id,
            name: registration.name,
            phone: registration.phone,
            email: registration.email,
            department: registration.department,
            parent_name: registration.parent_name,
            parent_email: registration.parent_email,
            parent_phone: registration.parent_phone,
            dob: registration.dob,
            photo_ref: None,
            application_number: None,
            documents: default_checklist(),
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo_ref.is_some()
    }

    #[must_use]
    pub fn all_documents_verified(&self) -> bool {
        self.documents.iter().all(|d| d.verified)
    }

    #[must_use]
    pub fn matches(&self, lookup: &Lookup) -> bool {
        match lookup {
            Lookup::StudentId(id) => self.student_id == *id,
            Lookup::ApplicationNumber(no) => self.application_number.as_deref() == Some(no),
            Lookup::Email(email) => self.email == *email,
            Lookup::Phone(phone) => self.phone == *phone,
        }
    }
}

/// A unique-ish field a student record can be found by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    StudentId(String),
    ApplicationNumber(String),
    Email(String),
    Phone(String),
}

impl Lookup {
    /// Picks the most specific non-blank identifier, in the order
    /// student id, application number, email, phone.
    #[must_use]
    pub fn first_of(
        student_id: Option<&str>,
        application_number: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Option<Self> {
        let pick = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
        pick(student_id)
            .map(Lookup::StudentId)
            .or_else(|| pick(application_number).map(Lookup::ApplicationNumber))
            .or_else(|| pick(email).map(Lookup::Email))
            .or_else(|| pick(phone).map(Lookup::Phone))
    }

    /// The raw value, used as the status limiter's key.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Lookup::StudentId(v)
            | Lookup::ApplicationNumber(v)
            | Lookup::Email(v)
            | Lookup::Phone(v) => v,
        }
    }
}
