//! The registration lifecycle.
//!
//! A record starts `pending` at registration. Photo capture moves it to
//! `photo_taken`; a document review in which every checklist entry is
//! verified moves it to `documents_verified`. `completed` exists in the
//! vocabulary but nothing transitions into it yet.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentCheck, StudentRecord};
use crate::error::{CoreError, CoreResult};

/// Where a student is in the registration workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    PhotoTaken,
    DocumentsVerified,
    Completed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pending => "pending",
            Status::PhotoTaken => "photo_taken",
            Status::DocumentsVerified => "documents_verified",
            Status::Completed => "completed",
        })
    }
}

/// A change applied to an existing record.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A photo admin captured the student's photo.
    PhotoCaptured {
        photo_ref: String,
        application_number: String,
    },
    /// A department admin reviewed the document checklist.
    DocumentsReviewed { documents: Vec<DocumentCheck> },
}

impl Transition {
    /// Applies the change to `record` in place.
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] if a reviewed checklist does not list the
    /// record's documents in the same order.
    pub fn apply_to(self, record: &mut StudentRecord, now: DateTime<Utc>) -> CoreResult<()> {
        match self {
            Transition::PhotoCaptured {
                photo_ref,
                application_number,
            } => {
                if record.status > Status::PhotoTaken {
                    // Re-capture is allowed and resets the status.
                    tracing::warn!(
                        student_id = %record.student_id,
                        from = %record.status,
                        "photo re-captured after documents were verified; status moves back to photo_taken"
                    );
                }
                record.photo_ref = Some(photo_ref);
                record.application_number = Some(application_number);
                record.status = Status::PhotoTaken;
            }
            Transition::DocumentsReviewed { documents } => {
                let same_entries = documents.len() == record.documents.len()
                    && documents
                        .iter()
                        .zip(&record.documents)
                        .all(|(submitted, stored)| submitted.name == stored.name);
                if !same_entries {
                    return Err(CoreError::validation(
                        "documents must list the existing checklist entries in order",
                    ));
                }
                record.documents = documents;
                if record.all_documents_verified() {
                    record.status = Status::DocumentsVerified;
                }
            }
        }
        record.updated_at = now;
        Ok(())
    }
}
