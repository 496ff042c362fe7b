use chrono::{DateTime, Utc};
use regdesk_core::{Department, DocumentCheck, Role, Status, StudentRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminDto {
    pub username: String,
    pub department: Option<Department>,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_at: u64,
    pub admin: AdminDto,
}

#[derive(Debug, Serialize)]
pub struct RegisteredDto {
    pub name: String,
    pub student_id: String,
    pub department: Department,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub student_id: String,
    pub data: RegisteredDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub student_id: Option<String>,
    pub application_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// What a student sees about their own registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentStatusDto {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: Department,
    pub student_id: String,
    pub application_number: Option<String>,
    pub status: Status,
    pub registration_date: DateTime<Utc>,
    pub has_photo: bool,
    pub documents: Vec<DocumentCheck>,
}

impl From<&StudentRecord> for StudentStatusDto {
    fn from(r: &StudentRecord) -> Self {
        Self {
            name: r.name.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
            department: r.department,
            student_id: r.student_id.clone(),
            application_number: r.application_number.clone(),
            status: r.status,
            registration_date: r.created_at,
            has_photo: r.has_photo(),
            documents: r.documents.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateLimitInfo {
    pub remaining: u32,
    /// Window length in seconds, same unit as `reset_time` on a 429.
    pub reset_time: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub student: serde_json::Value,
    pub last_checked: DateTime<Utc>,
    pub rate_limit: RateLimitInfo,
}

/// What the photo station sees about a student.
#[derive(Debug, Serialize)]
pub struct StudentSummaryDto {
    pub name: String,
    pub student_id: String,
    pub department: Department,
    pub phone: String,
    pub has_photo: bool,
    pub application_number: Option<String>,
    pub status: Status,
}

impl From<&StudentRecord> for StudentSummaryDto {
    fn from(r: &StudentRecord) -> Self {
        Self {
            name: r.name.clone(),
            student_id: r.student_id.clone(),
            department: r.department,
            phone: r.phone.clone(),
            has_photo: r.has_photo(),
            application_number: r.application_number.clone(),
            status: r.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentIdQuery {
    #[serde(default)]
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActorDto {
    pub username: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub success: bool,
    pub message: String,
    pub application_number: Option<String>,
    pub student: StudentSummaryDto,
    pub uploaded_by: ActorDto,
}

/// A department listing row: the full record minus the photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentListItem {
    pub student_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: Department,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub dob: chrono::NaiveDate,
    pub application_number: Option<String>,
    pub has_photo: bool,
    pub documents: Vec<DocumentCheck>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl From<StudentRecord> for StudentListItem {
    fn from(r: StudentRecord) -> Self {
        Self {
            has_photo: r.has_photo(),
            student_id: r.student_id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            department: r.department,
            parent_name: r.parent_name,
            parent_email: r.parent_email,
            parent_phone: r.parent_phone,
            dob: r.dob,
            application_number: r.application_number,
            documents: r.documents,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DepartmentListResponse {
    pub success: bool,
    pub department: Department,
    pub count: usize,
    pub students: serde_json::Value,
    pub admin: AdminDto,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentsRequest {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub documents: Option<Vec<DocumentCheck>>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedStudentDto {
    pub name: String,
    pub student_id: String,
    pub status: Status,
    pub documents: Vec<DocumentCheck>,
}

#[derive(Debug, Serialize)]
pub struct UpdateDocumentsResponse {
    pub success: bool,
    pub message: String,
    pub student: UpdatedStudentDto,
    pub updated_by: ActorDto,
}
