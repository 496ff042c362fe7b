use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use regdesk_core::{Department, Scope};

use crate::auth::middleware::AuthAdmin;
use crate::cache::{department_key, DEPARTMENT_TTL};
use crate::dto::{
    ActorDto, AdminDto, DepartmentListResponse, StudentListItem, UpdateDocumentsRequest,
    UpdateDocumentsResponse, UpdatedStudentDto,
};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

fn admin_dto(admin: &AuthAdmin) -> AdminDto {
    AdminDto {
        username: admin.username.clone(),
        department: match admin.scope {
            Scope::Department(d) => Some(d),
            Scope::Unrestricted => None,
        },
        role: admin.role,
    }
}

pub async fn list(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Result<Json<DepartmentListResponse>, AppError> {
    let department: Department = department.parse()?;
    admin.scope.require(department)?;

    let key = department_key(department);
    let students = match state.cache.get(&key) {
        Some(cached) => cached,
        None => {
            let items: Vec<StudentListItem> = state
                .students
                .list_department(admin.scope, department)
                .await?
                .into_iter()
                .map(StudentListItem::from)
                .collect();
            let value = serde_json::to_value(&items)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            state.cache.insert(key, value.clone(), None, DEPARTMENT_TTL);
            value
        }
    };

    let count = students.as_array().map_or(0, Vec::len);
    Ok(Json(DepartmentListResponse {
        success: true,
        department,
        count,
        students,
        admin: admin_dto(&admin),
    }))
}

pub async fn update_documents(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Path(department): Path<String>,
    ApiJson(body): ApiJson<UpdateDocumentsRequest>,
) -> Result<Json<UpdateDocumentsResponse>, AppError> {
    let department: Department = department.parse()?;
    admin.scope.require(department)?;

    let (Some(student_id), Some(documents)) = (
        body.student_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        body.documents,
    ) else {
        return Err(AppError::BadRequest(
            "Student ID and documents are required".to_string(),
        ));
    };

    let record = state
        .students
        .update_documents(admin.scope, &student_id, documents)
        .await?;

    state.cache.invalidate_department(record.department);
    state.cache.invalidate_student(&record.student_id);
    tracing::info!(
        "Documents for {} updated by {} (status: {})",
        record.student_id,
        admin.username,
        record.status
    );

    Ok(Json(UpdateDocumentsResponse {
        success: true,
        message: "Documents updated successfully".to_string(),
        student: UpdatedStudentDto {
            name: record.name,
            student_id: record.student_id,
            status: record.status,
            documents: record.documents,
        },
        updated_by: ActorDto {
            username: admin.username,
            role: admin.role,
            timestamp: Utc::now(),
        },
    }))
}
