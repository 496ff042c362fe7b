use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use regdesk_core::{CoreError, Decision, Lookup, NewStudent, PhotoUpload, Role};

use crate::auth::middleware::AuthAdmin;
use crate::cache::{status_key, STATUS_TTL};
use crate::dto::{
    ActorDto, PhotoUploadResponse, RateLimitInfo, RegisterResponse, RegisteredDto,
    StatusRequest, StatusResponse, StudentIdQuery, StudentStatusDto, StudentSummaryDto,
};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewStudent>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let record = state.students.register(body).await?;
    state.cache.invalidate_department(record.department);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful".to_string(),
            student_id: record.student_id.clone(),
            data: RegisteredDto {
                name: record.name,
                student_id: record.student_id,
                department: record.department,
            },
        }),
    ))
}

pub async fn status(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let lookup = Lookup::first_of(
        body.student_id.as_deref(),
        body.application_number.as_deref(),
        body.email.as_deref(),
        body.phone.as_deref(),
    )
    .ok_or_else(|| {
        AppError::BadRequest(
            "Please provide student_id, application_number, email, or phone".to_string(),
        )
    })?;

    let remaining = match state.status_limiter.check(lookup.value()) {
        Decision::Allowed { remaining } => remaining,
        Decision::Limited { retry_after_secs } => {
            return Err(AppError::RateLimited {
                message: format!(
                    "Too many status checks. Please wait {retry_after_secs} seconds before checking again."
                ),
                retry_after_secs,
            });
        }
    };

    let key = status_key(&lookup);
    let student = match state.cache.get(&key) {
        Some(cached) => cached,
        None => {
            let generation = state.cache.generation();
            let record = state.students.get_status(&lookup).await?;
            let value = serde_json::to_value(StudentStatusDto::from(&record))
                .map_err(|e| AppError::Internal(e.to_string()))?;
            state.cache.insert_if_unchanged(
                key,
                value.clone(),
                Some(record.student_id),
                STATUS_TTL,
                generation,
            );
            value
        }
    };

    Ok(Json(StatusResponse {
        success: true,
        student,
        last_checked: Utc::now(),
        rate_limit: RateLimitInfo {
            remaining,
            reset_time: state.status_limiter.policy().window.as_secs(),
        },
    }))
}

pub async fn upload_photo(
    admin: AuthAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, AppError> {
    admin.require_role(Role::PhotoAdmin)?;

    let mut student_id: Option<String> = None;
    let mut upload: Option<PhotoUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "student_id" | "studentId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
                student_id = Some(text.trim().to_string()).filter(|s| !s.is_empty());
            }
            "photo" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
                upload = Some(PhotoUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let (Some(student_id), Some(upload)) = (student_id, upload) else {
        return Err(AppError::BadRequest(
            "Student ID and photo are required".to_string(),
        ));
    };
    upload.validate(state.config.photo.max_bytes)?;

    state
        .students
        .get_status(&Lookup::StudentId(student_id.clone()))
        .await
        .map_err(student_not_found)?;

    let photo_ref = state.photos.put(&student_id, upload).await?;
    let record = state
        .students
        .attach_photo(&student_id, photo_ref)
        .await
        .map_err(student_not_found)?;

    state.cache.invalidate_student(&record.student_id);
    state.cache.invalidate_department(record.department);
    tracing::info!(
        "Photo for {} uploaded by {}",
        record.student_id,
        admin.username
    );

    Ok(Json(PhotoUploadResponse {
        success: true,
        message: "Photo uploaded successfully".to_string(),
        application_number: record.application_number.clone(),
        student: StudentSummaryDto::from(&record),
        uploaded_by: ActorDto {
            username: admin.username,
            role: admin.role,
            timestamp: Utc::now(),
        },
    }))
}

pub async fn photo_lookup(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Query(query): Query<StudentIdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    admin.require_role(Role::PhotoAdmin)?;

    let student_id = query
        .student_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Student ID is required".to_string()))?;

    let record = state
        .students
        .get_status(&Lookup::StudentId(student_id))
        .await
        .map_err(student_not_found)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "student": StudentSummaryDto::from(&record),
    })))
}

fn student_not_found(e: CoreError) -> AppError {
    match e {
        CoreError::NotFound(_) => AppError::NotFound("Student not found with this ID".to_string()),
        other => other.into(),
    }
}
