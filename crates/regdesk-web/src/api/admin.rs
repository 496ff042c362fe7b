use axum::extract::State;
use axum::Json;
use regdesk_core::{Decision, Department, Role};

use crate::auth::{jwt, password};
use crate::dto::{AdminDto, LoginRequest, LoginResponse};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::client_ip::ClientIp;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if let Decision::Limited { retry_after_secs } = state.login_limiter.check(&ip) {
        let minutes = retry_after_secs.div_ceil(60);
        return Err(AppError::RateLimited {
            message: format!(
                "Too many login attempts. Please try again in {minutes} minutes."
            ),
            retry_after_secs,
        });
    }

    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let admin = state
        .config
        .find_admin(body.username.trim())
        .ok_or_else(|| {
            tracing::warn!("Failed login attempt for unknown admin from {ip}");
            AppError::Auth("Invalid credentials".to_string())
        })?
        .clone();

    let hash = admin.password_hash.clone();
    let candidate = body.password.clone();
    let valid = tokio::task::spawn_blocking(move || password::verify_password(&hash, &candidate))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    if !valid {
        tracing::warn!("Failed login attempt for admin {} from {ip}", admin.username);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    if let Some(requested) = body.department.as_deref().filter(|d| !d.trim().is_empty()) {
        let permitted = requested
            .parse::<Department>()
            .is_ok_and(|d| admin.scope().permits(d));
        if admin.role == Role::DepartmentAdmin && !permitted {
            return Err(AppError::Forbidden(
                "You are not authorized for this department".to_string(),
            ));
        }
    }

    let (token, expires_at) = jwt::create_token(
        &state.config.auth.jwt_secret,
        state.config.auth.jwt_ttl_hours,
        &admin,
    )?;

    state.login_limiter.reset(&ip);
    tracing::info!("Admin {} ({}) logged in from {ip}", admin.username, admin.role);

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        expires_at,
        admin: AdminDto {
            username: admin.username.to_lowercase(),
            department: admin.department,
            role: admin.role,
        },
    }))
}
