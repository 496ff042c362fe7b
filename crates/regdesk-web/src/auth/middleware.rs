use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use regdesk_core::{Role, Scope};

use crate::error::AppError;
use crate::state::AppState;

/// An authenticated administrator, taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub username: String,
    pub role: Role,
    pub scope: Scope,
}

impl AuthAdmin {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Access denied. {role} privileges required."
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Auth("Access denied. Authentication required.".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

        let claims = super::jwt::verify_token(&state.config.auth.jwt_secret, token)
            .map_err(|_| AppError::Auth("Access denied. Invalid token.".to_string()))?;

        // A token whose role/department pair is inconsistent was not minted here.
        let scope = Scope::for_role(claims.role, claims.department)
            .map_err(|_| AppError::Auth("Access denied. Invalid token.".to_string()))?;

        Ok(AuthAdmin {
            username: claims.sub,
            role: claims.role,
            scope,
        })
    }
}
