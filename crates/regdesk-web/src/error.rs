use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use regdesk_core::CoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_time: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::RateLimited {
                message,
                retry_after_secs,
            } => {
                retry_after = Some(retry_after_secs);
                (StatusCode::TOO_MANY_REQUESTS, message)
            }
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
            rate_limited: retry_after.map(|_| true),
            reset_time: retry_after,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => AppError::BadRequest(msg),
            CoreError::Conflict(msg) => AppError::Conflict(msg),
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::Forbidden(msg) => AppError::Forbidden(msg),
            CoreError::RateLimited { retry_after_secs } => AppError::RateLimited {
                message: format!("Too many requests. Please wait {retry_after_secs} seconds."),
                retry_after_secs,
            },
            CoreError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AppError::Internal("Internal server error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::validation("x"), StatusCode::BAD_REQUEST),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (CoreError::not_found("x"), StatusCode::NOT_FOUND),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                CoreError::RateLimited {
                    retry_after_secs: 3,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (CoreError::Storage("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let response = AppError::RateLimited {
            message: "slow down".to_string(),
            retry_after_secs: 12,
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }
}
