//! Error types for `regdesk-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

/// Unified error type for all core operations.
///
/// Each variant maps onto one signal the transport layer surfaces to the
/// caller; infrastructure failures collapse into [`CoreError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input is missing or malformed. The message is safe to show verbatim.
    #[error("{0}")]
    Validation(String),

    /// A unique field is already taken by another record.
    #[error("{0}")]
    Conflict(String),

    /// No record matches the given identifier.
    #[error("{0}")]
    NotFound(String),

    /// The caller exhausted its request quota.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The actor's scope does not cover the target record.
    #[error("{0}")]
    Forbidden(String),

    /// Persistence or an external collaborator failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Convenience alias used throughout `regdesk-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_displays_message_verbatim() {
        let err = CoreError::validation("email is required");
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn rate_limited_displays_retry_hint() {
        let err = CoreError::RateLimited {
            retry_after_secs: 42,
        };
        assert_eq!(err.to_string(), "rate limited: retry after 42s");
    }

    #[test]
    fn storage_is_prefixed() {
        let err = CoreError::Storage("connection refused".to_string());
        assert_eq!(err.to_string(), "storage error: connection refused");
    }

    #[test]
    fn error_is_debug() {
        let err = CoreError::not_found("student 2025123456");
        let debug = format!("{:?}", err);
        assert!(debug.contains("NotFound"));
    }
}
