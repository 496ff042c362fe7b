//! Student photos.
//!
//! Uploaded bytes are checked against a type allow-list and a size bound,
//! then handed to a [`PhotoStore`] which returns the reference kept on the
//! student record.

use async_trait::async_trait;
use base64::Engine;

use crate::error::{CoreError, CoreResult};

/// Default upper bound on an uploaded photo, after any client-side compression.
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 8 * 1024 * 1024;

/// Image types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// A photo as received from the capture station.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an empty body, an unsupported type, or
    /// more than `max_bytes` of data.
    pub fn validate(&self, max_bytes: usize) -> CoreResult<()> {
        if self.bytes.is_empty() {
            return Err(CoreError::validation("photo is empty"));
        }
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(CoreError::validation(format!(
                "unsupported photo type {}; expected one of {}",
                self.content_type,
                ALLOWED_CONTENT_TYPES.join(", ")
            )));
        }
        if self.bytes.len() > max_bytes {
            return Err(CoreError::validation(format!(
                "photo is {} bytes; the limit is {max_bytes}",
                self.bytes.len()
            )));
        }
        Ok(())
    }
}

/// Where validated photos end up.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Stores `upload` for `student_id` and returns a stable reference to it.
    async fn put(&self, student_id: &str, upload: PhotoUpload) -> CoreResult<String>;
}

/// Keeps the photo inside the reference itself as a `data:` URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePhotoStore;

#[async_trait]
impl PhotoStore for InlinePhotoStore {
    async fn put(&self, student_id: &str, upload: PhotoUpload) -> CoreResult<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&upload.bytes);
        tracing::debug!(student_id, size = upload.bytes.len(), "photo stored inline");
        Ok(format!(
            "data:{};base64,{encoded}",
            upload.content_type.to_ascii_lowercase()
        ))
    }
}
