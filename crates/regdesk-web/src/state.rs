use std::sync::Arc;

use regdesk_core::{
    InlinePhotoStore, MemoryStudentStore, PhotoStore, PolicyLimiter, RateLimiter, Students,
};

use crate::cache::ResponseCache;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub students: Students,
    pub photos: Arc<dyn PhotoStore>,
    /// Keyed by client IP.
    pub login_limiter: PolicyLimiter,
    /// Keyed by the looked-up student identifier.
    pub status_limiter: PolicyLimiter,
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let limits = &config.rate_limit;
        let login_limiter = PolicyLimiter::new(
            "login",
            RateLimiter::new().lazy_sweep_threshold(limits.lazy_sweep_threshold),
            limits.login_policy(),
        );
        let status_limiter = PolicyLimiter::new(
            "status",
            RateLimiter::new().lazy_sweep_threshold(limits.lazy_sweep_threshold),
            limits.status_policy(),
        )
        .redact_identifiers();

        Self {
            config: Arc::new(config),
            students: Students::new(Arc::new(MemoryStudentStore::new())),
            photos: Arc::new(InlinePhotoStore),
            login_limiter,
            status_limiter,
            cache: Arc::new(ResponseCache::new()),
        }
    }
}
