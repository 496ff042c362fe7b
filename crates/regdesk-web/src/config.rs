use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use regdesk_core::photo::DEFAULT_MAX_PHOTO_BYTES;
use regdesk_core::ratelimit::{RateLimitPolicy, DEFAULT_LAZY_SWEEP_THRESHOLD};
use regdesk_core::{Department, Role, Scope};
use serde::Deserialize;

/// One administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 PHC string, as printed by the `hash_password` binary.
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<Department>,
}

impl AdminConfig {
    pub fn scope(&self) -> Scope {
        match self.department {
            Some(d) if self.role == Role::DepartmentAdmin => Scope::Department(d),
            _ => Scope::Unrestricted,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub photo: PhotoConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub admins: Vec<AdminConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_ttl_hours")]
    pub jwt_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_ttl_hours: default_jwt_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_sweep_secs")]
    pub login_sweep_secs: u64,
    #[serde(default = "default_status_window_secs")]
    pub status_window_secs: u64,
    #[serde(default = "default_status_max_requests")]
    pub status_max_requests: u32,
    #[serde(default = "default_status_sweep_secs")]
    pub status_sweep_secs: u64,
    #[serde(default = "default_lazy_sweep_threshold")]
    pub lazy_sweep_threshold: usize,
}

impl RateLimitConfig {
    pub fn login_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            Duration::from_secs(self.login_window_secs),
            self.login_max_attempts,
        )
    }

    pub fn status_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            Duration::from_secs(self.status_window_secs),
            self.status_max_requests,
        )
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_window_secs: default_login_window_secs(),
            login_max_attempts: default_login_max_attempts(),
            login_sweep_secs: default_login_sweep_secs(),
            status_window_secs: default_status_window_secs(),
            status_max_requests: default_status_max_requests(),
            status_sweep_secs: default_status_sweep_secs(),
            lazy_sweep_threshold: default_lazy_sweep_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoConfig {
    #[serde(default = "default_max_photo_bytes")]
    pub max_bytes: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self { max_bytes: default_max_photo_bytes() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_jwt_ttl_hours() -> u64 { 8 }
fn default_login_window_secs() -> u64 { 15 * 60 }
fn default_login_max_attempts() -> u32 { 5 }
fn default_login_sweep_secs() -> u64 { 5 * 60 }
fn default_status_window_secs() -> u64 { 30 }
fn default_status_max_requests() -> u32 { 3 }
fn default_status_sweep_secs() -> u64 { 60 }
fn default_lazy_sweep_threshold() -> usize { DEFAULT_LAZY_SWEEP_THRESHOLD }
fn default_max_photo_bytes() -> usize { DEFAULT_MAX_PHOTO_BYTES }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            photo: PhotoConfig::default(),
            tls: TlsConfig::default(),
            admins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn find_admin(&self, username: &str) -> Option<&AdminConfig> {
        self.admins
            .iter()
            .find(|a| a.username.eq_ignore_ascii_case(username))
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("REGDESK_WEB_CONFIG")
            .map(PathBuf::from)
            .ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(secret) = std::env::var("REGDESK_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(addr) = std::env::var("REGDESK_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }
        if let Ok(val) = std::env::var("REGDESK_MAX_PHOTO_BYTES") {
            config.photo.max_bytes = val.parse()?;
        }
        if let Ok(cert) = std::env::var("REGDESK_TLS_CERT") {
            config.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("REGDESK_TLS_KEY") {
            config.tls.key_path = Some(key);
        }

        config.finish()
    }

    /// Fills in the JWT secret and rejects inconsistent settings.
    pub fn finish(mut self) -> anyhow::Result<Self> {
        if self.auth.jwt_secret.is_empty() {
            self.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. Generated random secret (tokens will not survive a restart)."
            );
        }

        const WEAK_SECRETS: &[&str] = &[
            "your-super-secret-jwt-key",
            "change-me",
            "secret",
            "password",
            "jwt-secret",
        ];
        if WEAK_SECRETS.iter().any(|&w| self.auth.jwt_secret == w) {
            anyhow::bail!(
                "JWT secret matches a known placeholder value. \
                 Set a strong random secret via REGDESK_JWT_SECRET."
            );
        }
        if self.auth.jwt_secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than 32 characters.");
        }

        let mut seen = HashSet::new();
        for admin in &self.admins {
            if !seen.insert(admin.username.to_lowercase()) {
                anyhow::bail!("duplicate admin username: {}", admin.username);
            }
            match (admin.role, admin.department) {
                (Role::DepartmentAdmin, None) => {
                    anyhow::bail!("department admin {} has no department", admin.username)
                }
                (Role::PhotoAdmin, Some(_)) => {
                    anyhow::bail!("photo admin {} must not have a department", admin.username)
                }
                _ => {}
            }
        }
        if self.admins.is_empty() {
            tracing::warn!("No admins configured; every admin login will be rejected.");
        }

        if self.rate_limit.login_max_attempts == 0 || self.rate_limit.status_max_requests == 0 {
            anyhow::bail!("rate limit quotas must be at least 1");
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        bind_addr = "127.0.0.1:8080"

        [auth]
        jwt_secret = "0123456789abcdef0123456789abcdef"

        [rate_limit]
        status_max_requests = 10

        [[admins]]
        username = "cs_admin"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
        role = "department_admin"
        department = "Computer Science"

        [[admins]]
        username = "photo_admin"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
        role = "photo_admin"
    "#;

    #[test]
    fn parses_sample_with_defaults() {
        let config: ServerConfig = toml::from_str(SAMPLE).unwrap();
        let config = config.finish().unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.auth.jwt_ttl_hours, 8);
        assert_eq!(config.rate_limit.login_window_secs, 900);
        assert_eq!(config.rate_limit.login_max_attempts, 5);
        assert_eq!(config.rate_limit.status_max_requests, 10);
        assert_eq!(config.photo.max_bytes, DEFAULT_MAX_PHOTO_BYTES);
        assert_eq!(config.admins.len(), 2);
    }

    #[test]
    fn admin_lookup_is_case_insensitive_and_scoped() {
        let config: ServerConfig = toml::from_str(SAMPLE).unwrap();
        let cs = config.find_admin("CS_Admin").unwrap();
        assert_eq!(cs.scope(), Scope::Department(Department::ComputerScience));
        assert_eq!(config.find_admin("photo_admin").unwrap().scope(), Scope::Unrestricted);
        assert!(config.find_admin("nobody").is_none());
    }

    #[test]
    fn department_admin_needs_department() {
        let toml = r#"
            [[admins]]
            username = "x"
            password_hash = "h"
            role = "department_admin"
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.finish().is_err());
    }

    #[test]
    fn unknown_department_fails_to_parse() {
        let toml = r#"
            [[admins]]
            username = "x"
            password_hash = "h"
            role = "department_admin"
            department = "Physics"
        "#;
        assert!(toml::from_str::<ServerConfig>(toml).is_err());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "your-super-secret-jwt-key".to_string();
        assert!(config.finish().is_err());
    }

    #[test]
    fn empty_secret_is_generated() {
        let config = ServerConfig::default().finish().unwrap();
        assert!(!config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn policies_follow_config() {
        let limits = RateLimitConfig::default();
        assert_eq!(limits.login_policy().window, Duration::from_secs(900));
        assert_eq!(limits.status_policy().max_requests, 3);
    }
}
