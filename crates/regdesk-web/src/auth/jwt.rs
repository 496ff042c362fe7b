use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use regdesk_core::{Department, Role};
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub department: Option<Department>,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    jwt_secret: &str,
    ttl_hours: u64,
    admin: &AdminConfig,
) -> anyhow::Result<(String, u64)> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let expires_at = now + ttl_hours * 3600;

    let claims = Claims {
        sub: admin.username.to_lowercase(),
        role: admin.role,
        department: admin.department,
        iat: now as usize,
        exp: expires_at as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

pub fn verify_token(jwt_secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminConfig {
        AdminConfig {
            username: "EC_Admin".to_string(),
            password_hash: String::new(),
            role: Role::DepartmentAdmin,
            department: Some(Department::Electronics),
        }
    }

    #[test]
    fn token_round_trips_role_and_department() {
        let secret = "0123456789abcdef0123456789abcdef";
        let (token, expires_at) = create_token(secret, 8, &admin()).unwrap();
        let claims = verify_token(secret, &token).unwrap();
        assert_eq!(claims.sub, "ec_admin");
        assert_eq!(claims.role, Role::DepartmentAdmin);
        assert_eq!(claims.department, Some(Department::Electronics));
        assert_eq!(claims.exp as u64, expires_at);
        assert_eq!(expires_at - claims.iat as u64, 8 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = create_token("a-secret-that-is-long-enough-1234", 1, &admin()).unwrap();
        assert!(verify_token("another-secret-that-is-long-enough", &token).is_err());
    }
}
