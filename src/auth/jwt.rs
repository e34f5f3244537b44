use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID as a UUID string.
    pub sub: String,
    /// User role: `"user"`, `"moderator"`, or `"admin"`.
    pub role: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
}

/// Generate a signed access token for the given user.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_access_token(user_id: Uuid, role: &str, config: &Config) -> anyhow::Result<String> {
    let now = Utc::now();

    #[allow(clippy::cast_possible_wrap)]
    let exp = now.timestamp() + config.jwt_access_expiration_secs as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp,
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());

    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode access token: {e}"))
}

/// Decode and validate an access token, returning its claims.
///
/// # Errors
///
/// Returns an error if the token is malformed, has a bad signature, or is
/// expired.
pub fn validate_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid token: {e}"))?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::net::IpAddr;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_access_expiration_secs: 900,
            frontend_url: String::new(),
        }
    }

    #[test]
    fn roundtrip_preserves_claims() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(user_id, "moderator", &config).unwrap_or_default();
        let claims =
            validate_access_token(&token, &config.jwt_secret).unwrap_or_else(|_| Claims {
                sub: String::new(),
                role: String::new(),
                exp: 0,
                iat: 0,
            });

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "moderator");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token =
            generate_access_token(Uuid::new_v4(), "user", &config).unwrap_or_default();

        assert!(validate_access_token(&token, "a-completely-different-secret").is_err());
    }
}
