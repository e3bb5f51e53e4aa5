use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;

/// Session Token Claims
///
/// `sub` 是用户 ID。
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// JWT Service for issuing and validating session tokens (HS256)
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_hours: u64,
}

impl JwtService {
    pub fn new(secret: &str, session_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_hours,
        }
    }

    /// Create JwtService from config
    pub fn from_config(config: &AuthConfig) -> Self {
        // 未配置时生成随机 secret：进程重启后旧会话全部失效
        let secret = if config.jwt_secret.is_empty() {
            warn!("JWT secret not configured or empty, generating random secret");
            crate::utils::generate_random_code(48)
        } else {
            config.jwt_secret.clone()
        };

        Self::new(&secret, config.session_hours)
    }

    /// Issue a session token for the given user
    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.session_hours as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Validate a session token
    pub fn validate(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<SessionClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        if token_data.claims.sub.is_empty() {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidSubject,
            ));
        }

        Ok(token_data.claims)
    }
}
