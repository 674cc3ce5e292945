use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::errors::AppError;

pub const SESSION_COOKIE: &str = "index_tracker_session";
const SESSION_SUBJECT: &str = "owner";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Hashes `password` into an Argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Config(format!("failed to build password salt: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Config(format!("failed to hash password: {e}")))
}

/// Returns the session token carried in the request's `Cookie` header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
}

/// Verifies the single login credential and issues signed session tokens.
pub struct Authenticator {
    password_hash: String,
    signing_key: EncodingKey,
    // current key first, then the previous one while it is being rotated out
    verification_keys: Vec<DecodingKey>,
    session_ttl: chrono::Duration,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let password_hash = match (&config.password_hash, &config.password) {
            (Some(hash), _) => {
                PasswordHash::new(hash)
                    .map_err(|e| AppError::Config(format!("LOGIN_PASSWORD_HASH is invalid: {e}")))?;
                hash.clone()
            }
            (None, Some(plain)) => {
                warn!("LOGIN_PASSWORD is set in plain text; prefer LOGIN_PASSWORD_HASH");
                hash_password(plain)?
            }
            (None, None) => {
                return Err(AppError::Config("no login credential configured".into()));
            }
        };

        if config.secret_key.len() < MIN_SECRET_LEN {
            warn!("SECRET_KEY is shorter than {} bytes", MIN_SECRET_LEN);
        }

        let mut verification_keys = vec![DecodingKey::from_secret(config.secret_key.as_bytes())];
        if let Some(previous) = &config.previous_secret_key {
            verification_keys.push(DecodingKey::from_secret(previous.as_bytes()));
        }

        Ok(Self {
            password_hash,
            signing_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            verification_keys,
            session_ttl: config.session_ttl,
        })
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }

    pub fn issue_session(&self) -> Result<String, AppError> {
        self.issue_session_at(Utc::now())
    }

    pub fn issue_session_at(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = SessionClaims {
            sub: SESSION_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.signing_key)
            .map_err(|e| AppError::Session(e.to_string()))
    }

    pub fn validate_session(&self, token: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.sub = Some(SESSION_SUBJECT.to_string());

        self.verification_keys.iter().any(|key| {
            match decode::<SessionClaims>(token, key, &validation) {
                Ok(_) => true,
                Err(e) => {
                    debug!("Session token rejected: {}", e);
                    false
                }
            }
        })
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.session_ttl.num_seconds()
        )
    }

    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}
