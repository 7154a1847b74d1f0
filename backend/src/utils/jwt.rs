//! JWT token utilities for authentication and password reset.
//!
//! Tokens are HS256-signed and carry the subject id, the role and the
//! subject's token version. Validation is a pure function of the token, the
//! signing key and the clock; callers that need to know whether the subject
//! still exists consult the user store themselves.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::database::models::Role;
use crate::errors::ServiceError;

/// Reasons a token string is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Please check the token. Cannot read it.")]
    Malformed,
    #[error("Token signature is invalid.")]
    InvalidSignature,
    #[error("Token expired on: {}", .expired_at.to_rfc3339())]
    Expired { expired_at: DateTime<Utc> },
    #[error("Could not get {0} claim from token")]
    MissingClaim(&'static str),
    #[error("Token lifetime must be positive")]
    InvalidLifetime,
    #[error("Token generation failed: {0}")]
    Signing(String),
}

impl From<TokenError> for ServiceError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::InvalidLifetime | TokenError::Signing(_) => {
                ServiceError::internal_error(error.to_string())
            }
            other => ServiceError::invalid_operation(other.to_string()),
        }
    }
}

/// Decoded and verified token claims.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User role
    pub role: Role,
    /// Token version of the subject at issue time
    pub ver: i64,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
}

/// Wire form used while decoding, so that absent claims can be reported
/// precisely instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    role: Option<Role>,
    #[serde(default)]
    ver: i64,
    iat: Option<i64>,
    exp: Option<i64>,
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the authentication settings.
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Expiry and required claims are checked by hand in `validate_at`
        // so each failure maps to its own error kind.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Issue a signed token that expires `ttl` from now.
    pub fn issue(
        &self,
        subject_id: &str,
        role: Role,
        token_version: i64,
        ttl: std::time::Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject_id, role, token_version, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: &str,
        role: Role,
        token_version: i64,
        ttl: std::time::Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = Duration::from_std(ttl).map_err(|_| TokenError::InvalidLifetime)?;
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidLifetime);
        }
        let exp = now + ttl;

        let claims = Claims {
            sub: subject_id.to_string(),
            role,
            ver: token_version,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate and decode a JWT token against the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let raw = decode::<RawClaims>(token.trim(), &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        let exp = raw.exp.ok_or(TokenError::MissingClaim("exp"))?;
        let expired_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;
        if now >= expired_at {
            return Err(TokenError::Expired { expired_at });
        }

        let sub = raw
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(TokenError::MissingClaim("sub"))?;
        let role = raw.role.ok_or(TokenError::MissingClaim("role"))?;

        Ok(Claims {
            sub,
            role,
            ver: raw.ver,
            iat: raw.iat.unwrap_or_default(),
            exp,
        })
    }
}

impl Claims {
    /// Check if user is admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the bearer may act on the given user's record.
    pub fn can_manage(&self, user_id: &str) -> bool {
        self.is_admin() || self.sub == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    const DAY: StdDuration = StdDuration::from_secs(24 * 60 * 60);

    fn utils_with_secret(secret: &str) -> JwtUtils {
        JwtUtils::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            session_token_ttl: DAY * 7,
            reset_token_ttl: DAY,
            bcrypt_cost: 4,
        })
    }

    fn utils() -> JwtUtils {
        utils_with_secret("a-test-secret-that-is-long-enough")
    }

    #[test]
    fn test_issue_then_validate_round_trips_subject_and_role() {
        let jwt = utils();
        let token = jwt.issue("user-1", Role::Admin, 3, DAY * 7).unwrap();

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let jwt = utils();
        let issued = Utc::now() - Duration::days(2);
        let token = jwt.issue_at("user-1", Role::User, 0, DAY, issued).unwrap();

        let err = jwt.validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired { .. }));
        assert!(err.to_string().starts_with("Token expired on: "));
    }

    #[test]
    fn test_token_is_expired_exactly_at_expiry_instant() {
        let jwt = utils();
        let issued = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = jwt.issue_at("user-1", Role::User, 0, DAY, issued).unwrap();

        let at_expiry = issued + Duration::days(1);
        assert!(jwt.validate_at(&token, at_expiry - Duration::seconds(1)).is_ok());
        assert_eq!(
            jwt.validate_at(&token, at_expiry),
            Err(TokenError::Expired {
                expired_at: at_expiry
            })
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let jwt = utils();
        assert_eq!(jwt.validate("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(jwt.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = utils_with_secret("another-secret-entirely-here")
            .issue("user-1", Role::User, 0, DAY)
            .unwrap();

        assert_eq!(utils().validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_missing_subject_claim() {
        let jwt = utils();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "role": "User", "exp": exp }),
            &jwt.encoding_key,
        )
        .unwrap();

        assert_eq!(jwt.validate(&token), Err(TokenError::MissingClaim("sub")));
    }

    #[test]
    fn test_missing_expiry_is_invalid() {
        let jwt = utils();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "user-1", "role": "User" }),
            &jwt.encoding_key,
        )
        .unwrap();

        assert_eq!(jwt.validate(&token), Err(TokenError::MissingClaim("exp")));
    }

    #[test]
    fn test_expiry_wins_over_missing_subject() {
        let jwt = utils();
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "role": "User", "exp": exp }),
            &jwt.encoding_key,
        )
        .unwrap();

        assert!(matches!(
            jwt.validate(&token),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_zero_lifetime_is_refused() {
        assert_eq!(
            utils().issue("user-1", Role::User, 0, StdDuration::ZERO),
            Err(TokenError::InvalidLifetime)
        );
    }

    #[test]
    fn test_can_manage() {
        let claims = Claims {
            sub: "a".into(),
            role: Role::User,
            ver: 0,
            iat: 0,
            exp: 1,
        };
        assert!(claims.can_manage("a"));
        assert!(!claims.can_manage("b"));
        assert!(Claims { role: Role::Admin, ..claims }.can_manage("b"));
    }
}
