use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's email.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and verifies HS256 tokens with a shared secret.
///
/// Built once from configuration and shared through `AppState`, so handlers
/// and the middleware never read the environment themselves.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Generates a token for `subject`, valid for the configured TTL.
    ///
    /// # Returns
    /// The encoded token, or `AppError::InternalServerError` if the expiry
    /// falls outside the representable range or encoding fails.
    pub fn generate(&self, subject: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token lifetime overflows".into()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: epoch_seconds(now.timestamp())?,
            exp: epoch_seconds(expires_at.timestamp())?,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and expiry and returns the decoded claims.
    ///
    /// # Returns
    /// `AppError::Unauthorized` if the token is malformed, its signature is
    /// invalid, or it has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

fn epoch_seconds(timestamp: i64) -> Result<usize, AppError> {
    usize::try_from(timestamp).map_err(|_| {
        AppError::InternalServerError(format!("Timestamp {} is before the epoch", timestamp))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = TokenService::new("test_secret_for_gen_verify", Duration::hours(24));
        let token = tokens.generate("user@example.com").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_expiration() {
        let tokens = TokenService::new("test_secret_for_expiration", Duration::hours(-2));
        let expired_token = tokens.generate("user@example.com").unwrap();

        match tokens.verify(&expired_token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let issuer = TokenService::new("issuer_secret", Duration::hours(1));
        let verifier = TokenService::new("a_completely_different_secret", Duration::hours(1));
        let token = issuer.generate("user@example.com").unwrap();

        match verifier.verify(&token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("InvalidSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
            Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
        }
    }

    #[test]
    fn test_lifetime_overflow_is_an_error() {
        let tokens = TokenService::new("secret", Duration::days(365 * 300_000));
        assert!(matches!(
            tokens.generate("user@example.com"),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn test_expiry_before_epoch_is_an_error() {
        let tokens = TokenService::new("secret", Duration::hours(-1_000_000));
        assert!(matches!(
            tokens.generate("user@example.com"),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let tokens = TokenService::new("secret", Duration::hours(1));
        assert!(matches!(
            tokens.verify("not.a.token"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
