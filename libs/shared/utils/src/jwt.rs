use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid signature encoding")]
    SignatureEncoding,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid claims encoding")]
    ClaimsEncoding,

    #[error("Invalid claims format")]
    ClaimsFormat,

    #[error("Token expired")]
    Expired,
}

/// Verifies an HS256 Supabase access token and returns the caller it identifies.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, TokenError> {
    if jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err(TokenError::Malformed),
    };

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::SignatureEncoding
    })?;

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| TokenError::MissingSecret)?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(TokenError::BadSignature);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::ClaimsEncoding)?;

    let claims: JwtClaims = serde_json::from_slice(&claims_bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::ClaimsFormat
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err(TokenError::Expired);
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn accepts_a_signed_token() {
        let user = TestUser::receptionist("desk@clinic.test");
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(1));

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.portal_role(), Some("receptionist"));
    }

    #[test]
    fn rejects_expired_and_forged_tokens() {
        let user = TestUser::default();

        let expired = JwtTestUtils::create_expired_token(&user, SECRET);
        assert_matches!(validate_token(&expired, SECRET), Err(TokenError::Expired));

        let forged = JwtTestUtils::create_invalid_signature_token(&user);
        assert_matches!(validate_token(&forged, SECRET), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_matches!(validate_token("a.b", SECRET), Err(TokenError::Malformed));
        assert_matches!(validate_token("a.b.c.d", SECRET), Err(TokenError::Malformed));
        assert_matches!(validate_token("a.b.c", ""), Err(TokenError::MissingSecret));
    }
}
