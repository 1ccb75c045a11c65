//! Picture access tokens
//!
//! HS256 JWTs minted once per lead at creation time. They are never stored: possession of a
//! valid, unexpired token whose `scope` is `picture` is the whole authorization story for the
//! picture routes of that one lead.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use leadcap_core::constants::PICTURE_SCOPE;
use leadcap_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims of a picture access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureClaims {
    pub lead_id: Uuid,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct PictureTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl PictureTokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Sign a token for `lead_id` valid for the configured TTL from now.
    pub fn issue(&self, lead_id: Uuid) -> Result<String, AppError> {
        self.issue_at(lead_id, chrono::Utc::now().timestamp())
    }

    /// Sign a token as if issued at `issued_at` (unix seconds).
    pub fn issue_at(&self, lead_id: Uuid, issued_at: i64) -> Result<String, AppError> {
        let claims = PictureClaims {
            lead_id,
            scope: PICTURE_SCOPE.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign picture token: {}", e)))
    }

    /// Check signature, expiry (no leeway) and scope. The returned error always carries the
    /// generic client message; the precise reason is only logged.
    pub fn verify(&self, token: &str) -> Result<PictureClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = decode::<PictureClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Picture token rejected");
                invalid_token()
            })?
            .claims;

        if claims.scope != PICTURE_SCOPE {
            tracing::debug!(scope = %claims.scope, "Picture token has wrong scope");
            return Err(invalid_token());
        }

        Ok(claims)
    }
}

pub(crate) fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid or expired token".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-chars!";

    #[test]
    fn test_issue_and_verify() {
        let service = PictureTokenService::new(SECRET, 3600);
        let lead_id = Uuid::new_v4();
        let claims = service.verify(&service.issue(lead_id).unwrap()).unwrap();
        assert_eq!(claims.lead_id, lead_id);
        assert_eq!(claims.scope, "picture");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = PictureTokenService::new(SECRET, 60);
        let issued_at = chrono::Utc::now().timestamp() - 120;
        let token = service.issue_at(Uuid::new_v4(), issued_at).unwrap();
        let err = service.verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid or expired token");
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = PictureTokenService::new("another-secret-that-is-32-chars-long", 3600);
        let service = PictureTokenService::new(SECRET, 3600);
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(service.verify(&token).is_err());
        assert!(service.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_wrong_scope_rejected() {
        let service = PictureTokenService::new(SECRET, 3600);
        let now = chrono::Utc::now().timestamp();
        let claims = PictureClaims {
            lead_id: Uuid::new_v4(),
            scope: "admin".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_payload_uses_lead_id_claim() {
        let service = PictureTokenService::new(SECRET, 3600);
        let lead_id = Uuid::new_v4();
        let token = service.issue(lead_id).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        use base64::Engine as _;
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["leadId"], lead_id.to_string());
        assert_eq!(json["scope"], "picture");
    }
}
