//! Session claims and verification (the identity-provider seam).
//!
//! The marketplace identity service issues HS256 session tokens; this module
//! verifies the signature and validates the claims deterministically. It
//! never issues credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use artmarket_policy::Role;

/// Claims carried by a session token once decoded.
///
/// `role` is typed: a token naming a role outside the closed set fails to
/// decode and the request proceeds as guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject identifier.
    pub sub: Uuid,

    /// The subject's role at issuance time.
    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate a token's claims.
///
/// Signature verification happens before this; here only the time window is
/// judged, as a pure function of `(claims, now)`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), SessionError> {
    if claims.expires_at <= claims.issued_at {
        return Err(SessionError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(SessionError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(SessionError::Expired);
    }
    Ok(())
}

/// Verifies a raw bearer token into claims.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError>;
}

/// HS256 verifier over a shared secret.
pub struct Hs256SessionVerifier {
    key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
}

impl Hs256SessionVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        // Time-window validation is `validate_claims`'s job; jsonwebtoken
        // only checks the signature here.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: jsonwebtoken::DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionVerifier for Hs256SessionVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|err| SessionError::Malformed(err.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_valid_for(minutes: i64) -> (SessionClaims, DateTime<Utc>) {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: Uuid::now_v7(),
            role: Role::Client,
            issued_at: now,
            expires_at: now + Duration::minutes(minutes),
        };
        (claims, now)
    }

    fn mint(secret: &[u8], claims: &SessionClaims) -> String {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            claims,
            &jsonwebtoken::EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn claims_inside_the_window_validate() {
        let (claims, now) = claims_valid_for(10);
        assert_eq!(validate_claims(&claims, now + Duration::minutes(5)), Ok(()));
    }

    #[test]
    fn expired_claims_are_rejected() {
        let (claims, now) = claims_valid_for(10);
        assert_eq!(
            validate_claims(&claims, now + Duration::minutes(10)),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn future_claims_are_rejected() {
        let (claims, now) = claims_valid_for(10);
        assert_eq!(
            validate_claims(&claims, now - Duration::seconds(1)),
            Err(SessionError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let (mut claims, now) = claims_valid_for(10);
        claims.expires_at = claims.issued_at;
        assert_eq!(
            validate_claims(&claims, now),
            Err(SessionError::InvalidTimeWindow)
        );
    }

    #[test]
    fn verifier_round_trips_a_signed_token() {
        let secret = b"test-secret";
        let (claims, now) = claims_valid_for(10);
        let token = mint(secret, &claims);

        let verifier = Hs256SessionVerifier::new(secret);
        let verified = verifier.verify(&token, now + Duration::minutes(1)).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn verifier_rejects_a_foreign_signature() {
        let (claims, now) = claims_valid_for(10);
        let token = mint(b"other-secret", &claims);

        let verifier = Hs256SessionVerifier::new(b"test-secret");
        assert!(matches!(
            verifier.verify(&token, now),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn verifier_rejects_unknown_roles_in_claims() {
        // Hand-build a payload with a role outside the closed set.
        let now = Utc::now();
        let payload = serde_json::json!({
            "sub": Uuid::now_v7(),
            "role": "superuser",
            "issued_at": now,
            "expires_at": now + Duration::minutes(10),
        });
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let verifier = Hs256SessionVerifier::new(b"test-secret");
        assert!(matches!(
            verifier.verify(&token, now),
            Err(SessionError::Malformed(_))
        ));
    }
}
