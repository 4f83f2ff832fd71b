//! Bearer tokens.
//!
//! Tokens are HS256 JWTs issued by the login service with `userId`,
//! `userRole` and `exp` claims, signed with the shared `JWT_KEY`. Expiry is
//! checked against the injected clock rather than the system time.
//! [`TokenSigner`] issues the same tokens for tooling and tests.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use showtime_core::{Actor, BookingError, Result, Role, UserId};

/// Resolves a bearer token to the acting user.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` at time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthenticated`] for malformed, forged or
    /// expired tokens.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Actor>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    user_role: String,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
}

/// Verifies HS256 JWTs.
#[derive(Clone)]
pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Create a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` must be present; it is compared with the clock in `verify`.
        validation.validate_exp = false;
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Actor> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                BookingError::Unauthenticated
            })?
            .claims;

        let user_id: UserId = claims
            .user_id
            .parse()
            .map_err(|_| BookingError::Unauthenticated)?;
        let role: Role = claims
            .user_role
            .parse()
            .map_err(|_| BookingError::Unauthenticated)?;

        if claims.exp <= now.timestamp() {
            tracing::debug!(user_id = %user_id, "Rejected expired token");
            return Err(BookingError::Unauthenticated);
        }

        Ok(Actor::new(user_id, role))
    }
}

/// Issues tokens accepted by [`JwtTokenVerifier`] with the same secret.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
}

impl TokenSigner {
    /// Create a signer.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Sign a token for `actor` valid until `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the token cannot be encoded.
    pub fn sign(&self, actor: &Actor, expires_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            user_id: actor.user_id.to_string(),
            user_role: actor.role.to_string(),
            exp: expires_at.timestamp(),
            iat: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| BookingError::Internal(format!("token encoding failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn raw_token(secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_signed_token_verifies() {
        let actor = Actor::new(UserId::new(), Role::Partner);
        let token = TokenSigner::new("k").sign(&actor, now() + Duration::hours(1)).unwrap();

        let verified = JwtTokenVerifier::new("k").verify(&token, now()).unwrap();
        assert_eq!(verified, actor);
    }

    #[test]
    fn test_login_service_token_accepted() {
        let user_id = UserId::new();
        let issued = now().timestamp();
        let token = raw_token(
            "k",
            &json!({
                "userId": user_id.to_string(),
                "userRole": "admin",
                "iat": issued,
                "exp": issued + 24 * 3600,
            }),
        );

        let actor = JwtTokenVerifier::new("k").verify(&token, now()).unwrap();
        assert_eq!(actor, Actor::new(user_id, Role::Admin));
    }

    #[test]
    fn test_expired_token_rejected() {
        let actor = Actor::new(UserId::new(), Role::User);
        let token = TokenSigner::new("k").sign(&actor, now()).unwrap();

        assert_eq!(
            JwtTokenVerifier::new("k").verify(&token, now()),
            Err(BookingError::Unauthenticated)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let actor = Actor::new(UserId::new(), Role::Admin);
        let token = TokenSigner::new("k").sign(&actor, now() + Duration::hours(1)).unwrap();

        assert!(JwtTokenVerifier::new("other").verify(&token, now()).is_err());
    }

    #[test]
    fn test_missing_expiry_or_unknown_role_rejected() {
        let verifier = JwtTokenVerifier::new("k");
        let user_id = UserId::new().to_string();

        let no_exp = raw_token("k", &json!({ "userId": user_id, "userRole": "user" }));
        assert!(verifier.verify(&no_exp, now()).is_err());

        let exp = (now() + Duration::hours(1)).timestamp();
        let bad_role = raw_token(
            "k",
            &json!({ "userId": user_id, "userRole": "root", "exp": exp }),
        );
        assert!(verifier.verify(&bad_role, now()).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = JwtTokenVerifier::new("k");
        assert!(verifier.verify("", now()).is_err());
        assert!(verifier.verify("no-dot", now()).is_err());
        assert!(verifier.verify("abc.def.ghi", now()).is_err());
    }
}
