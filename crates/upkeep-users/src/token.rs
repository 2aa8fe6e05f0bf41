//! Minimal HS256 JWTs.
//!
//! Only what the gateway needs: sign a fixed claim set, verify signature and
//! expiry. Header must be `{"alg":"HS256","typ":"JWT"}`; anything else is
//! rejected so a client cannot downgrade to `alg: none`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Result, UserError};
use crate::types::PublicUser;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    /// A TTL too large for `Duration` saturates instead of panicking.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX),
        }
    }

    /// Sign a token for `user`, valid for the configured TTL from now.
    pub fn issue(&self, user: &PublicUser) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl.num_seconds()),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String> {
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| UserError::InvalidToken(e.to_string()))?;

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string().as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);
        let message = format!("{header_b64}.{claims_b64}");

        let sig = self.mac()?.chain_update(message.as_bytes()).finalize();
        let sig_b64 = URL_SAFE_NO_PAD.encode(sig.into_bytes());
        Ok(format!("{message}.{sig_b64}"))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected three segments"));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != "HS256" {
            return Err(invalid("unsupported algorithm"));
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| invalid("signature is not base64url"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| invalid("signature mismatch"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(invalid("token expired"));
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| invalid("invalid HMAC key length"))
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("segment is not valid JSON"))
}

fn invalid(reason: &str) -> UserError {
    UserError::InvalidToken(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PublicUser {
        PublicUser {
            id: "u-1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new("secret", 168);
        let token = signer.issue(&alice()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.id, "u-1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn oversized_ttl_saturates() {
        let signer = TokenSigner::new("secret", 1_000_000_000_000_000);
        let token = signer.issue(&alice()).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenSigner::new("secret", 1).issue(&alice()).unwrap();
        let err = TokenSigner::new("other", 1).verify(&token).unwrap_err();
        assert!(err.to_string().contains("signature mismatch"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("secret", 1);
        let now = Utc::now().timestamp();
        let token = signer
            .sign(&Claims {
                id: "u-1".to_string(),
                email: "a@b.c".to_string(),
                name: "A".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        let err = signer.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let signer = TokenSigner::new("secret", 1);
        let token = signer.issue(&alice()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = alice();
        forged.id = "u-admin".to_string();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                id: forged.id,
                email: forged.email,
                name: forged.name,
                iat: 0,
                exp: i64::MAX,
            })
            .unwrap(),
        );
        let tampered = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert!(signer.verify(&tampered).is_err());
    }

    #[test]
    fn alg_none_is_rejected() {
        let signer = TokenSigner::new("secret", 1);
        let token = signer.issue(&alice()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{}.{}.", none_header, parts[1]);
        assert!(signer.verify(&forged).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let signer = TokenSigner::new("secret", 1);
        assert!(signer.verify("").is_err());
        assert!(signer.verify("a.b").is_err());
        assert!(signer.verify("a.b.c.d").is_err());
        assert!(signer.verify("!!!.???.***").is_err());
    }
}
