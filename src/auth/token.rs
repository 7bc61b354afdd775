use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::time::now_timestamp;
use crate::web::user::User;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub uid: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature does not match")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Signs and verifies HS256 access tokens.
pub struct TokenKeys {
    key: hmac::Key,
    ttl_secs: i64,
}

impl TokenKeys {
    /// A zero `ttl_minutes` issues tokens that are already expired.
    pub fn new(secret: &[u8], ttl_minutes: u32) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            ttl_secs: i64::from(ttl_minutes) * 60,
        }
    }

    /// Per-process secret. Tokens stop verifying after a restart.
    pub fn random(ttl_minutes: u32) -> anyhow::Result<Self> {
        let mut secret = [0u8; 32];
        SystemRandom::new()
            .fill(&mut secret)
            .map_err(|_| anyhow::anyhow!("generating token secret"))?;
        Ok(Self::new(&secret, ttl_minutes))
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, now_timestamp())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, now_timestamp())
    }

    fn issue_at(&self, user: &User, now: i64) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| anyhow::anyhow!("token expiry overflows at {}", now))?;
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            iat: now,
            exp,
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(tag.as_ref())
        ))
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header: Header = decode_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input = format!("{}.{}", header_b64, claims_b64);
        hmac::verify(&self.key, signing_input.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = decode_json(claims_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            hashed_password: String::new(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = TokenKeys::new(b"secret", 30);
        let token = keys.issue_at(&user(), 1_000).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = keys.verify_at(&token, 1_001).unwrap();
        assert_eq!(claims.sub, "testuser");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.exp, 1_000 + 30 * 60);
    }

    #[test]
    fn test_expired_token() {
        let keys = TokenKeys::new(b"secret", 1);
        let token = keys.issue_at(&user(), 1_000).unwrap();
        assert_eq!(keys.verify_at(&token, 1_060), Err(TokenError::Expired));
        assert!(keys.verify_at(&token, 1_059).is_ok());
    }

    #[test]
    fn test_largest_ttl_does_not_overflow() {
        let keys = TokenKeys::new(b"secret", u32::MAX);
        let token = keys.issue_at(&user(), 1_000).unwrap();
        let claims = keys.verify_at(&token, 1_001).unwrap();
        assert_eq!(claims.exp, 1_000 + i64::from(u32::MAX) * 60);

        assert!(keys.issue_at(&user(), i64::MAX - 10).is_err());
    }

    #[test]
    fn test_zero_ttl_is_expired_on_issue() {
        let keys = TokenKeys::new(b"secret", 0);
        let token = keys.issue_at(&user(), 1_000).unwrap();
        assert_eq!(keys.verify_at(&token, 1_000), Err(TokenError::Expired));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = TokenKeys::new(b"secret", 30).issue_at(&user(), 1_000).unwrap();
        let other = TokenKeys::new(b"another secret", 30);
        assert_eq!(other.verify_at(&token, 1_001), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let keys = TokenKeys::new(b"secret", 30);
        let token = keys.issue_at(&user(), 1_000).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD
            .encode(r#"{"sub":"admin","uid":1,"iat":1000,"exp":99999999999}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(keys.verify_at(&forged, 1_001), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let keys = TokenKeys::new(b"secret", 30);
        assert_eq!(keys.verify_at("", 0), Err(TokenError::Malformed));
        assert_eq!(keys.verify_at("a.b", 0), Err(TokenError::Malformed));
        assert_eq!(keys.verify_at("a.b.c.d", 0), Err(TokenError::Malformed));
        assert_eq!(keys.verify_at("!!.??.**", 0), Err(TokenError::Malformed));
    }

    #[test]
    fn test_alg_none_is_rejected() {
        let keys = TokenKeys::new(b"secret", 30);
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(r#"{"sub":"x","uid":1,"iat":0,"exp":99999999999}"#);
        let token = format!("{}.{}.", header, claims);
        assert_eq!(
            keys.verify_at(&token, 1),
            Err(TokenError::UnsupportedAlgorithm("none".to_string()))
        );
    }
}
