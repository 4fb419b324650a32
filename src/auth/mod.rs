//! Session tokens
//!
//! Members are identified by an HS256 JWT issued after Discord login. The
//! token travels in the `token` cookie, or in an Authorization header for
//! API clients.
//!
//! Security notes:
//! - Secrets shorter than 32 characters are rejected
//! - Default lifetime is 15 weeks, about one semester
//! - Sudo only holds for the first day of a session

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OnboardError, Result};
use crate::member::MemberRecord;

/// Cookie holding the session token
pub const SESSION_COOKIE: &str = "token";

/// Seconds after issue during which a sudo claim is honoured
pub const DEFAULT_SUDO_LIFETIME: u64 = 24 * 60 * 60;

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Member id
    pub sub: String,
    /// Display name at issue time
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub pfp: Option<String>,
    pub sudo: bool,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn member_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| OnboardError::Unauthorized(format!("bad subject: {}", e)))
    }
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: u64,
    sudo_lifetime_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &str, lifetime_secs: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(OnboardError::Config(
                "auth.jwt_secret is required to serve".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(OnboardError::Config(
                "auth.jwt_secret must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
            sudo_lifetime_secs: DEFAULT_SUDO_LIFETIME,
        })
    }

    pub fn with_sudo_lifetime(mut self, secs: u64) -> Self {
        self.sudo_lifetime_secs = secs;
        self
    }

    /// Issue a session token for `member`.
    pub fn issue(&self, member: &MemberRecord) -> Result<String> {
        let now = unix_now()?;

        let claims = Claims {
            sub: member.id.to_string(),
            name: member.display_name(),
            pfp: member.avatar_url(),
            sudo: member.sudo,
            iat: now,
            exp: now + self.lifetime_secs,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| {
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::InvalidSignature => "invalid signature",
                    ErrorKind::InvalidToken => "invalid token",
                    _ => "token validation failed",
                };
                OnboardError::Unauthorized(reason.into())
            })
    }

    /// Allow admin access only for sudo sessions that are still fresh.
    pub fn authorize_sudo(&self, claims: &Claims) -> Result<()> {
        if !claims.sudo {
            return Err(OnboardError::Forbidden("You are not a sudoer.".into()));
        }

        if unix_now()? > claims.iat.saturating_add(self.sudo_lifetime_secs) {
            return Err(OnboardError::Forbidden(
                "Session not new enough to verify sudo status. Log in again.".into(),
            ));
        }

        Ok(())
    }
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| OnboardError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

/// Find the session cookie in a `Cookie` header.
pub fn token_from_cookies(cookie_header: Option<&str>) -> Option<&str> {
    cookie_header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn keys() -> SessionKeys {
        SessionKeys::new(SECRET, 3600).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let mut member = MemberRecord::new("1001");
        member.first_name = "Ada".into();
        member.sudo = true;

        let keys = keys();
        let token = keys.issue(&member).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.member_id().unwrap(), member.id);
        assert_eq!(claims.name, "Ada");
        assert!(claims.sudo);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_sudo_authorization() {
        let keys = keys();
        let mut member = MemberRecord::new("1001");

        let plain = keys.verify(&keys.issue(&member).unwrap()).unwrap();
        assert!(matches!(keys.authorize_sudo(&plain), Err(OnboardError::Forbidden(_))));

        member.sudo = true;
        let sudo = keys.verify(&keys.issue(&member).unwrap()).unwrap();
        assert!(keys.authorize_sudo(&sudo).is_ok());

        let stale = Claims {
            iat: sudo.iat - DEFAULT_SUDO_LIFETIME - 1,
            ..sudo
        };
        let err = keys.authorize_sudo(&stale).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

        let keys = keys.with_sudo_lifetime(u64::MAX);
        assert!(keys.authorize_sudo(&stale).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let token = keys().issue(&MemberRecord::new("1001")).unwrap();
        let other = SessionKeys::new("different-secret-that-is-at-least-32-characters", 3600).unwrap();
        assert!(matches!(other.verify(&token), Err(OnboardError::Unauthorized(_))));
    }

    #[test]
    fn test_invalid_token() {
        assert!(keys().verify("invalid-token").is_err());
    }

    #[test]
    fn test_secret_validation() {
        assert!(SessionKeys::new("short", 3600).is_err());
        assert!(SessionKeys::new("", 3600).is_err());
        assert!(SessionKeys::new(SECRET, 3600).is_ok());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_token_from_cookies() {
        assert_eq!(token_from_cookies(Some("theme=dark; token=abc.def")), Some("abc.def"));
        assert_eq!(token_from_cookies(Some("token=")), None);
        assert_eq!(token_from_cookies(Some("tokens=abc")), None);
        assert_eq!(token_from_cookies(None), None);
    }
}
