//! Access tokens
//!
//! Claims mirror the hosted identity provider's layout (`sub`, `email`,
//! `role`), so provider tokens and tokens minted by the in-memory backend
//! decode through the same path. HS256 only.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::AuthUser;
use crate::types::{EnaaError, Result};

/// Cookie carrying the access token on browser requests
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Seconds an access token stays valid
pub const ACCESS_TOKEN_LIFETIME: u64 = 3600;

/// Seconds a refresh token stays valid (7 days)
pub const REFRESH_TOKEN_LIFETIME: u64 = 7 * 24 * 3600;

const MIN_SECRET_LEN: usize = 32;

/// Postgres role every signed-in user acts as
const AUTHENTICATED_ROLE: &str = "authenticated";

/// Purpose of a token, carried in the `typ` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Provider access tokens carry no `typ`
    #[default]
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider user id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub typ: TokenKind,
    pub iat: u64,
    pub exp: u64,
}

/// Access/refresh pair minted for one user
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Claims of the access token
    pub claims: Claims,
}

/// Signs and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(EnaaError::MissingEnv(vec!["AUTH_SECRET".into()]));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(EnaaError::Config(format!(
                "AUTH_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry an `aud` we do not pin
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    /// Access token lifetime in seconds
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub fn issue(&self, user: &AuthUser) -> Result<IssuedTokens> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let (access_token, claims) = self.sign(user, TokenKind::Access, now, self.lifetime)?;
        let (refresh_token, _) =
            self.sign(user, TokenKind::Refresh, now, REFRESH_TOKEN_LIFETIME)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            claims,
        })
    }

    fn sign(
        &self,
        user: &AuthUser,
        typ: TokenKind,
        now: u64,
        lifetime: u64,
    ) -> Result<(String, Claims)> {
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: AUTHENTICATED_ROLE.to_string(),
            typ,
            iat: now,
            exp: now + lifetime,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| EnaaError::Internal(format!("token signing failed: {}", e)))?;
        Ok((token, claims))
    }

    /// Decode an access token, checking signature and expiry.
    ///
    /// Refresh tokens are rejected: they only buy a new session.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let claims = self.decode(token)?;
        if claims.typ != TokenKind::Access {
            return Err(EnaaError::Unauthorized("not an access token".into()));
        }
        Ok(claims)
    }

    /// Decode a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<Claims> {
        let claims = self.decode(token)?;
        if claims.typ != TokenKind::Refresh {
            return Err(EnaaError::Unauthorized("not a refresh token".into()));
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::InvalidSignature => "bad token signature",
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                        "malformed token"
                    }
                    _ => "token rejected",
                };
                EnaaError::Unauthorized(reason.into())
            })
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Value of cookie `name` in a `Cookie` header value
pub fn cookie_value<'a>(header: Option<&'a str>, name: &str) -> Option<&'a str> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret-that-is-at-least-32-characters-long", 3600).unwrap()
    }

    fn user() -> AuthUser {
        AuthUser {
            id: "user-123".into(),
            email: Some("eleve@ecole.fr".into()),
            user_metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let tokens = issuer.issue(&user()).unwrap();
        assert_eq!(tokens.claims.exp - tokens.claims.iat, 3600);

        let claims = issuer.verify(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email.as_deref(), Some("eleve@ecole.fr"));
        assert_eq!(claims.role, "authenticated");

        assert_eq!(claims.typ, TokenKind::Access);

        let refresh = issuer.verify_refresh(&tokens.refresh_token).unwrap();
        assert_eq!(refresh.exp - refresh.iat, REFRESH_TOKEN_LIFETIME);
        assert_eq!(refresh.typ, TokenKind::Refresh);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let issuer = issuer();
        let tokens = issuer.issue(&user()).unwrap();

        assert!(matches!(
            issuer.verify(&tokens.refresh_token),
            Err(EnaaError::Unauthorized(ref m)) if m == "not an access token"
        ));
        assert!(issuer.verify_refresh(&tokens.access_token).is_err());
    }

    #[test]
    fn test_claims_without_typ_are_access() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"u1","role":"authenticated","iat":1,"exp":2}"#)
                .unwrap();
        assert_eq!(claims.typ, TokenKind::Access);
    }

    #[test]
    fn test_rejected_tokens() {
        assert!(matches!(
            issuer().verify("not-a-token"),
            Err(EnaaError::Unauthorized(_))
        ));

        let other =
            TokenIssuer::new("another-secret-with-more-than-32-characters", 3600).unwrap();
        let tokens = issuer().issue(&user()).unwrap();
        assert!(other.verify(&tokens.access_token).is_err());
    }

    #[test]
    fn test_secret_rules() {
        assert!(matches!(TokenIssuer::new("", 60), Err(EnaaError::MissingEnv(_))));
        assert!(matches!(TokenIssuer::new("short", 60), Err(EnaaError::Config(_))));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("bearer  abc.def ")), Some("abc.def"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("abc.def")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_cookie_value() {
        let header = "theme=dark; sb-access-token=abc.def.ghi; other=1";
        assert_eq!(cookie_value(Some(header), ACCESS_TOKEN_COOKIE), Some("abc.def.ghi"));
        assert_eq!(cookie_value(Some("theme=dark"), ACCESS_TOKEN_COOKIE), None);
        assert_eq!(cookie_value(Some("sb-access-token="), ACCESS_TOKEN_COOKIE), None);
        assert_eq!(cookie_value(None, ACCESS_TOKEN_COOKIE), None);
    }
}
