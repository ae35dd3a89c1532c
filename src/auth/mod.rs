//! Authentication for ENAA
//!
//! Provides:
//! - Session/Auth Bridge over the identity provider
//! - Profile Resolver writing the domain profile into the store
//! - Access token generation and validation
//! - Password hashing with Argon2

pub mod bridge;
pub mod password;
pub mod profile;
pub mod token;

pub use bridge::{AuthBridge, AuthSubscription, LogNavigator, Navigator, LOGIN_ROUTE};
pub use password::{hash_password, verify_password};
pub use profile::{ProfileOutcome, ProfileResolver};
pub use token::{
    bearer_token, cookie_value, Claims, IssuedTokens, TokenIssuer, TokenKind,
    ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_LIFETIME, REFRESH_TOKEN_LIFETIME,
};
