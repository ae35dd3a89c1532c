//! Hosted backend collaborator
//!
//! The identity provider and the profile table live on the hosted platform.
//! The core talks to them through two traits:
//!
//! - [`IdentityProvider`] - credentials, sessions and session-change events
//! - [`ProfileSource`] - single-record profile lookup by `user_id`
//!
//! [`HttpBackend`] speaks the platform's REST contract; [`MemoryBackend`]
//! implements the same contract in process for dev mode and tests.

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::schema::{Json, ProfileRow, UserRole};
use crate::types::Result;

/// Capacity of the auth event channel
pub const AUTH_EVENT_CAPACITY: usize = 16;

/// Identity-provider user attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form metadata recorded at sign-up (`name`, `role`)
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub user_metadata: Json,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token has passed its expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| exp <= chrono::Utc::now().timestamp())
            .unwrap_or(false)
    }
}

/// Session-change notification from the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "session")]
pub enum AuthEvent {
    #[serde(rename = "SIGNED_IN")]
    SignedIn(Session),
    #[serde(rename = "SIGNED_OUT")]
    SignedOut,
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn(_) => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
        }
    }
}

/// Metadata attached to a new account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub name: String,
    pub role: UserRole,
}

/// Credentials, sessions and session-change events
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email + password for a session.
    ///
    /// On success the provider also broadcasts [`AuthEvent::SignedIn`].
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account. No profile row is created.
    async fn sign_up(&self, email: &str, password: &str, metadata: SignUpMetadata)
        -> Result<AuthUser>;

    /// Terminate the current session and broadcast [`AuthEvent::SignedOut`]
    async fn sign_out(&self) -> Result<()>;

    /// Current session held by this client, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Resolve a bearer token presented by a caller into a session.
    ///
    /// `Ok(None)` means the token is not (or no longer) valid.
    async fn session_from_token(&self, token: &str) -> Result<Option<Session>>;

    /// Register for session-change events
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Profile table access
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the single profile row owned by `user_id`.
    ///
    /// `Ok(None)` when no row exists. More than one row is an error.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>>;
}

/// Everything the core needs from the hosted platform
pub trait Backend: IdentityProvider + ProfileSource {}

impl<T: IdentityProvider + ProfileSource> Backend for T {}

/// Shared handle passed to the auth bridge and RPC contexts
pub type SharedBackend = Arc<dyn Backend>;
