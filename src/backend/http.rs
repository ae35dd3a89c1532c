//! HTTP client for the hosted backend
//!
//! Speaks the platform's REST contract:
//!
//! - `POST /auth/v1/token?grant_type=password` - sign in
//! - `POST /auth/v1/token?grant_type=refresh_token` - refresh
//! - `POST /auth/v1/signup` - create account
//! - `POST /auth/v1/logout` - terminate session
//! - `GET  /auth/v1/user` - resolve a bearer token
//! - `GET  /rest/v1/<table>?<filter>` - table reads
//!
//! Every request carries the `apikey` header. Table reads authenticate with
//! the service role key when configured, otherwise with the current session.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::{
    AuthEvent, AuthUser, IdentityProvider, ProfileSource, Session, SignUpMetadata,
    AUTH_EVENT_CAPACITY,
};
use crate::schema::{Json, ProfileRow, Table};
use crate::types::{EnaaError, Result};

/// Token grant response
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

/// Error body returned by the platform (auth and REST use different keys)
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// REST client for the hosted identity provider and tables
pub struct HttpBackend {
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackend {
    /// Create a client for the given project URL and anon key
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_key: None,
            http: reqwest::Client::new(),
            session: RwLock::new(None),
            events,
        }
    }

    /// Authenticate table reads with the service role key (server side only)
    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, query)
    }

    /// Bearer used for table reads
    async fn table_bearer(&self) -> String {
        if let Some(ref key) = self.service_key {
            return key.clone();
        }
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// Turn a non-success response into an error carrying the provider's message
    async fn error_from(response: reqwest::Response, kind: fn(String) -> EnaaError) -> EnaaError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(ErrorResponse::into_message)
            .unwrap_or(body);

        kind(format!("{} ({})", message, status))
    }

    async fn store_session(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        // No receivers is fine
        let _ = self.events.send(AuthEvent::SignedIn(session));
    }

    async fn post_token(&self, grant_type: &str, body: Json) -> Result<Session> {
        let url = self.auth_url(&format!("token?grant_type={}", grant_type));

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, EnaaError::Auth).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| EnaaError::Auth(format!("Failed to parse token response: {}", e)))?;

        Ok(token.into())
    }

    /// Exchange the stored refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let session = self
            .post_token(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        debug!(user_id = %session.user.id, "Session refreshed");
        self.store_session(session.clone()).await;
        Ok(session)
    }

    /// Read rows of a table matching a PostgREST filter (e.g. `user_id=eq.42`)
    pub async fn select<T: Table>(&self, filter: &str) -> Result<Vec<T::Row>> {
        let query = if filter.is_empty() {
            "select=*".to_string()
        } else {
            format!("{}&select=*", filter)
        };
        let url = self.rest_url(T::NAME, &query);

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.table_bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, EnaaError::Backend).await);
        }

        response
            .json::<Vec<T::Row>>()
            .await
            .map_err(|e| EnaaError::Backend(format!("Failed to parse {} rows: {}", T::NAME, e)))
    }

    /// Check that a table is reachable by reading at most one row
    pub async fn probe(&self, table: &str) -> Result<usize> {
        let url = self.rest_url(table, "select=*&limit=1");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.table_bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, EnaaError::Backend).await);
        }

        let rows: Vec<Json> = response.json().await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl IdentityProvider for HttpBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .post_token(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        info!(user_id = %session.user.id, "Signed in");
        self.store_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<AuthUser> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, EnaaError::Auth).await);
        }

        let body: Json = response.json().await?;

        // With auto-confirm the provider answers with a full session
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| EnaaError::Auth(format!("Failed to parse sign-up session: {}", e)))?;
            let session = Session::from(token);
            let user = session.user.clone();
            self.store_session(session).await;
            return Ok(user);
        }

        let user = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user)
            .map_err(|e| EnaaError::Auth(format!("Failed to parse sign-up response: {}", e)))
    }

    async fn sign_out(&self) -> Result<()> {
        let current = self.session.write().await.take();

        if let Some(session) = current {
            let response = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await?;

            // Local session is gone either way
            if !response.status().is_success() {
                warn!(status = %response.status(), "Remote logout failed");
            }
        }

        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let current = self.session.read().await.clone();

        match current {
            Some(session) if session.is_expired() => match session.refresh_token {
                Some(ref refresh_token) => self.refresh(refresh_token).await.map(Some),
                None => {
                    *self.session.write().await = None;
                    Ok(None)
                }
            },
            other => Ok(other),
        }
    }

    async fn session_from_token(&self, token: &str) -> Result<Option<Session>> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await?;
                Ok(Some(Session {
                    access_token: token.to_string(),
                    refresh_token: None,
                    expires_at: None,
                    user,
                }))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Ok(None),
            _ => Err(Self::error_from(response, EnaaError::Backend).await),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ProfileSource for HttpBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        let filter = format!("user_id=eq.{}", urlencoding::encode(user_id));
        let mut rows = self.select::<ProfileRow>(&filter).await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(EnaaError::ProfileLookup(format!(
                "expected one profile for {}, found {}",
                user_id, n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let backend = HttpBackend::new("https://enaa.supabase.co/", "anon");
        assert_eq!(backend.base_url(), "https://enaa.supabase.co");
        assert_eq!(
            backend.rest_url("profiles", "user_id=eq.u1&select=*"),
            "https://enaa.supabase.co/rest/v1/profiles?user_id=eq.u1&select=*"
        );
        assert_eq!(
            backend.auth_url("token?grant_type=password"),
            "https://enaa.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "u1", "email": "eleve@ecole.fr" }
        }))
        .unwrap();

        let before = chrono::Utc::now().timestamp();
        let session = Session::from(token);
        assert!(session.expires_at.unwrap() >= before + 3600);
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_error_message_preference() {
        let err: ErrorResponse = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(err.into_message().as_deref(), Some("Invalid login credentials"));

        let err: ErrorResponse =
            serde_json::from_value(json!({ "message": "relation does not exist" })).unwrap();
        assert_eq!(err.into_message().as_deref(), Some("relation does not exist"));
    }

    #[tokio::test]
    async fn test_service_key_used_for_tables() {
        let backend = HttpBackend::new("http://localhost", "anon");
        assert_eq!(backend.table_bearer().await, "anon");

        let backend = backend.with_service_key("service");
        assert_eq!(backend.table_bearer().await, "service");
    }
}
