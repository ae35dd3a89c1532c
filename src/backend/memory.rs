//! In-process backend
//!
//! Implements the identity and profile contracts against DashMaps. Passwords
//! are Argon2 hashes, access tokens are HS256 tokens signed with the auth
//! secret, and session changes go out on a broadcast channel just like the
//! hosted provider's listener API.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    AuthEvent, AuthUser, IdentityProvider, ProfileSource, Session, SignUpMetadata,
    AUTH_EVENT_CAPACITY,
};
use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::schema::{GradeLevel, Json, ProfileRow, UserRole};
use crate::types::{EnaaError, Result};

struct Account {
    user: AuthUser,
    password_hash: String,
}

/// In-memory identity provider and profile table
pub struct MemoryBackend {
    /// Accounts keyed by lowercase email
    accounts: DashMap<String, Account>,
    /// Profile rows keyed by user_id
    profiles: DashMap<String, ProfileRow>,
    tokens: TokenIssuer,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    profile_delay_ms: AtomicU64,
    fail_profile_lookups: AtomicBool,
}

impl MemoryBackend {
    pub fn new(tokens: TokenIssuer) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            accounts: DashMap::new(),
            profiles: DashMap::new(),
            tokens,
            session: RwLock::new(None),
            events,
            profile_delay_ms: AtomicU64::new(0),
            fail_profile_lookups: AtomicBool::new(false),
        }
    }

    /// Create an account together with its profile row, returning the user id
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        name: &str,
        grade_level: Option<GradeLevel>,
    ) -> Result<String> {
        let user = self.create_account(
            email,
            password,
            SignUpMetadata {
                name: name.to_string(),
                role,
            },
        )?;

        let now = Utc::now();
        self.insert_profile(ProfileRow {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            role,
            name: name.to_string(),
            avatar_url: None,
            class_id: None,
            grade_level,
            preferences: Json::Null,
            created_at: now,
            updated_at: now,
        });

        Ok(user.id)
    }

    /// Insert or replace a profile row
    pub fn insert_profile(&self, row: ProfileRow) {
        self.profiles.insert(row.user_id.clone(), row);
    }

    pub fn remove_profile(&self, user_id: &str) -> Option<ProfileRow> {
        self.profiles.remove(user_id).map(|(_, row)| row)
    }

    /// Delay every profile lookup (simulates network latency)
    pub fn set_profile_delay(&self, delay: Duration) {
        self.profile_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make every profile lookup fail with a backend error
    pub fn set_fail_profile_lookups(&self, fail: bool) {
        self.fail_profile_lookups.store(fail, Ordering::SeqCst);
    }

    /// Issue a session for a known user without a password (token minting only)
    pub fn issue_session(&self, user: &AuthUser) -> Result<Session> {
        let issued = self.tokens.issue(user)?;

        Ok(Session {
            access_token: issued.access_token,
            refresh_token: Some(issued.refresh_token),
            expires_at: Some(issued.claims.exp as i64),
            user: user.clone(),
        })
    }

    fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<AuthUser> {
        let key = email.trim().to_lowercase();
        if key.is_empty() || !key.contains('@') {
            return Err(EnaaError::Auth("Unable to validate email address: invalid format".into()));
        }
        if password.len() < 6 {
            return Err(EnaaError::Auth("Password should be at least 6 characters".into()));
        }
        if self.accounts.contains_key(&key) {
            return Err(EnaaError::Auth("User already registered".into()));
        }

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(key.clone()),
            user_metadata: serde_json::to_value(&metadata)?,
        };

        self.accounts.insert(
            key,
            Account {
                user: user.clone(),
                password_hash: hash_password(password)?,
            },
        );

        Ok(user)
    }

    fn find_user(&self, user_id: &str) -> Option<AuthUser> {
        self.accounts
            .iter()
            .find(|entry| entry.user.id == user_id)
            .map(|entry| entry.user.clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let key = email.trim().to_lowercase();

        let user = {
            let account = self
                .accounts
                .get(&key)
                .ok_or_else(|| EnaaError::Auth("Invalid login credentials".into()))?;

            if !verify_password(password, &account.password_hash)? {
                return Err(EnaaError::Auth("Invalid login credentials".into()));
            }
            account.user.clone()
        };

        let session = self.issue_session(&user)?;
        *self.session.write().await = Some(session.clone());

        info!(user_id = %user.id, "Signed in");
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<AuthUser> {
        let user = self.create_account(email, password, metadata)?;
        debug!(user_id = %user.id, "Account created");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let mut guard = self.session.write().await;
        if guard.as_ref().map(Session::is_expired).unwrap_or(false) {
            *guard = None;
        }
        Ok(guard.clone())
    }

    async fn session_from_token(&self, token: &str) -> Result<Option<Session>> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected access token");
                return Ok(None);
            }
        };

        Ok(self.find_user(&claims.sub).map(|user| Session {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: Some(claims.exp as i64),
            user,
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ProfileSource for MemoryBackend {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        let delay = self.profile_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_profile_lookups.load(Ordering::SeqCst) {
            return Err(EnaaError::Backend("profile table unavailable".into()));
        }

        Ok(self.profiles.get(user_id).map(|row| row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(
            TokenIssuer::new("test-secret-that-is-at-least-32-characters-long", 3600)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_sign_in_emits_event() {
        let backend = backend();
        let user_id = backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "Mme Martin", None)
            .unwrap();
        let mut events = backend.subscribe();

        let session = backend
            .sign_in_with_password("Prof@Ecole.fr", "secret-42")
            .await
            .unwrap();
        assert_eq!(session.user.id, user_id);

        match events.recv().await.unwrap() {
            AuthEvent::SignedIn(s) => assert_eq!(s.user.id, user_id),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(backend.get_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_is_auth_error() {
        let backend = backend();
        backend
            .seed_account("eleve@ecole.fr", "secret-42", UserRole::Student, "Léa", Some(GradeLevel::Ce1))
            .unwrap();

        let err = backend
            .sign_in_with_password("eleve@ecole.fr", "nope-nope")
            .await
            .unwrap_err();
        assert!(matches!(err, EnaaError::Auth(ref m) if m == "Invalid login credentials"));
        assert!(backend.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_creates_no_profile() {
        let backend = backend();
        let user = backend
            .sign_up(
                "nouveau@ecole.fr",
                "secret-42",
                SignUpMetadata {
                    name: "Tom".into(),
                    role: UserRole::Student,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.user_metadata["role"], "student");
        assert!(backend.fetch_profile(&user.id).await.unwrap().is_none());

        let duplicate = backend
            .sign_up(
                "nouveau@ecole.fr",
                "secret-42",
                SignUpMetadata {
                    name: "Tom".into(),
                    role: UserRole::Student,
                },
            )
            .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_token_resolves_to_session() {
        let backend = backend();
        backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "Mme Martin", None)
            .unwrap();
        let session = backend
            .sign_in_with_password("prof@ecole.fr", "secret-42")
            .await
            .unwrap();

        let resolved = backend
            .session_from_token(&session.access_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.user.id, session.user.id);

        assert!(backend.session_from_token("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let backend = backend();
        backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "Mme Martin", None)
            .unwrap();
        backend
            .sign_in_with_password("prof@ecole.fr", "secret-42")
            .await
            .unwrap();

        let mut events = backend.subscribe();
        backend.sign_out().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(backend.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_failure_switch() {
        let backend = backend();
        let user_id = backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "Mme Martin", None)
            .unwrap();

        assert!(backend.fetch_profile(&user_id).await.unwrap().is_some());

        backend.set_fail_profile_lookups(true);
        assert!(matches!(
            backend.fetch_profile(&user_id).await,
            Err(EnaaError::Backend(_))
        ));
    }
}
