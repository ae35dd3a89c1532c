//! Session/Auth Bridge
//!
//! Wraps the identity provider for the client core. Credential calls only
//! toggle the loading flag; the store is driven by session-change events:
//!
//! - `SIGNED_IN` → [`ProfileResolver::resolve`]
//! - `SIGNED_OUT` → `logout()` and navigation to [`LOGIN_ROUTE`]

use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::profile::{ProfileOutcome, ProfileResolver};
use crate::backend::{AuthEvent, AuthUser, SharedBackend, SignUpMetadata};
use crate::schema::UserRole;
use crate::store::AppStore;
use crate::types::{EnaaError, Result};

/// Route shown after sign-out
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Client-side route changes
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, route: &str) {
        self(route)
    }
}

/// Navigator that only logs, for headless use
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        info!(route = %route, "Navigate");
    }
}

/// Active auth event listener. Dropping it unregisters the listener.
pub struct AuthSubscription {
    handle: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        // Drop aborts the task
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct AuthBridge {
    backend: SharedBackend,
    store: AppStore,
    resolver: ProfileResolver,
    navigator: Arc<dyn Navigator>,
}

impl AuthBridge {
    pub fn new(backend: SharedBackend, store: AppStore, navigator: Arc<dyn Navigator>) -> Self {
        let resolver = ProfileResolver::new(backend.clone(), store.clone());
        Self {
            backend,
            store,
            resolver,
            navigator,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn resolver(&self) -> &ProfileResolver {
        &self.resolver
    }

    /// Submit credentials.
    ///
    /// Success leaves the store to the `SIGNED_IN` listener. Failure clears
    /// the loading flag and returns the provider's message as [`EnaaError::Auth`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.store.set_loading(true);

        match self.backend.sign_in_with_password(email, password).await {
            Ok(session) => {
                debug!(user_id = %session.user.id, "Credentials accepted");
                Ok(())
            }
            Err(e) => {
                self.store.set_loading(false);
                Err(as_auth_error(e))
            }
        }
    }

    /// Create an account. The profile row is NOT created here; that step is
    /// done separately by an administrator.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Option<UserRole>,
    ) -> Result<AuthUser> {
        let role = role.unwrap_or_default();
        self.store.set_loading(true);

        let result = self
            .backend
            .sign_up(
                email,
                password,
                SignUpMetadata {
                    name: name.to_string(),
                    role,
                },
            )
            .await;
        self.store.set_loading(false);

        let user = result.map_err(as_auth_error)?;
        info!(
            user_id = %user.id,
            role = %role,
            "Account created; profile creation deferred"
        );
        Ok(user)
    }

    /// Terminate the external session. Local cleanup follows `SIGNED_OUT`.
    pub async fn sign_out(&self) -> Result<()> {
        self.backend.sign_out().await.map_err(as_auth_error)
    }

    /// Register the session-change listener for the lifetime of the returned guard
    pub fn subscribe(&self) -> AuthSubscription {
        // Receiver is created before returning so no event is missed
        let mut events = self.backend.subscribe();
        let bridge = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => bridge.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        let stale = drain(&mut events);
                        warn!(skipped, stale, "Auth listener lagged behind, resyncing session");
                        bridge.resync().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Auth listener stopped");
        });

        AuthSubscription { handle }
    }

    /// React to one session-change event
    pub async fn handle_event(&self, event: AuthEvent) {
        debug!(event = event.name(), "Auth event");

        match event {
            AuthEvent::SignedIn(session) => {
                self.store.set_loading(true);
                self.resolver.resolve(&session.user.id).await;
                self.store.set_loading(false);
            }
            AuthEvent::SignedOut => {
                self.store.logout();
                self.navigator.navigate(LOGIN_ROUTE);
            }
        }
    }

    /// Bring the store in line with the provider's current session.
    ///
    /// Used when session-change events were lost: no session logs out, a
    /// session is resolved like a fresh `SIGNED_IN`.
    pub async fn resync(&self) {
        match self.backend.get_session().await {
            Ok(Some(session)) => {
                self.handle_event(AuthEvent::SignedIn(session)).await;
            }
            Ok(None) => self.handle_event(AuthEvent::SignedOut).await,
            Err(e) => {
                error!(error = %e, "Session check failed during resync, forcing logout");
                self.handle_event(AuthEvent::SignedOut).await;
            }
        }
    }

    /// Startup check: hydrate from an existing external session when no user
    /// is held locally.
    ///
    /// Returns `None` when nothing was attempted (user already present or no
    /// session).
    pub async fn reconcile(&self) -> Option<ProfileOutcome> {
        if self.store.select(|s| s.current_user().is_some()) {
            return None;
        }

        self.store.set_loading(true);
        let outcome = match self.backend.get_session().await {
            Ok(Some(session)) => Some(self.resolver.hydrate(&session.user.id).await),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Session check failed");
                None
            }
        };
        self.store.set_loading(false);

        outcome
    }
}

/// Discard everything already queued; returns how many events were dropped
fn drain(events: &mut Receiver<AuthEvent>) -> u64 {
    let mut dropped = 0;
    loop {
        match events.try_recv() {
            Ok(_) => dropped += 1,
            Err(TryRecvError::Lagged(skipped)) => dropped += skipped,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return dropped,
        }
    }
}

fn as_auth_error(e: EnaaError) -> EnaaError {
    match e {
        EnaaError::Auth(_) => e,
        other => EnaaError::Auth(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::backend::{IdentityProvider, MemoryBackend};
    use std::sync::Mutex;

    fn setup() -> (Arc<MemoryBackend>, AuthBridge, Arc<Mutex<Vec<String>>>) {
        let backend = Arc::new(MemoryBackend::new(
            TokenIssuer::new("test-secret-that-is-at-least-32-characters-long", 3600)
                .unwrap(),
        ));
        let routes = Arc::new(Mutex::new(Vec::new()));
        let recorded = routes.clone();
        let navigator = move |route: &str| recorded.lock().unwrap().push(route.to_string());

        let bridge = AuthBridge::new(backend.clone(), AppStore::in_memory(), Arc::new(navigator));
        (backend, bridge, routes)
    }

    #[tokio::test]
    async fn test_failed_sign_in_clears_loading() {
        let (_backend, bridge, _) = setup();

        let err = bridge.sign_in("inconnu@ecole.fr", "secret-42").await.unwrap_err();
        assert!(matches!(err, EnaaError::Auth(_)));

        let state = bridge.store().snapshot();
        assert!(!state.is_loading());
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_defaults_to_student() {
        let (backend, bridge, _) = setup();

        let user = bridge
            .sign_up("nouveau@ecole.fr", "secret-42", "Tom", None)
            .await
            .unwrap();
        assert_eq!(user.user_metadata["role"], "student");
        assert!(!bridge.store().select(|s| s.is_loading()));

        use crate::backend::ProfileSource;
        assert!(backend.fetch_profile(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signed_out_event_navigates_to_login() {
        let (_backend, bridge, routes) = setup();
        bridge.store().toggle_sidebar();

        bridge.handle_event(AuthEvent::SignedOut).await;

        assert_eq!(routes.lock().unwrap().as_slice(), [LOGIN_ROUTE]);
        let state = bridge.store().snapshot();
        assert!(!state.is_authenticated());
        assert!(state.ui.sidebar_open);
    }

    #[tokio::test]
    async fn test_reconcile_hydrates_existing_session() {
        let (backend, bridge, _) = setup();
        backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "M. Petit", None)
            .unwrap();
        // Sign in directly so no listener runs
        backend
            .sign_in_with_password("prof@ecole.fr", "secret-42")
            .await
            .unwrap();

        assert_eq!(bridge.reconcile().await, Some(ProfileOutcome::Applied));
        assert_eq!(bridge.store().select(|s| s.user_role()), Some(UserRole::Teacher));

        // User present: nothing to do
        assert_eq!(bridge.reconcile().await, None);
    }

    #[tokio::test]
    async fn test_reconcile_without_session() {
        let (_backend, bridge, _) = setup();
        assert_eq!(bridge.reconcile().await, None);
        assert!(!bridge.store().select(|s| s.is_loading()));
    }

    #[tokio::test]
    async fn test_resync_without_session_logs_out() {
        let (backend, bridge, routes) = setup();
        let user_id = backend
            .seed_account("eleve@ecole.fr", "secret-42", UserRole::Student, "Léa", None)
            .unwrap();
        bridge.resolver().resolve(&user_id).await;
        assert!(bridge.store().select(|s| s.is_authenticated()));

        bridge.resync().await;

        assert!(!bridge.store().select(|s| s.is_authenticated()));
        assert_eq!(routes.lock().unwrap().as_slice(), [LOGIN_ROUTE]);
    }

    #[tokio::test]
    async fn test_resync_resolves_live_session() {
        let (backend, bridge, routes) = setup();
        backend
            .seed_account("prof@ecole.fr", "secret-42", UserRole::Teacher, "M. Petit", None)
            .unwrap();
        backend
            .sign_in_with_password("prof@ecole.fr", "secret-42")
            .await
            .unwrap();

        bridge.resync().await;

        assert_eq!(bridge.store().select(|s| s.user_role()), Some(UserRole::Teacher));
        assert!(!bridge.store().select(|s| s.is_loading()));
        assert!(routes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drain_counts_queued_events() {
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        for _ in 0..6 {
            tx.send(AuthEvent::SignedOut).unwrap();
        }

        // 2 overwritten + 4 still queued
        assert_eq!(drain(&mut rx), 6);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_listening() {
        let (_backend, bridge, _) = setup();
        let subscription = bridge.subscribe();
        assert!(subscription.is_active());
        subscription.unsubscribe();
    }
}
