//! Profile Resolver
//!
//! Maps an authenticated user id to its domain profile and writes the result
//! into the store. Failures are never surfaced: a missing or unreadable
//! profile forces a logged-out state.
//!
//! Each run captures the store's session epoch before the fetch and only
//! writes if the epoch is unchanged afterwards, so a response that lands
//! after a logout is dropped.

use tracing::{debug, error, info, warn};

use crate::backend::SharedBackend;
use crate::schema::Profile;
use crate::store::{Action, AppState, AppStore};
use crate::types::Result;

/// What a resolution did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// Profile written to the store
    Applied,
    /// No profile row for the user; forced logout
    Missing,
    /// Lookup or decoding failed; forced logout
    Failed,
    /// State moved on while the fetch was in flight; result dropped
    Stale,
}

#[derive(Clone)]
pub struct ProfileResolver {
    backend: SharedBackend,
    store: AppStore,
}

impl ProfileResolver {
    pub fn new(backend: SharedBackend, store: AppStore) -> Self {
        Self { backend, store }
    }

    /// Fetch without touching the store
    pub async fn fetch(&self, user_id: &str) -> Result<Option<Profile>> {
        self.backend
            .fetch_profile(user_id)
            .await?
            .map(Profile::from_row)
            .transpose()
    }

    /// Event path: replace the store's user with the fetched profile
    pub async fn resolve(&self, user_id: &str) -> ProfileOutcome {
        let epoch = self.store.session_epoch();
        self.run(user_id, move |state: &AppState| state.session_epoch() == epoch)
            .await
    }

    /// Startup path: only fill an empty user slot.
    ///
    /// Drops the result if an event populated the user meanwhile. Absence
    /// does not log out since the store already holds no user.
    pub async fn hydrate(&self, user_id: &str) -> ProfileOutcome {
        let epoch = self.store.session_epoch();
        let vacant = move |state: &AppState| {
            state.session_epoch() == epoch && state.current_user().is_none()
        };

        match self.fetch(user_id).await {
            Ok(Some(profile)) => self.apply(user_id, profile, vacant),
            Ok(None) => {
                warn!(user_id = %user_id, "No profile for existing session");
                ProfileOutcome::Missing
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile hydration failed");
                ProfileOutcome::Failed
            }
        }
    }

    async fn run<G>(&self, user_id: &str, guard: G) -> ProfileOutcome
    where
        G: Fn(&AppState) -> bool,
    {
        match self.fetch(user_id).await {
            Ok(Some(profile)) => self.apply(user_id, profile, guard),
            Ok(None) => {
                warn!(user_id = %user_id, "No profile found, forcing logout");
                self.force_logout(guard)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Profile lookup failed, forcing logout");
                if self.force_logout(guard) == ProfileOutcome::Stale {
                    return ProfileOutcome::Stale;
                }
                ProfileOutcome::Failed
            }
        }
    }

    fn apply<G>(&self, user_id: &str, profile: Profile, guard: G) -> ProfileOutcome
    where
        G: Fn(&AppState) -> bool,
    {
        let role = profile.role;
        if self
            .store
            .dispatch_if(guard, Action::SetUser(Some(Box::new(profile))))
        {
            info!(user_id = %user_id, role = %role, "Profile loaded");
            ProfileOutcome::Applied
        } else {
            debug!(user_id = %user_id, "Dropped stale profile");
            ProfileOutcome::Stale
        }
    }

    fn force_logout<G>(&self, guard: G) -> ProfileOutcome
    where
        G: Fn(&AppState) -> bool,
    {
        if self.store.dispatch_if(guard, Action::Logout) {
            ProfileOutcome::Missing
        } else {
            ProfileOutcome::Stale
        }
    }
}
