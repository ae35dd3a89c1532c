//! Application State Store
//!
//! One state container with three partitions (User, Learning, UI) and a
//! closed catalogue of [`Action`]s as the only mutation path.
//!
//! Every dispatch runs to completion under a single write lock, then:
//! 1. the persisted subset is saved when it changed
//! 2. observers receive a [`StoreChange`] on the broadcast channel
//!
//! Storage failures are logged and never fail the mutation.

mod action;
mod persist;
mod selectors;
mod state;

pub use action::{Action, Partition};
pub use persist::{FileStorage, MemoryStorage, PersistedSnapshot, Persistence};
pub use state::{AppState, LearningState, Theme, UiState, UserState};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::schema::{
    Activity, AdaptationDecision, LearningAnalytics, LearningModule, NewNotification,
    PreferencesPatch, Profile, StudentProgress,
};

/// Storage key of the persisted snapshot
pub const STORAGE_KEY: &str = "enaa-app-storage";

/// Number of adaptation decisions kept in history
pub const ADAPTATION_HISTORY_LIMIT: usize = 20;

/// Capacity of the change notification channel
const CHANGE_CAPACITY: usize = 256;

/// Notification sent to observers after each mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// Monotonic mutation counter
    pub version: u64,
    /// Name of the applied action
    pub action: &'static str,
    pub partition: Partition,
}

struct StoreInner {
    state: RwLock<AppState>,
    version: AtomicU64,
    changes: broadcast::Sender<StoreChange>,
    storage: Arc<dyn Persistence>,
    last_saved: Mutex<Option<PersistedSnapshot>>,
}

/// Shared handle to the application state
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<StoreInner>,
}

impl AppStore {
    /// Open the store, rehydrating the persisted snapshot before anything else
    pub fn open(storage: Arc<dyn Persistence>) -> Self {
        let mut state = AppState::default();

        let restored = match storage.load() {
            Ok(Some(snapshot)) => {
                info!(
                    authenticated = snapshot.user.is_some(),
                    "Rehydrated {}", STORAGE_KEY
                );
                snapshot.clone().restore_into(&mut state);
                Some(snapshot)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to rehydrate {}, starting fresh", STORAGE_KEY);
                None
            }
        };

        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                version: AtomicU64::new(0),
                changes,
                storage,
                last_saved: Mutex::new(restored),
            }),
        }
    }

    /// Store without durable storage
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply an action. Returns the new version.
    pub fn dispatch(&self, action: Action) -> u64 {
        let mut state = self.write();
        self.apply_locked(&mut state, action)
    }

    /// Apply an action only if no logout happened since `epoch` was read.
    ///
    /// Returns `false` (and leaves state untouched) when the epoch moved.
    pub fn dispatch_if_epoch(&self, epoch: u64, action: Action) -> bool {
        self.dispatch_if(|state| state.session_epoch == epoch, action)
    }

    /// Apply an action only if `guard` holds on the state it would mutate.
    ///
    /// The check and the mutation happen under the same lock.
    pub fn dispatch_if(&self, guard: impl FnOnce(&AppState) -> bool, action: Action) -> bool {
        let mut state = self.write();
        if !guard(&*state) {
            debug!(action = action.name(), epoch = state.session_epoch, "Discarded stale action");
            return false;
        }
        self.apply_locked(&mut state, action);
        true
    }

    fn apply_locked(&self, state: &mut AppState, action: Action) -> u64 {
        let name = action.name();
        let partition = action.partition();

        action.apply(state);
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(action = name, version, "Store action applied");

        self.persist(PersistedSnapshot::capture(state));

        // No observers is fine
        let _ = self.inner.changes.send(StoreChange {
            version,
            action: name,
            partition,
        });

        version
    }

    fn persist(&self, snapshot: PersistedSnapshot) {
        let mut last = match self.inner.last_saved.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if last.as_ref() == Some(&snapshot) {
            return;
        }

        match self.inner.storage.save(&snapshot) {
            Ok(()) => *last = Some(snapshot),
            Err(e) => warn!(error = %e, "Failed to persist {}", STORAGE_KEY),
        }
    }

    /// Register an observer
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }

    /// Log every change at debug until the store is dropped
    pub fn spawn_change_logger(&self) -> JoinHandle<()> {
        let mut changes = self.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        debug!(version = change.version, action = change.action, "Store changed")
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Store change log lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Number of mutations applied since open
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Clone of the whole state
    pub fn snapshot(&self) -> AppState {
        self.read().clone()
    }

    /// Evaluate a selector against the current state
    pub fn select<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.read())
    }

    pub fn session_epoch(&self) -> u64 {
        self.read().session_epoch
    }

    // =========================================================================
    // User actions
    // =========================================================================

    pub fn set_user(&self, user: Option<Profile>) {
        self.dispatch(Action::SetUser(user.map(Box::new)));
    }

    /// Shallow-merge into the current user's preferences; no-op without a user
    pub fn update_user_preferences(&self, patch: PreferencesPatch) {
        self.dispatch(Action::UpdateUserPreferences(patch));
    }

    pub fn set_loading(&self, loading: bool) {
        self.dispatch(Action::SetLoading(loading));
    }

    /// Clear the user and the whole Learning partition. UI is untouched.
    pub fn logout(&self) {
        self.dispatch(Action::Logout);
    }

    // =========================================================================
    // Learning actions
    // =========================================================================

    pub fn set_current_module(&self, module: Option<LearningModule>) {
        self.dispatch(Action::SetCurrentModule(module.map(Box::new)));
    }

    pub fn set_current_activity(&self, activity: Option<Activity>) {
        self.dispatch(Action::SetCurrentActivity(activity.map(Box::new)));
    }

    /// Upsert by `(activity_id, student_id)`, replacing in place
    pub fn update_progress(&self, record: StudentProgress) {
        self.dispatch(Action::UpdateProgress(Box::new(record)));
    }

    pub fn update_analytics(&self, analytics: LearningAnalytics) {
        self.dispatch(Action::UpdateAnalytics(Box::new(analytics)));
    }

    pub fn add_adaptation_decision(&self, decision: AdaptationDecision) {
        self.dispatch(Action::AddAdaptationDecision(Box::new(decision)));
    }

    pub fn toggle_ai_tutor(&self) {
        self.dispatch(Action::ToggleAiTutor);
    }

    pub fn start_learning_session(&self) {
        self.dispatch(Action::StartLearningSession);
    }

    pub fn end_learning_session(&self) {
        self.dispatch(Action::EndLearningSession);
    }

    pub fn reset_learning_state(&self) {
        self.dispatch(Action::ResetLearningState);
    }

    // =========================================================================
    // UI actions
    // =========================================================================

    pub fn set_theme(&self, theme: Theme) {
        self.dispatch(Action::SetTheme(theme));
    }

    pub fn toggle_sidebar(&self) {
        self.dispatch(Action::ToggleSidebar);
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.dispatch(Action::SetSidebarOpen(open));
    }

    pub fn set_modal_open(&self, open: bool) {
        self.dispatch(Action::SetModalOpen(open));
    }

    /// Append a notification with a fresh id and return that id
    pub fn add_notification(&self, notification: NewNotification) -> String {
        let notification = notification.into_notification();
        let id = notification.id.clone();
        self.dispatch(Action::AddNotification(notification));
        id
    }

    pub fn remove_notification(&self, id: &str) {
        self.dispatch(Action::RemoveNotification(id.to_string()));
    }

    pub fn clear_notifications(&self) {
        self.dispatch(Action::ClearNotifications);
    }

    pub fn toggle_fullscreen(&self) {
        self.dispatch(Action::ToggleFullscreen);
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.dispatch(Action::SetFullscreen(fullscreen));
    }
}
