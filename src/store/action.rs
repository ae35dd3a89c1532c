//! Closed action catalogue
//!
//! Every state change goes through [`Action::apply`]. Each variant touches
//! exactly one partition, except `Logout` which clears User and Learning.

use chrono::Utc;

use super::state::{AppState, LearningState, Theme};
use super::ADAPTATION_HISTORY_LIMIT;
use crate::schema::{
    Activity, AdaptationDecision, LearningAnalytics, LearningModule, Notification,
    PreferencesPatch, Profile, StudentProgress,
};

/// State partition an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    User,
    Learning,
    Ui,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // User
    SetUser(Option<Box<Profile>>),
    UpdateUserPreferences(PreferencesPatch),
    SetLoading(bool),
    Logout,

    // Learning
    SetCurrentModule(Option<Box<LearningModule>>),
    SetCurrentActivity(Option<Box<Activity>>),
    UpdateProgress(Box<StudentProgress>),
    UpdateAnalytics(Box<LearningAnalytics>),
    AddAdaptationDecision(Box<AdaptationDecision>),
    ToggleAiTutor,
    StartLearningSession,
    EndLearningSession,
    ResetLearningState,

    // UI
    SetTheme(Theme),
    ToggleSidebar,
    SetSidebarOpen(bool),
    SetModalOpen(bool),
    AddNotification(Notification),
    RemoveNotification(String),
    ClearNotifications,
    ToggleFullscreen,
    SetFullscreen(bool),
}

impl Action {
    /// Stable name used in change notifications and logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetUser(_) => "setUser",
            Action::UpdateUserPreferences(_) => "updateUserPreferences",
            Action::SetLoading(_) => "setLoading",
            Action::Logout => "logout",
            Action::SetCurrentModule(_) => "setCurrentModule",
            Action::SetCurrentActivity(_) => "setCurrentActivity",
            Action::UpdateProgress(_) => "updateProgress",
            Action::UpdateAnalytics(_) => "updateAnalytics",
            Action::AddAdaptationDecision(_) => "addAdaptationDecision",
            Action::ToggleAiTutor => "toggleAITutor",
            Action::StartLearningSession => "startLearningSession",
            Action::EndLearningSession => "endLearningSession",
            Action::ResetLearningState => "resetLearningState",
            Action::SetTheme(_) => "setTheme",
            Action::ToggleSidebar => "toggleSidebar",
            Action::SetSidebarOpen(_) => "setSidebarOpen",
            Action::SetModalOpen(_) => "setModalOpen",
            Action::AddNotification(_) => "addNotification",
            Action::RemoveNotification(_) => "removeNotification",
            Action::ClearNotifications => "clearNotifications",
            Action::ToggleFullscreen => "toggleFullscreen",
            Action::SetFullscreen(_) => "setFullscreen",
        }
    }

    pub fn partition(&self) -> Partition {
        match self {
            Action::SetUser(_)
            | Action::UpdateUserPreferences(_)
            | Action::SetLoading(_)
            | Action::Logout => Partition::User,

            Action::SetCurrentModule(_)
            | Action::SetCurrentActivity(_)
            | Action::UpdateProgress(_)
            | Action::UpdateAnalytics(_)
            | Action::AddAdaptationDecision(_)
            | Action::ToggleAiTutor
            | Action::StartLearningSession
            | Action::EndLearningSession
            | Action::ResetLearningState => Partition::Learning,

            _ => Partition::Ui,
        }
    }

    /// Apply the action to `state`
    pub fn apply(self, state: &mut AppState) {
        match self {
            Action::SetUser(profile) => {
                state.user.user = profile.map(|p| *p);
                state.user.is_authenticated = state.user.user.is_some();
                state.user.is_loading = false;
            }
            Action::UpdateUserPreferences(patch) => {
                if let Some(ref mut user) = state.user.user {
                    patch.merge_into(&mut user.preferences);
                }
            }
            Action::SetLoading(loading) => {
                state.user.is_loading = loading;
            }
            Action::Logout => {
                state.user.user = None;
                state.user.is_authenticated = false;
                state.learning = LearningState::default();
                state.session_epoch += 1;
            }

            Action::SetCurrentModule(module) => {
                state.learning.current_module = module.map(|m| *m);
                state.learning.current_activity = None;
            }
            Action::SetCurrentActivity(activity) => {
                state.learning.current_activity = activity.map(|a| *a);
            }
            Action::UpdateProgress(record) => {
                let progress = &mut state.learning.progress;
                match progress.iter_mut().find(|p| p.same_key(&record)) {
                    Some(existing) => *existing = *record,
                    None => progress.push(*record),
                }
            }
            Action::UpdateAnalytics(analytics) => {
                state.learning.analytics = Some(*analytics);
            }
            Action::AddAdaptationDecision(decision) => {
                let history = &mut state.learning.adaptation_history;
                history.push(*decision);
                if history.len() > ADAPTATION_HISTORY_LIMIT {
                    let excess = history.len() - ADAPTATION_HISTORY_LIMIT;
                    history.drain(..excess);
                }
            }
            Action::ToggleAiTutor => {
                state.learning.ai_tutor_active = !state.learning.ai_tutor_active;
            }
            Action::StartLearningSession => {
                state.learning.session_start_time = Some(Utc::now());
            }
            Action::EndLearningSession => {
                state.learning.session_start_time = None;
            }
            Action::ResetLearningState => {
                // The tutor toggle survives a reset
                let ai_tutor_active = state.learning.ai_tutor_active;
                state.learning = LearningState {
                    ai_tutor_active,
                    ..LearningState::default()
                };
            }

            Action::SetTheme(theme) => {
                state.ui.theme = theme;
            }
            Action::ToggleSidebar => {
                state.ui.sidebar_open = !state.ui.sidebar_open;
            }
            Action::SetSidebarOpen(open) => {
                state.ui.sidebar_open = open;
            }
            Action::SetModalOpen(open) => {
                state.ui.modal_open = open;
            }
            Action::AddNotification(notification) => {
                state.ui.notifications.push(notification);
            }
            Action::RemoveNotification(id) => {
                state.ui.notifications.retain(|n| n.id != id);
            }
            Action::ClearNotifications => {
                state.ui.notifications.clear();
            }
            Action::ToggleFullscreen => {
                state.ui.is_fullscreen = !state.ui.is_fullscreen;
            }
            Action::SetFullscreen(fullscreen) => {
                state.ui.is_fullscreen = fullscreen;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures;

    #[test]
    fn test_partitions() {
        assert_eq!(Action::Logout.partition(), Partition::User);
        assert_eq!(Action::ToggleAiTutor.partition(), Partition::Learning);
        assert_eq!(Action::ClearNotifications.partition(), Partition::Ui);
        assert_eq!(Action::SetTheme(Theme::Dark).partition(), Partition::Ui);
    }

    #[test]
    fn test_module_switch_clears_activity() {
        let mut state = AppState::default();
        let module = fixtures::module("m1", &[("s1", 1, &["a1"])]);

        Action::SetCurrentActivity(Some(Box::new(fixtures::activity("a1", "s1", 0)))).apply(&mut state);
        Action::SetCurrentModule(Some(Box::new(module))).apply(&mut state);
        assert!(state.learning.current_activity.is_none());

        Action::SetCurrentActivity(Some(Box::new(fixtures::activity("a1", "s1", 0)))).apply(&mut state);
        Action::SetCurrentModule(None).apply(&mut state);
        assert!(state.learning.current_activity.is_none());
        assert!(state.learning.current_module.is_none());
    }

    #[test]
    fn test_reset_keeps_tutor_flag() {
        let mut state = AppState::default();
        Action::ToggleAiTutor.apply(&mut state);
        Action::StartLearningSession.apply(&mut state);
        Action::ResetLearningState.apply(&mut state);

        assert!(state.learning.ai_tutor_active);
        assert!(state.learning.session_start_time.is_none());
    }

    #[test]
    fn test_logout_bumps_epoch() {
        let mut state = AppState::default();
        Action::Logout.apply(&mut state);
        Action::Logout.apply(&mut state);
        assert_eq!(state.session_epoch(), 2);
    }
}
