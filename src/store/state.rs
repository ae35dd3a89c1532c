//! Store state partitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{
    Activity, AdaptationDecision, LearningAnalytics, LearningModule, Notification, Profile,
    StudentProgress,
};

/// UI color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub user: Option<Profile>,
    /// Always `user.is_some()`
    pub is_authenticated: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningState {
    pub current_module: Option<LearningModule>,
    /// Only valid relative to `current_module`
    pub current_activity: Option<Activity>,
    /// At most one record per `(activity_id, student_id)`
    pub progress: Vec<StudentProgress>,
    pub analytics: Option<LearningAnalytics>,
    /// Chronological, bounded by [`super::ADAPTATION_HISTORY_LIMIT`]
    pub adaptation_history: Vec<AdaptationDecision>,
    pub ai_tutor_active: bool,
    pub session_start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub theme: Theme,
    pub sidebar_open: bool,
    pub modal_open: bool,
    pub notifications: Vec<Notification>,
    pub is_fullscreen: bool,
}

/// Whole application state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AppState {
    pub user: UserState,
    pub learning: LearningState,
    pub ui: UiState,
    /// Bumped by every logout; in-flight profile fetches compare against it
    #[serde(skip)]
    pub(crate) session_epoch: u64,
}

impl AppState {
    pub fn session_epoch(&self) -> u64 {
        self.session_epoch
    }
}
