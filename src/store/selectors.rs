//! Derived read-only views, recomputed on every access

use super::state::{AppState, Theme};
use crate::schema::{
    Activity, GradeLevel, LearningModule, Notification, Profile, StudentProgress, UserRole,
};

impl AppState {
    pub fn current_user(&self) -> Option<&Profile> {
        self.user.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.user.is_loading
    }

    pub fn current_module(&self) -> Option<&LearningModule> {
        self.learning.current_module.as_ref()
    }

    pub fn current_activity(&self) -> Option<&Activity> {
        self.learning.current_activity.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.ui.theme
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.ui.notifications
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.current_user().map(|u| u.role)
    }

    pub fn grade_level(&self) -> Option<GradeLevel> {
        self.current_user().and_then(|u| u.grade_level)
    }

    pub fn class_id(&self) -> Option<&str> {
        self.current_user().and_then(|u| u.class_id.as_deref())
    }

    /// Progress of the current user on the current activity.
    ///
    /// `student_id` refers to the profile id.
    pub fn current_activity_progress(&self) -> Option<&StudentProgress> {
        let activity = self.current_activity()?;
        let user = self.current_user()?;
        self.learning
            .progress
            .iter()
            .find(|p| p.activity_id == activity.id && p.student_id == user.id)
    }

    /// Every progress record of the current user
    pub fn user_progress(&self) -> Vec<&StudentProgress> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        self.learning
            .progress
            .iter()
            .filter(|p| p.student_id == user.id)
            .collect()
    }

    /// The current user's records for activities inside `module`
    pub fn module_progress(&self, module: &LearningModule) -> Vec<&StudentProgress> {
        self.user_progress()
            .into_iter()
            .filter(|p| module.contains_activity(&p.activity_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{fixtures, ProgressStatus, UserPreferences};
    use chrono::Utc;

    fn profile(id: &str, role: UserRole) -> Profile {
        let now = Utc::now();
        Profile {
            id: id.into(),
            user_id: format!("auth-{}", id),
            role,
            name: "Léa".into(),
            avatar_url: None,
            class_id: Some("class-ce1-a".into()),
            grade_level: Some(GradeLevel::Ce1),
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn progress(activity_id: &str, student_id: &str) -> StudentProgress {
        StudentProgress {
            id: format!("{}-{}", activity_id, student_id),
            student_id: student_id.into(),
            activity_id: activity_id.into(),
            status: ProgressStatus::InProgress,
            score: 40.0,
            attempts_count: 1,
            strategies_used: Vec::new(),
            errors: Vec::new(),
            time_spent: 60,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_selectors() {
        let mut state = AppState::default();
        assert_eq!(state.user_role(), None);
        assert_eq!(state.class_id(), None);

        state.user.user = Some(profile("p1", UserRole::Student));
        assert_eq!(state.user_role(), Some(UserRole::Student));
        assert_eq!(state.grade_level(), Some(GradeLevel::Ce1));
        assert_eq!(state.class_id(), Some("class-ce1-a"));
    }

    #[test]
    fn test_current_activity_progress_requires_both() {
        let mut state = AppState::default();
        state.learning.progress = vec![progress("a1", "p1"), progress("a1", "p2")];

        state.learning.current_activity = Some(fixtures::activity("a1", "s1", 0));
        assert!(state.current_activity_progress().is_none());

        state.user.user = Some(profile("p2", UserRole::Student));
        assert_eq!(state.current_activity_progress().unwrap().student_id, "p2");

        state.learning.current_activity = None;
        assert!(state.current_activity_progress().is_none());
    }

    #[test]
    fn test_module_progress_is_scoped() {
        let mut state = AppState::default();
        state.user.user = Some(profile("p1", UserRole::Student));
        state.learning.progress = vec![
            progress("a1", "p1"),
            progress("b1", "p1"),
            progress("a2", "p1"),
            progress("a1", "p9"),
        ];

        let additive = fixtures::module("additive", &[("s1", 1, &["a1", "a2"])]);
        let multiplication = fixtures::module("mult", &[("s2", 1, &["b1"])]);

        let ids: Vec<_> = state
            .module_progress(&additive)
            .iter()
            .map(|p| p.activity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
        assert_eq!(state.module_progress(&multiplication).len(), 1);
        assert_eq!(state.user_progress().len(), 3);
    }
}
