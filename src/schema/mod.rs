//! Domain schema for ENAA
//!
//! Passive shapes for every persisted entity. Each backend table comes in
//! three variants: `Row` (full read shape), `Insert` (server-defaulted
//! fields optional) and `Update` (every field optional). Nullable columns in
//! `Update` shapes are `Option<Option<T>>`: absent leaves the column alone,
//! `Some(None)` writes null.

mod adaptation;
mod ai;
mod analytics;
mod api;
mod class;
mod module;
mod notification;
mod profile;
mod progress;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

pub use adaptation::{
    AdaptationAction, AdaptationActionType, AdaptationDecision, AdaptationRule, HintLevel,
    HintStrategy, HintTiming, HintType,
};
pub use ai::{
    AiContentType, AiGeneratedContent, AiGeneratedContentInsert, AiGeneratedContentRow,
    AiGeneratedContentUpdate, AiInteraction, AiInteractionType, AiTutorSession,
    AI_GENERATED_CONTENT_TABLE,
};
pub use analytics::{
    CognitiveProfile, CompetencyLevel, CompetencyScore, Difficulty, EngagementPattern,
    Intervention, InterventionType, LearningAnalytics, LearningAnalyticsInsert,
    LearningAnalyticsRow, LearningAnalyticsUpdate, MotivationProfile, ProcedureLevel, Severity,
    StrategyPreference, TemporalProfile, LEARNING_ANALYTICS_TABLE,
};
pub use api::{ApiResponse, ApiStatus, PaginatedResponse, Pagination};
pub use class::{
    AdaptationLevel, Class, ClassInsert, ClassRow, ClassSettings, ClassUpdate, CLASS_TABLE,
};
pub use module::{
    Activity, ActivityConfig, ActivityContent, ActivityInsert, ActivityRow, ActivityType,
    ActivityUpdate, AdaptiveParameters, Competency, CompetencyType, FeedbackFrequency,
    Interaction, InteractionKind, InteractionMode, LearningModule, LearningModuleInsert,
    LearningModuleRow, LearningModuleUpdate, LearningObjective, Material, MaterialType,
    MediaAsset, MediaType, NextAction, ObjectiveType, Phase, PhaseType, ProgressionMarker,
    Representation, Sequence, SequenceInsert, SequenceRow, SequenceUpdate, SuccessCriteria,
    SupportLevel, ValidationRule, ACTIVITY_TABLE, DIFFICULTY_ADJUSTMENT, DIFFICULTY_LEVELS,
    LEARNING_MODULE_TABLE, SEQUENCE_TABLE,
};
pub use notification::{
    NewNotification, Notification, NotificationAction, NotificationKind, NotificationVariant,
};
pub use profile::{
    AccessibilitySettings, Contrast, FontSize, Language, LearningPreferences, LearningRhythm,
    PreferencesPatch, Profile, ProfileInsert, ProfileRow, ProfileUpdate, ThemePreference,
    UserPreferences, PROFILE_TABLE,
};
pub use progress::{
    ErrorPattern, ProgressStatus, Strategy, StudentProgress, StudentProgressInsert,
    StudentProgressRow, StudentProgressUpdate, SCORE_RANGE, STUDENT_PROGRESS_TABLE,
};

#[cfg(test)]
pub(crate) use module::fixtures;

/// Free-form JSON column
pub type Json = serde_json::Value;

/// A backend table with its three shape variants
pub trait Table {
    /// Table name on the backend
    const NAME: &'static str;
    /// Full read shape
    type Row: Serialize + DeserializeOwned + Send;
    /// Create shape (server-defaulted fields optional)
    type Insert: Serialize + Send;
    /// Patch shape (every field optional)
    type Update: Serialize + Default + Send;
}

/// User roles known to the identity system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Parent,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Parent => "parent",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// French primary school levels covered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradeLevel {
    Cp,
    Ce1,
    Ce2,
}

impl GradeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Cp => "CP",
            GradeLevel::Ce1 => "CE1",
            GradeLevel::Ce2 => "CE2",
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Mathematics,
    French,
    Science,
}

/// Serde helper for `Option<Option<T>>` patch fields.
///
/// A present `null` becomes `Some(None)`; an absent field stays `None`
/// through `#[serde(default)]`.
pub(crate) mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(UserRole::Teacher).unwrap(), "teacher");
        assert_eq!(serde_json::to_value(GradeLevel::Ce1).unwrap(), "CE1");
        assert_eq!(serde_json::to_value(GradeLevel::Cp).unwrap(), "CP");
        assert_eq!(serde_json::to_value(Subject::Mathematics).unwrap(), "mathematics");

        let grade: GradeLevel = serde_json::from_str("\"CE2\"").unwrap();
        assert_eq!(grade, GradeLevel::Ce2);
    }

    #[test]
    fn test_default_role_is_student() {
        assert_eq!(UserRole::default(), UserRole::Student);
    }
}
