//! Static application settings
//!
//! Pedagogical parameters, per-grade tuning and the MVP module catalogue.
//! These are compile-time constants; nothing here reads the environment.

use serde::Serialize;

use crate::schema::{GradeLevel, Subject, SupportLevel};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub learning: LearningSettings,
    pub accessibility: AccessibilityOptions,
    pub grade_configs: GradeConfigs,
    pub gamification: Gamification,
    pub analytics: AnalyticsSettings,
    pub limits: Limits,
    pub urls: Urls,
    pub mvp_modules: &'static [MvpModule],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSettings {
    pub difficulty_levels: u8,
    /// Percent
    pub success_threshold: u8,
    /// Percent
    pub mastery_threshold: u8,
    pub adaptation: AdaptationSettings,
    pub session: SessionSettings,
    pub ai_tutor: AiTutorSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationSettings {
    pub min_attempts_before_adaptation: u32,
    pub max_difficulty_adjustment: i8,
    /// 0-1
    pub adaptation_sensitivity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub recommended_duration_minutes: u32,
    pub max_duration_minutes: u32,
    pub break_interval_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTutorSettings {
    pub max_hints_per_activity: u32,
    pub hint_delay_seconds: u32,
    /// 0-1
    pub encouragement_frequency: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityOptions {
    pub font_sizes: FontSizes,
    pub contrasts: Contrasts,
    pub animation_duration: AnimationDurations,
}

#[derive(Debug, Clone, Serialize)]
pub struct FontSizes {
    pub small: &'static str,
    pub medium: &'static str,
    pub large: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contrasts {
    pub normal: &'static str,
    pub high: &'static str,
}

/// Milliseconds
#[derive(Debug, Clone, Serialize)]
pub struct AnimationDurations {
    pub fast: u32,
    pub normal: u32,
    pub slow: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct GradeConfigs {
    pub cp: GradeConfig,
    pub ce1: GradeConfig,
    pub ce2: GradeConfig,
}

/// Tuning for one grade level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeConfig {
    /// Minutes
    pub session_duration: u32,
    pub max_activities_per_session: u32,
    pub adaptation_sensitivity: f64,
    pub ai_tutor_level: SupportLevel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gamification {
    pub points_per_activity: u32,
    pub bonus_per_mastery: u32,
    pub streak_bonus: u32,
    pub achievements: Achievements,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievements {
    pub first_completion: Achievement,
    pub perfect_streak: Achievement,
    pub persistence: Achievement,
    pub fast_learner: Achievement,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub points: u32,
    pub badge: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
    /// 0-1
    pub sample_rate: f64,
    pub max_events_per_session: u32,
    pub batch_size: u32,
    pub events: AnalyticsEvents,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvents {
    pub activity_start: &'static str,
    pub activity_complete: &'static str,
    pub error_made: &'static str,
    pub hint_requested: &'static str,
    pub adaptation_triggered: &'static str,
    pub session_end: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_students_per_class: u32,
    pub max_classes_per_teacher: u32,
    pub max_progress_history_days: u32,
    #[serde(rename = "maxAIInteractionsPerDay")]
    pub max_ai_interactions_per_day: u32,
    #[serde(rename = "maxFileUploadSizeMB")]
    pub max_file_upload_size_mb: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Urls {
    pub support: &'static str,
    pub documentation: &'static str,
    pub privacy: &'static str,
    pub terms: &'static str,
}

/// A module shipped in the first release
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpModule {
    pub id: &'static str,
    pub name: &'static str,
    pub grade_level: GradeLevel,
    pub subject: Subject,
    pub priority: u8,
}

pub static APP_SETTINGS: AppSettings = AppSettings {
    name: "ENAA",
    description: "Environnement Numérique d'Apprentissage Adaptatif",
    version: "1.0.0",
    learning: LearningSettings {
        difficulty_levels: 5,
        success_threshold: 70,
        mastery_threshold: 85,
        adaptation: AdaptationSettings {
            min_attempts_before_adaptation: 3,
            max_difficulty_adjustment: 2,
            adaptation_sensitivity: 0.1,
        },
        session: SessionSettings {
            recommended_duration_minutes: 20,
            max_duration_minutes: 45,
            break_interval_minutes: 15,
        },
        ai_tutor: AiTutorSettings {
            max_hints_per_activity: 3,
            hint_delay_seconds: 30,
            encouragement_frequency: 0.3,
        },
    },
    accessibility: AccessibilityOptions {
        font_sizes: FontSizes {
            small: "14px",
            medium: "16px",
            large: "20px",
        },
        contrasts: Contrasts {
            normal: "normal",
            high: "high-contrast",
        },
        animation_duration: AnimationDurations {
            fast: 200,
            normal: 300,
            slow: 500,
        },
    },
    grade_configs: GradeConfigs {
        cp: GradeConfig {
            session_duration: 15,
            max_activities_per_session: 3,
            adaptation_sensitivity: 0.2,
            ai_tutor_level: SupportLevel::Scaffolded,
        },
        ce1: GradeConfig {
            session_duration: 20,
            max_activities_per_session: 4,
            adaptation_sensitivity: 0.15,
            ai_tutor_level: SupportLevel::Guided,
        },
        ce2: GradeConfig {
            session_duration: 25,
            max_activities_per_session: 5,
            adaptation_sensitivity: 0.1,
            ai_tutor_level: SupportLevel::Minimal,
        },
    },
    gamification: Gamification {
        points_per_activity: 10,
        bonus_per_mastery: 50,
        streak_bonus: 5,
        achievements: Achievements {
            first_completion: Achievement {
                points: 20,
                badge: "first-steps",
            },
            perfect_streak: Achievement {
                points: 100,
                badge: "perfectionist",
            },
            persistence: Achievement {
                points: 50,
                badge: "persistent",
            },
            fast_learner: Achievement {
                points: 75,
                badge: "speedy",
            },
        },
    },
    analytics: AnalyticsSettings {
        sample_rate: 1.0,
        max_events_per_session: 100,
        batch_size: 10,
        events: AnalyticsEvents {
            activity_start: "activity_start",
            activity_complete: "activity_complete",
            error_made: "error_made",
            hint_requested: "hint_requested",
            adaptation_triggered: "adaptation_triggered",
            session_end: "session_end",
        },
    },
    limits: Limits {
        max_students_per_class: 30,
        max_classes_per_teacher: 5,
        max_progress_history_days: 365,
        max_ai_interactions_per_day: 100,
        max_file_upload_size_mb: 5,
    },
    urls: Urls {
        support: "https://enaa.support",
        documentation: "https://docs.enaa.app",
        privacy: "https://enaa.app/privacy",
        terms: "https://enaa.app/terms",
    },
    mvp_modules: &[
        MvpModule {
            id: "structures-additives",
            name: "Structures Additives",
            grade_level: GradeLevel::Ce1,
            subject: Subject::Mathematics,
            priority: 1,
        },
        MvpModule {
            id: "multiplication",
            name: "Multiplication",
            grade_level: GradeLevel::Ce2,
            subject: Subject::Mathematics,
            priority: 2,
        },
        MvpModule {
            id: "division",
            name: "Division",
            grade_level: GradeLevel::Ce2,
            subject: Subject::Mathematics,
            priority: 3,
        },
    ],
};

/// Tuning for a grade level
pub fn grade_config(grade: GradeLevel) -> &'static GradeConfig {
    let configs = &APP_SETTINGS.grade_configs;
    match grade {
        GradeLevel::Cp => &configs.cp,
        GradeLevel::Ce1 => &configs.ce1,
        GradeLevel::Ce2 => &configs.ce2,
    }
}

/// Look up an MVP module by id
pub fn mvp_module(id: &str) -> Option<&'static MvpModule> {
    APP_SETTINGS.mvp_modules.iter().find(|m| m.id == id)
}
