//! Learning analytics schema
//!
//! One snapshot per (student, module). The store replaces it wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Json, Strategy, Table};

/// Table name for learning analytics
pub const LEARNING_ANALYTICS_TABLE: &str = "learning_analytics";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalytics {
    pub id: String,
    pub student_id: String,
    pub module_id: String,
    #[serde(default)]
    pub competency_scores: Vec<CompetencyScore>,
    #[serde(default)]
    pub difficulties: Vec<Difficulty>,
    #[serde(default)]
    pub preferred_strategies: Vec<Strategy>,
    pub cognitive_profile: CognitiveProfile,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub competency_id: String,
    /// 0-100
    pub current_level: f64,
    /// -100 to +100
    pub progression: f64,
    /// 0-100
    pub confidence: f64,
    pub last_assessed: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub interventions: Vec<Intervention>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionType {
    Remediation,
    Reinforcement,
    Acceleration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub kind: InterventionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<f64>,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CognitiveProfile {
    pub conceptual_understanding: Vec<CompetencyLevel>,
    pub procedural_fluency: Vec<ProcedureLevel>,
    pub problem_solving_strategies: Vec<StrategyPreference>,
    pub learning_rhythm: TemporalProfile,
    pub motivational_factors: MotivationProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyLevel {
    pub domain: String,
    pub level: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureLevel {
    pub procedure: String,
    pub fluency: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPreference {
    pub strategy: String,
    pub preference_score: f64,
    pub effectiveness: f64,
}

/// Session timing habits (minutes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TemporalProfile {
    pub average_session_duration: f64,
    pub preferred_session_length: f64,
    pub optimal_time_of_day: String,
    pub fatigue_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MotivationProfile {
    pub intrinsic_factors: Vec<String>,
    pub extrinsic_factors: Vec<String>,
    pub engagement_patterns: Vec<EngagementPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementPattern {
    pub context: String,
    pub engagement_level: f64,
    /// Minutes
    pub duration: f64,
}

// =============================================================================
// Table shapes
// =============================================================================

/// `learning_analytics` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalyticsRow {
    pub id: String,
    pub student_id: String,
    pub module_id: String,
    pub competency_scores: Json,
    pub difficulties: Json,
    pub preferred_strategies: Json,
    pub cognitive_profile: Json,
    pub updated_at: DateTime<Utc>,
}

/// `learning_analytics` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalyticsInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub student_id: String,
    pub module_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competency_scores: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_strategies: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_profile: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `learning_analytics` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LearningAnalyticsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competency_scores: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_strategies: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_profile: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Table for LearningAnalyticsRow {
    const NAME: &'static str = LEARNING_ANALYTICS_TABLE;
    type Row = LearningAnalyticsRow;
    type Insert = LearningAnalyticsInsert;
    type Update = LearningAnalyticsUpdate;
}
