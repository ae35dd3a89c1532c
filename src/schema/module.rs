//! Learning content schema
//!
//! Four-level containment: module → sequence → phase → activity. Siblings
//! are totally ordered by `order_index` (phases keep their stored order).
//! This is read-only reference data for the client core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::{AdaptationRule, GradeLevel, Json, Subject, Table};

pub const LEARNING_MODULE_TABLE: &str = "learning_modules";
pub const SEQUENCE_TABLE: &str = "sequences";
pub const ACTIVITY_TABLE: &str = "activities";

/// Valid activity difficulty levels
pub const DIFFICULTY_LEVELS: RangeInclusive<u8> = 1..=5;

/// Valid difficulty adjustments applied by adaptation
pub const DIFFICULTY_ADJUSTMENT: RangeInclusive<i8> = -2..=2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    #[default]
    Concrete,
    Pictorial,
    Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Minimal,
    #[default]
    Guided,
    Scaffolded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackFrequency {
    Immediate,
    Delayed,
    OnCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyType {
    Conceptual,
    Procedural,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveType {
    Knowledge,
    Skill,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Introduction,
    Discovery,
    Construction,
    Practice,
    Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Manipulation,
    ProblemSolving,
    Drilling,
    Assessment,
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    Individual,
    Guided,
    Autonomous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Manipulative,
    Visual,
    Audio,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    DragDrop,
    Click,
    Input,
    Drawing,
    Speech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    Continue,
    Retry,
    Hint,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Animation,
}

/// Top of the content hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub grade_level: GradeLevel,
    pub subject: Subject,
    pub order_index: i32,
    pub is_active: bool,
    #[serde(default)]
    pub competencies: Vec<Competency>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub adaptation_rules: Vec<AdaptationRule>,
}

impl LearningModule {
    /// Sequences sorted by `order_index`
    pub fn sequences_in_order(&self) -> Vec<&Sequence> {
        let mut sequences: Vec<&Sequence> = self.sequences.iter().collect();
        sequences.sort_by_key(|s| s.order_index);
        sequences
    }

    /// Every activity of the module in teaching order
    pub fn activities_in_order(&self) -> Vec<&Activity> {
        self.sequences_in_order()
            .into_iter()
            .flat_map(|sequence| {
                sequence.phases.iter().flat_map(|phase| {
                    let mut activities: Vec<&Activity> = phase.activities.iter().collect();
                    activities.sort_by_key(|a| a.order_index);
                    activities
                })
            })
            .collect()
    }

    /// Whether the activity belongs to this module's hierarchy
    pub fn contains_activity(&self, activity_id: &str) -> bool {
        self.sequences
            .iter()
            .flat_map(|s| s.phases.iter())
            .flat_map(|p| p.activities.iter())
            .any(|a| a.id == activity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competency {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CompetencyType,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub progression_markers: Vec<ProgressionMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionMarker {
    pub level: u32,
    pub description: String,
    #[serde(default)]
    pub criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub module_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<LearningObjective>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub order_index: i32,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ObjectiveType,
    #[serde(default)]
    pub assessment_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PhaseType,
    pub duration_minutes: u32,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub sequence_id: String,
    pub phase_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub interaction_mode: InteractionMode,
    pub config: ActivityConfig,
    pub content: ActivityContent,
    pub success_criteria: SuccessCriteria,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// 1 (easiest) to 5
    pub difficulty_level: u8,
    pub adaptive_parameters: AdaptiveParameters,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    pub hints_enabled: bool,
    pub ai_tutor_level: SupportLevel,
}

impl ActivityConfig {
    /// Check the declared numeric ranges
    pub fn is_valid(&self) -> bool {
        DIFFICULTY_LEVELS.contains(&self.difficulty_level)
            && DIFFICULTY_ADJUSTMENT.contains(&self.adaptive_parameters.difficulty_adjustment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveParameters {
    /// -2 to +2
    pub difficulty_adjustment: i8,
    pub representation_mode: Representation,
    pub support_level: SupportLevel,
    pub feedback_frequency: FeedbackFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityContent {
    pub title: String,
    pub instructions: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub media: Vec<MediaAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MaterialType,
    #[serde(default)]
    pub properties: serde_json::Map<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub target: String,
    #[serde(default)]
    pub validation: Vec<ValidationRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub condition: String,
    pub feedback: String,
    pub next_action: NextAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    /// Percent, 0-100
    pub completion_threshold: f64,
    /// Percent, 0-100
    pub accuracy_threshold: f64,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_threshold: Option<u32>,
}

// =============================================================================
// Table shapes
// =============================================================================

/// `learning_modules` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModuleRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub grade_level: GradeLevel,
    pub subject: Subject,
    pub order_index: i32,
    pub is_active: bool,
    pub competencies: Json,
    pub adaptation_rules: Json,
    pub created_at: DateTime<Utc>,
}

/// `learning_modules` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModuleInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub grade_level: GradeLevel,
    pub subject: Subject,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencies: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptation_rules: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `learning_modules` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LearningModuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencies: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptation_rules: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for LearningModuleRow {
    const NAME: &'static str = LEARNING_MODULE_TABLE;
    type Row = LearningModuleRow;
    type Insert = LearningModuleInsert;
    type Update = LearningModuleUpdate;
}

/// `sequences` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRow {
    pub id: String,
    pub module_id: String,
    pub name: String,
    pub description: String,
    pub objectives: Json,
    pub duration_minutes: u32,
    pub prerequisites: Json,
    pub order_index: i32,
    pub phases: Json,
    pub created_at: DateTime<Utc>,
}

/// `sequences` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub module_id: String,
    pub name: String,
    pub description: String,
    pub objectives: Json,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Json>,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `sequences` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SequenceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for SequenceRow {
    const NAME: &'static str = SEQUENCE_TABLE;
    type Row = SequenceRow;
    type Insert = SequenceInsert;
    type Update = SequenceUpdate;
}

/// `activities` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    pub sequence_id: String,
    pub phase_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub interaction_mode: InteractionMode,
    pub config: Json,
    pub content: Json,
    pub success_criteria: Json,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// `activities` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sequence_id: String,
    pub phase_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub interaction_mode: InteractionMode,
    pub config: Json,
    pub content: Json,
    pub success_criteria: Json,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `activities` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_mode: Option<InteractionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for ActivityRow {
    const NAME: &'static str = ACTIVITY_TABLE;
    type Row = ActivityRow;
    type Insert = ActivityInsert;
    type Update = ActivityUpdate;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn activity(id: &str, sequence_id: &str, order_index: i32) -> Activity {
        Activity {
            id: id.to_string(),
            sequence_id: sequence_id.to_string(),
            phase_id: format!("{}-phase", sequence_id),
            name: format!("Activity {}", id),
            kind: ActivityType::Manipulation,
            interaction_mode: InteractionMode::Guided,
            config: ActivityConfig {
                difficulty_level: 2,
                adaptive_parameters: AdaptiveParameters {
                    difficulty_adjustment: 0,
                    representation_mode: Representation::Concrete,
                    support_level: SupportLevel::Guided,
                    feedback_frequency: FeedbackFrequency::Immediate,
                },
                time_limit: None,
                hints_enabled: true,
                ai_tutor_level: SupportLevel::Scaffolded,
            },
            content: ActivityContent {
                title: format!("Activity {}", id),
                instructions: "Compte les jetons".to_string(),
                materials: Vec::new(),
                interactions: Vec::new(),
                media: Vec::new(),
            },
            success_criteria: SuccessCriteria {
                completion_threshold: 80.0,
                accuracy_threshold: 70.0,
                time_threshold: None,
                attempts_threshold: Some(3),
            },
            order_index,
        }
    }

    /// Module with one sequence per entry, each holding the given activity ids
    pub fn module(id: &str, sequences: &[(&str, i32, &[&str])]) -> LearningModule {
        LearningModule {
            id: id.to_string(),
            name: format!("Module {}", id),
            description: "Structures additives".to_string(),
            grade_level: GradeLevel::Ce1,
            subject: Subject::Mathematics,
            order_index: 1,
            is_active: true,
            competencies: Vec::new(),
            sequences: sequences
                .iter()
                .map(|(seq_id, order, activity_ids)| Sequence {
                    id: seq_id.to_string(),
                    module_id: id.to_string(),
                    name: format!("Sequence {}", seq_id),
                    description: String::new(),
                    objectives: Vec::new(),
                    duration_minutes: 20,
                    prerequisites: Vec::new(),
                    order_index: *order,
                    phases: vec![Phase {
                        id: format!("{}-phase", seq_id),
                        name: "Pratique".to_string(),
                        kind: PhaseType::Practice,
                        duration_minutes: 10,
                        activities: activity_ids
                            .iter()
                            .enumerate()
                            .map(|(i, a)| activity(a, seq_id, i as i32))
                            .collect(),
                    }],
                })
                .collect(),
            adaptation_rules: Vec::new(),
        }
    }
}
