//! AI-generated content schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable, Json, Table};

/// Table name for AI-generated content
pub const AI_GENERATED_CONTENT_TABLE: &str = "ai_generated_content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiContentType {
    Hint,
    Problem,
    Explanation,
    Encouragement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneratedContent {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub content_type: AiContentType,
    pub prompt_used: String,
    pub generated_content: serde_json::Map<String, Json>,
    /// 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiTutorSession {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    #[serde(default)]
    pub interactions: Vec<AiInteraction>,
    pub session_summary: String,
    /// 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiInteractionType {
    Question,
    Hint,
    Encouragement,
    Correction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInteraction {
    pub timestamp: DateTime<Utc>,
    pub student_input: String,
    pub ai_response: String,
    pub interaction_type: AiInteractionType,
    /// 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<u8>,
}

// =============================================================================
// Table shapes
// =============================================================================

/// `ai_generated_content` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneratedContentRow {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub content_type: AiContentType,
    pub prompt_used: String,
    pub generated_content: Json,
    pub effectiveness_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// `ai_generated_content` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneratedContentInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub student_id: String,
    pub activity_id: String,
    pub content_type: AiContentType,
    pub prompt_used: String,
    pub generated_content: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `ai_generated_content` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AiGeneratedContentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<AiContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_content: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable::deserialize")]
    pub effectiveness_score: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for AiGeneratedContentRow {
    const NAME: &'static str = AI_GENERATED_CONTENT_TABLE;
    type Row = AiGeneratedContentRow;
    type Insert = AiGeneratedContentInsert;
    type Update = AiGeneratedContentUpdate;
}
