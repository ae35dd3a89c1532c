//! Class schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GradeLevel, Json, Table};

/// Table name for classes
pub const CLASS_TABLE: &str = "classes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdaptationLevel {
    #[default]
    Basic,
    Advanced,
}

/// Per-class settings stored in the `settings` JSON column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSettings {
    pub max_students: u32,
    pub adaptation_level: AdaptationLevel,
    pub ai_tutor_enabled: bool,
    pub parent_notifications: bool,
}

/// A teacher's class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub grade_level: GradeLevel,
    pub academic_year: String,
    pub settings: ClassSettings,
    pub created_at: DateTime<Utc>,
}

/// `classes` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub grade_level: GradeLevel,
    pub academic_year: String,
    pub settings: Json,
    pub created_at: DateTime<Utc>,
}

/// `classes` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub teacher_id: String,
    pub grade_level: GradeLevel,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `classes` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClassUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for ClassRow {
    const NAME: &'static str = CLASS_TABLE;
    type Row = ClassRow;
    type Insert = ClassInsert;
    type Update = ClassUpdate;
}
