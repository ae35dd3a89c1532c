//! Student progress schema
//!
//! One logical record per (student, activity). The store keeps at most one
//! record per `(activity_id, student_id)` key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::{nullable, Json, Table};

/// Table name for student progress
pub const STUDENT_PROGRESS_TABLE: &str = "student_progress";

pub const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Progress status.
///
/// Declared lifecycle: `not_started → in_progress → {completed, needs_review} → mastered`.
/// The store accepts any status; [`ProgressStatus::can_transition_to`] is for
/// callers computing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Mastered,
    NeedsReview,
}

impl ProgressStatus {
    /// Whether moving from `self` to `next` follows the declared lifecycle.
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(self, next: ProgressStatus) -> bool {
        use ProgressStatus::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Completed)
                | (InProgress, NeedsReview)
                | (Completed, Mastered)
                | (NeedsReview, Mastered)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub frequency: u32,
    /// 0-100
    pub effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub frequency: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misconception: Option<String>,
}

/// Progress of one student on one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub status: ProgressStatus,
    /// 0-100
    pub score: f64,
    pub attempts_count: u32,
    #[serde(default)]
    pub strategies_used: Vec<Strategy>,
    #[serde(default)]
    pub errors: Vec<ErrorPattern>,
    /// Seconds
    pub time_spent: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StudentProgress {
    /// Store de-duplication key
    pub fn key(&self) -> (&str, &str) {
        (&self.activity_id, &self.student_id)
    }

    /// Score within 0-100
    pub fn has_valid_score(&self) -> bool {
        SCORE_RANGE.contains(&self.score)
    }

    /// Whether this record has the same `(activity_id, student_id)` key as `other`
    pub fn same_key(&self, other: &StudentProgress) -> bool {
        self.key() == other.key()
    }
}

// =============================================================================
// Table shapes
// =============================================================================

/// `student_progress` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgressRow {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub status: ProgressStatus,
    pub score: f64,
    pub attempts_count: u32,
    pub strategies_used: Json,
    pub errors: Json,
    pub time_spent: u64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `student_progress` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgressInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub student_id: String,
    pub activity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies_used: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `student_progress` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StudentProgressUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies_used: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable::deserialize")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Table for StudentProgressRow {
    const NAME: &'static str = STUDENT_PROGRESS_TABLE;
    type Row = StudentProgressRow;
    type Insert = StudentProgressInsert;
    type Update = StudentProgressUpdate;
}
