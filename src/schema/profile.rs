//! Profile schema
//!
//! Domain profile of a signed-in user plus the `profiles` table shapes.
//! The profile row is owned by the identity system and keyed by `user_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable, GradeLevel, Json, Table, UserRole};
use crate::types::EnaaError;

/// Table name for profiles
pub const PROFILE_TABLE: &str = "profiles";

/// Domain profile held by the app store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Identity-provider user id this profile belongs to
    pub user_id: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(default)]
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build the domain profile from a table row, decoding the preferences column.
    ///
    /// A null preferences column yields the default preferences.
    pub fn from_row(row: ProfileRow) -> Result<Self, EnaaError> {
        let preferences = if row.preferences.is_null() {
            UserPreferences::default()
        } else {
            serde_json::from_value(row.preferences).map_err(|e| {
                EnaaError::ProfileLookup(format!("malformed preferences for {}: {}", row.id, e))
            })?
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            role: row.role,
            name: row.name,
            avatar_url: row.avatar_url,
            class_id: row.class_id,
            grade_level: row.grade_level,
            preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningRhythm {
    Slow,
    #[default]
    Normal,
    Fast,
}

/// User preferences stored in the profile's JSON column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserPreferences {
    pub theme: ThemePreference,
    pub language: Language,
    pub accessibility: AccessibilitySettings,
    pub learning: LearningPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessibilitySettings {
    pub font_size: FontSize,
    pub contrast: Contrast,
    pub animations: bool,
    pub audio_support: bool,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            font_size: FontSize::Medium,
            contrast: Contrast::Normal,
            animations: true,
            audio_support: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningPreferences {
    pub preferred_representation: super::Representation,
    pub learning_rhythm: LearningRhythm,
    pub motivational_factors: Vec<String>,
}

/// Partial preferences for a shallow merge: top-level keys present here replace
/// the corresponding keys of the stored preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemePreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilitySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning: Option<LearningPreferences>,
}

impl PreferencesPatch {
    pub fn merge_into(self, preferences: &mut UserPreferences) {
        if let Some(theme) = self.theme {
            preferences.theme = theme;
        }
        if let Some(language) = self.language {
            preferences.language = language;
        }
        if let Some(accessibility) = self.accessibility {
            preferences.accessibility = accessibility;
        }
        if let Some(learning) = self.learning {
            preferences.learning = learning;
        }
    }
}

// =============================================================================
// Table shapes
// =============================================================================

/// `profiles` read shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub role: UserRole,
    pub name: String,
    pub avatar_url: Option<String>,
    pub class_id: Option<String>,
    pub grade_level: Option<GradeLevel>,
    pub preferences: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `profiles` create shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<GradeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileInsert {
    /// Minimal create payload; everything else is server-defaulted
    pub fn new(user_id: impl Into<String>, role: UserRole, name: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            role,
            name: name.into(),
            avatar_url: None,
            class_id: None,
            grade_level: None,
            preferences: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// `profiles` patch shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable::deserialize")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable::deserialize")]
    pub class_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable::deserialize")]
    pub grade_level: Option<Option<GradeLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Table for ProfileRow {
    const NAME: &'static str = PROFILE_TABLE;
    type Row = ProfileRow;
    type Insert = ProfileInsert;
    type Update = ProfileUpdate;
}
