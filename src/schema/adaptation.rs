//! Adaptation schema
//!
//! Rules attached to a module and the ephemeral decisions produced when an
//! adaptation fires. Decisions are never persisted.

use serde::{Deserialize, Serialize};

use super::{Activity, Json, Representation, SupportLevel, DIFFICULTY_ADJUSTMENT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRule {
    pub id: String,
    pub condition: String,
    pub action: AdaptationAction,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationActionType {
    AdjustDifficulty,
    ChangeRepresentation,
    ProvideScaffolding,
    SuggestBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationAction {
    #[serde(rename = "type")]
    pub kind: AdaptationActionType,
    #[serde(default)]
    pub parameters: serde_json::Map<String, Json>,
}

/// A single adaptation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationDecision {
    pub next_activity: Activity,
    /// -2 to +2
    pub difficulty_adjustment: i8,
    pub support_level: SupportLevel,
    pub representation_mode: Representation,
    pub ai_hint_strategy: HintStrategy,
    pub rationale: String,
}

impl AdaptationDecision {
    /// Adjustment within bounds and a valid target activity
    pub fn is_valid(&self) -> bool {
        DIFFICULTY_ADJUSTMENT.contains(&self.difficulty_adjustment)
            && self.next_activity.config.is_valid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintLevel {
    Minimal,
    Moderate,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintType {
    Procedural,
    Conceptual,
    Strategic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintTiming {
    Immediate,
    Delayed,
    OnRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintStrategy {
    pub level: HintLevel,
    #[serde(rename = "type")]
    pub kind: HintType,
    pub timing: HintTiming,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_deserializes() {
        let rule: AdaptationRule = serde_json::from_value(json!({
            "id": "r1",
            "condition": "accuracy < 50",
            "action": { "type": "provide_scaffolding", "parameters": { "level": "scaffolded" } },
            "priority": 1,
            "is_active": true
        }))
        .unwrap();

        assert_eq!(rule.action.kind, AdaptationActionType::ProvideScaffolding);
        assert_eq!(rule.action.parameters["level"], "scaffolded");
    }

    #[test]
    fn test_hint_timing_wire_name() {
        let strategy = HintStrategy {
            level: HintLevel::Moderate,
            kind: HintType::Conceptual,
            timing: HintTiming::OnRequest,
        };
        assert_eq!(
            serde_json::to_value(strategy).unwrap(),
            json!({ "level": "moderate", "type": "conceptual", "timing": "on_request" })
        );
    }

    #[test]
    fn test_decision_bounds() {
        let mut decision = AdaptationDecision {
            next_activity: crate::schema::fixtures::activity("a2", "s1", 1),
            difficulty_adjustment: 2,
            support_level: SupportLevel::Minimal,
            representation_mode: Representation::Abstract,
            ai_hint_strategy: HintStrategy {
                level: HintLevel::Minimal,
                kind: HintType::Strategic,
                timing: HintTiming::Delayed,
            },
            rationale: "accuracy above mastery threshold".into(),
        };
        assert!(decision.is_valid());

        decision.difficulty_adjustment = -3;
        assert!(!decision.is_valid());
    }
}
