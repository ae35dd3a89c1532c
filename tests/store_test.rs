//! App store integration tests
//!
//! Exercises the store through its public API only: upserts, module switches,
//! logout, the bounded adaptation history, snapshot persistence and the
//! notification lifecycle.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use enaa::schema::{
    Activity, AdaptationDecision, GradeLevel, HintLevel, HintStrategy, HintTiming, HintType,
    LearningModule, NewNotification, NotificationKind, Profile, ProgressStatus, Representation,
    StudentProgress, SupportLevel, UserPreferences, UserRole,
};
use enaa::store::{AppStore, FileStorage, Persistence, Theme, STORAGE_KEY};

fn activity(id: &str) -> Activity {
    serde_json::from_value(json!({
        "id": id,
        "sequence_id": "seq-1",
        "phase_id": "phase-1",
        "name": format!("Activité {}", id),
        "type": "manipulation",
        "interaction_mode": "guided",
        "config": {
            "difficulty_level": 2,
            "adaptive_parameters": {
                "difficulty_adjustment": 0,
                "representation_mode": "concrete",
                "support_level": "guided",
                "feedback_frequency": "immediate"
            },
            "hints_enabled": true,
            "ai_tutor_level": "guided"
        },
        "content": { "title": "Compter", "instructions": "Compte les jetons" },
        "success_criteria": { "completion_threshold": 80.0, "accuracy_threshold": 70.0 },
        "order_index": 0
    }))
    .expect("valid activity")
}

fn module(id: &str, activity_ids: &[&str]) -> LearningModule {
    let activities: Vec<Activity> = activity_ids.iter().map(|a| activity(a)).collect();
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Module {}", id),
        "description": "Structures additives",
        "grade_level": "CE1",
        "subject": "mathematics",
        "order_index": 1,
        "is_active": true,
        "sequences": [{
            "id": "seq-1",
            "module_id": id,
            "name": "Séquence 1",
            "description": "",
            "duration_minutes": 20,
            "order_index": 1,
            "phases": [{
                "id": "phase-1",
                "name": "Pratique",
                "type": "practice",
                "duration_minutes": 10,
                "activities": activities
            }]
        }]
    }))
    .expect("valid module")
}

fn profile(id: &str) -> Profile {
    let now = Utc::now();
    Profile {
        id: id.to_string(),
        user_id: format!("auth-{}", id),
        role: UserRole::Student,
        name: "Léa".to_string(),
        avatar_url: None,
        class_id: Some("class-ce1".to_string()),
        grade_level: Some(GradeLevel::Ce1),
        preferences: UserPreferences::default(),
        created_at: now,
        updated_at: now,
    }
}

fn progress(student_id: &str, activity_id: &str, score: f64) -> StudentProgress {
    StudentProgress {
        id: format!("{}-{}", student_id, activity_id),
        student_id: student_id.to_string(),
        activity_id: activity_id.to_string(),
        status: ProgressStatus::InProgress,
        score,
        attempts_count: 1,
        strategies_used: Vec::new(),
        errors: Vec::new(),
        time_spent: 60,
        completed_at: None,
        created_at: Utc::now(),
    }
}

fn decision(rationale: &str) -> AdaptationDecision {
    AdaptationDecision {
        next_activity: activity("next"),
        difficulty_adjustment: 1,
        support_level: SupportLevel::Minimal,
        representation_mode: Representation::Pictorial,
        ai_hint_strategy: HintStrategy {
            level: HintLevel::Minimal,
            kind: HintType::Strategic,
            timing: HintTiming::OnRequest,
        },
        rationale: rationale.to_string(),
    }
}

#[test]
fn test_progress_upsert_is_idempotent() {
    let store = AppStore::in_memory();

    store.update_progress(progress("p1", "a1", 40.0));
    store.update_progress(progress("p1", "a2", 10.0));
    store.update_progress(progress("p1", "a1", 90.0));
    store.update_progress(progress("p1", "a1", 90.0));

    let state = store.snapshot();
    assert_eq!(state.learning.progress.len(), 2);
    // Replaced in place, order kept
    assert_eq!(state.learning.progress[0].activity_id, "a1");
    assert_eq!(state.learning.progress[0].score, 90.0);
}

#[test]
fn test_module_switch_clears_activity() {
    let store = AppStore::in_memory();
    store.set_current_module(Some(module("m1", &["a1"])));
    store.set_current_activity(Some(activity("a1")));

    store.set_current_module(Some(module("m2", &["b1"])));

    let state = store.snapshot();
    assert_eq!(state.current_module().map(|m| m.id.as_str()), Some("m2"));
    assert!(state.current_activity().is_none());
}

#[test]
fn test_logout_clears_user_and_learning_only() {
    let store = AppStore::in_memory();
    store.set_user(Some(profile("p1")));
    store.set_current_module(Some(module("m1", &["a1"])));
    store.update_progress(progress("p1", "a1", 50.0));
    store.add_adaptation_decision(decision("first"));
    store.toggle_ai_tutor();
    store.start_learning_session();
    store.set_theme(Theme::Dark);
    store.set_sidebar_open(true);
    let epoch = store.session_epoch();

    store.logout();

    let state = store.snapshot();
    assert!(state.current_user().is_none());
    assert!(!state.is_authenticated());
    assert!(state.current_module().is_none());
    assert!(state.learning.progress.is_empty());
    assert!(state.learning.adaptation_history.is_empty());
    assert!(!state.learning.ai_tutor_active);
    assert!(state.learning.session_start_time.is_none());
    assert_eq!(state.theme(), Theme::Dark);
    assert!(state.ui.sidebar_open);
    assert_eq!(store.session_epoch(), epoch + 1);
}

#[test]
fn test_adaptation_history_keeps_last_twenty() {
    let store = AppStore::in_memory();
    for i in 0..25 {
        store.add_adaptation_decision(decision(&format!("decision {}", i)));
    }

    let history = store.select(|s| s.learning.adaptation_history.clone());
    assert_eq!(history.len(), 20);
    assert_eq!(history.first().unwrap().rationale, "decision 5");
    assert_eq!(history.last().unwrap().rationale, "decision 24");
}

#[test]
fn test_module_progress_follows_hierarchy() {
    let store = AppStore::in_memory();
    store.set_user(Some(profile("p1")));
    store.update_progress(progress("p1", "a1", 50.0));
    store.update_progress(progress("p1", "b1", 70.0));
    store.update_progress(progress("someone-else", "a1", 100.0));

    let m1 = module("m1", &["a1", "a2"]);
    let ids: Vec<String> = store.select(|s| {
        s.module_progress(&m1)
            .into_iter()
            .map(|p| p.activity_id.clone())
            .collect()
    });
    assert_eq!(ids, ["a1"]);
}

#[test]
fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.json", STORAGE_KEY));

    {
        let store = AppStore::open(Arc::new(FileStorage::new(&path)));
        store.set_user(Some(profile("p1")));
        store.set_theme(Theme::Dark);
        store.set_sidebar_open(true);
        store.set_modal_open(true);
        store.update_progress(progress("p1", "a1", 50.0));
    }

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let mut keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["sidebarOpen", "theme", "user"]);

    let store = AppStore::open(Arc::new(FileStorage::new(&path)));
    let state = store.snapshot();
    assert_eq!(state.theme(), Theme::Dark);
    assert!(state.ui.sidebar_open);
    assert!(!state.ui.modal_open);
    assert!(state.is_authenticated());
    assert_eq!(state.current_user().map(|u| u.id.as_str()), Some("p1"));
    assert!(state.learning.progress.is_empty());
}

#[test]
fn test_corrupt_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, b"{not json").unwrap();

    assert!(FileStorage::new(&path).load().is_err());

    let store = AppStore::open(Arc::new(FileStorage::new(&path)));
    assert!(!store.select(|s| s.is_authenticated()));
    assert_eq!(store.select(|s| s.theme()), Theme::Light);
}

#[test]
fn test_notification_lifecycle() {
    let store = AppStore::in_memory();

    let first = store.add_notification(
        NewNotification::new(NotificationKind::Success, "Bravo", "Activité terminée")
            .with_duration(5000),
    );
    let second = store.add_notification(NewNotification::new(
        NotificationKind::Warning,
        "Attention",
        "Session bientôt terminée",
    ));
    assert_ne!(first, second);
    assert_eq!(store.select(|s| s.notifications().len()), 2);

    store.remove_notification(&first);
    let remaining: Vec<String> =
        store.select(|s| s.notifications().iter().map(|n| n.id.clone()).collect());
    assert_eq!(remaining, [second.clone()]);

    // Unknown id is a no-op
    store.remove_notification("missing");
    assert_eq!(store.select(|s| s.notifications().len()), 1);

    store.clear_notifications();
    assert!(store.select(|s| s.notifications().is_empty()));
}

#[tokio::test]
async fn test_observers_see_every_action() {
    let store = AppStore::in_memory();
    let mut changes = store.subscribe();

    store.toggle_sidebar();
    store.toggle_ai_tutor();

    let first = changes.recv().await.unwrap();
    let second = changes.recv().await.unwrap();
    assert_eq!(first.action, "toggleSidebar");
    assert_eq!(second.action, "toggleAITutor");
    assert!(second.version > first.version);
    assert_eq!(store.version(), second.version);
}
