#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use safetyquiz_api::{
    config::Config,
    create_router,
    models::{normalize::normalize_config, SessionGroup},
    services::AppState,
    storage::{MemoryContentStore, MemoryGroupDirectory, MemorySessionStore},
};

/// Full application over the in-process stores, seeded with one group
/// and a small quiz. No external services involved.
pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        dashboard_timeout_ms: 60_000,
        seed_path: None,
    };

    let quiz = normalize_config(&test_quiz_json()).expect("test quiz content is valid");

    let app_state = Arc::new(AppState::new(
        config,
        Arc::new(MemorySessionStore::new()),
        Arc::new(MemoryContentStore::read_only(quiz)),
        Arc::new(MemoryGroupDirectory::new(vec![test_group()])),
    ));

    create_router(app_state)
}

pub fn test_group() -> SessionGroup {
    SessionGroup {
        id: "g1".to_string(),
        group_name: "Groep 8".to_string(),
        school_name: "De Vuurtoren".to_string(),
        pass_key: "ZEBRA-42".to_string(),
        module_ids: vec!["basis".to_string()],
    }
}

fn test_quiz_json() -> Value {
    json!({
        "title": "Veiligheidsquiz",
        "description": "Oefenen met veilig werken",
        "modules": [{
            "id": "basis",
            "title": "Basisregels",
            "intro": "Eerst de basis",
            "questionsPerSession": 2,
            "questions": [
                {
                    "id": "q1",
                    "text": "Wat doe je bij een onveilige situatie?",
                    "options": [
                        { "id": "a", "label": "Melden", "correct": true },
                        { "id": "b", "label": "Negeren" }
                    ]
                },
                {
                    "id": "q2",
                    "text": "Welke spullen draag je altijd?",
                    "type": "multiple",
                    "options": [
                        { "id": "a", "label": "Helm", "correct": true },
                        { "id": "b", "label": "Hesje", "correct": true },
                        { "id": "c", "label": "Slippers" }
                    ]
                },
                {
                    "id": "q3",
                    "text": "Wie waarschuw je bij brand?",
                    "options": [
                        { "id": "a", "label": "De BHV'er", "correct": true },
                        { "id": "b", "label": "Niemand" }
                    ]
                }
            ]
        }]
    })
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    split(response).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split(response).await
}

async fn split(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Creates a session through the public surface and returns its id.
pub async fn create_session(app: &Router, name: &str, group_id: Option<&str>) -> String {
    let (status, body) = post(
        app,
        "/api/sessions/",
        json!({ "name": name, "groupId": group_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "session create failed: {body}");
    body["id"].as_str().expect("session id").to_string()
}

/// Posts one attempt for the given session.
pub async fn record_attempt(app: &Router, session_id: &str, is_correct: bool) {
    let (status, _) = post(
        app,
        &format!("/api/sessions/{session_id}/attempt"),
        json!({
            "moduleId": "basis",
            "questionId": "q1",
            "selectedOptionIds": [if is_correct { "a" } else { "b" }],
            "isCorrect": is_correct,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
