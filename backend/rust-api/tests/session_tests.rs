use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;

#[tokio::test]
async fn create_session_returns_active_session() {
    let app = common::create_test_app().await;

    let (status, body) = common::post(
        &app,
        "/api/sessions/",
        json!({ "name": "  Aisha  ", "groupId": "g1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Aisha");
    assert_eq!(body["status"], "active");
    assert_eq!(body["groupId"], "g1");
    assert_eq!(body["startTime"], body["lastSeen"]);
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn create_session_rejects_blank_name() {
    let app = common::create_test_app().await;

    let (status, _) = common::post(&app, "/api/sessions/", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post(&app, "/api/sessions/", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_session_with_unknown_group_returns_404() {
    let app = common::create_test_app().await;

    let (status, _) = common::post(
        &app,
        "/api/sessions/",
        json!({ "name": "Aisha", "groupId": "missing-group" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attempt_for_unknown_session_is_accepted_and_dropped() {
    let app = common::create_test_app().await;
    let ghost = Uuid::new_v4().to_string();

    let (status, _) = common::post(
        &app,
        &format!("/api/sessions/{ghost}/attempt"),
        json!({
            "moduleId": "basis",
            "questionId": "q1",
            "selectedOptionIds": ["a"],
            "isCorrect": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Nothing leaked into the day's totals.
    let (status, dashboard) = common::get(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["totalSessions"], 0);
    assert_eq!(dashboard["totalCorrect"], 0);
}

#[tokio::test]
async fn stats_match_the_recorded_attempt_split() {
    let app = common::create_test_app().await;
    let session_id = common::create_session(&app, "Aisha", None).await;

    common::record_attempt(&app, &session_id, false).await;
    common::record_attempt(&app, &session_id, true).await;
    common::record_attempt(&app, &session_id, true).await;

    let (status, dashboard) = common::get(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["totalSessions"], 1);
    assert_eq!(dashboard["totalCorrect"], 2);
    assert_eq!(dashboard["totalIncorrect"], 1);

    let row = &dashboard["activeSessions"][0];
    assert_eq!(row["name"], "Aisha");
    assert_eq!(row["correct"], 2);
    assert_eq!(row["incorrect"], 1);
}

#[tokio::test]
async fn heartbeat_bumps_last_seen_and_nothing_else() {
    let app = common::create_test_app().await;
    let session_id = common::create_session(&app, "Noor", None).await;
    common::record_attempt(&app, &session_id, true).await;

    let (status, first) = common::post(
        &app,
        &format!("/api/sessions/{session_id}/heartbeat"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["lastSeen"].as_str().is_some());

    let (status, second) = common::post(
        &app,
        &format!("/api/sessions/{session_id}/heartbeat"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(second["lastSeen"].as_str() >= first["lastSeen"].as_str());

    // Repeated heartbeats never touch the counters.
    let (_, dashboard) = common::get(&app, "/api/dashboard").await;
    assert_eq!(dashboard["totalCorrect"], 1);
    assert_eq!(dashboard["totalIncorrect"], 0);
}

#[tokio::test]
async fn heartbeat_for_unknown_session_returns_404() {
    let app = common::create_test_app().await;
    let ghost = Uuid::new_v4().to_string();

    let (status, _) = common::post(
        &app,
        &format!("/api/sessions/{ghost}/heartbeat"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn complete_stores_summary_and_ends_the_session() {
    let app = common::create_test_app().await;
    let session_id = common::create_session(&app, "Aisha", None).await;
    common::record_attempt(&app, &session_id, true).await;

    let summary = json!({
        "score": 1,
        "totalQuestions": 1,
        "modules": [{
            "moduleId": "basis",
            "questions": [{
                "questionId": "q1",
                "correct": true,
                "selectedLabels": ["Melden"],
                "attempts": [{ "selectedOptionIds": ["a"], "isCorrect": true }]
            }]
        }]
    });

    let (status, body) = common::post(
        &app,
        &format!("/api/sessions/{session_id}/complete"),
        json!({ "summary": summary }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endTime"].as_str().is_some());

    // Completed sessions stay in the totals but leave the active list.
    let (_, dashboard) = common::get(&app, "/api/dashboard").await;
    assert_eq!(dashboard["totalSessions"], 1);
    assert_eq!(dashboard["activeParticipants"], 0);
}

#[tokio::test]
async fn complete_for_unknown_session_returns_404() {
    let app = common::create_test_app().await;
    let ghost = Uuid::new_v4().to_string();

    let (status, _) = common::post(
        &app,
        &format!("/api/sessions/{ghost}/complete"),
        json!({ "summary": { "score": 0, "totalQuestions": 0, "modules": [] } }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leave_marks_the_session_inactive() {
    let app = common::create_test_app().await;
    let session_id = common::create_session(&app, "Bram", None).await;

    let (status, _) = common::post(
        &app,
        &format!("/api/sessions/{session_id}/leave"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, dashboard) = common::get(&app, "/api/dashboard").await;
    assert_eq!(dashboard["totalSessions"], 1);
    assert_eq!(dashboard["activeParticipants"], 0);
}
