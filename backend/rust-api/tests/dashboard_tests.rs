use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn empty_day_returns_zeros_not_an_error() {
    let app = common::create_test_app().await;

    let (status, body) = common::get(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSessions"], 0);
    assert_eq!(body["totalCorrect"], 0);
    assert_eq!(body["totalIncorrect"], 0);
    assert_eq!(body["activeParticipants"], 0);
    assert_eq!(body["activeSessions"].as_array().map(Vec::len), Some(0));
    assert!(body.get("comparison").is_none() || body["comparison"].is_null());
}

#[tokio::test]
async fn unknown_group_returns_404() {
    let app = common::create_test_app().await;

    let (status, _) = common::get(&app, "/api/dashboard?groupId=missing-group").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_view_scopes_totals_and_compares_cohorts() {
    let app = common::create_test_app().await;

    // Group g1: two participants, 3 correct and 1 incorrect in total.
    let aisha = common::create_session(&app, "Aisha", Some("g1")).await;
    let bram = common::create_session(&app, "Bram", Some("g1")).await;
    for _ in 0..2 {
        common::record_attempt(&app, &aisha, true).await;
    }
    common::record_attempt(&app, &aisha, false).await;
    common::record_attempt(&app, &bram, true).await;

    // Everyone else: three participants, 10 correct and 2 incorrect.
    let cas = common::create_session(&app, "Cas", None).await;
    let dena = common::create_session(&app, "Dena", None).await;
    let eva = common::create_session(&app, "Eva", None).await;
    for _ in 0..5 {
        common::record_attempt(&app, &cas, true).await;
    }
    for _ in 0..3 {
        common::record_attempt(&app, &dena, true).await;
    }
    common::record_attempt(&app, &dena, false).await;
    for _ in 0..2 {
        common::record_attempt(&app, &eva, true).await;
    }
    common::record_attempt(&app, &eva, false).await;

    let (status, body) = common::get(&app, "/api/dashboard?groupId=g1").await;
    assert_eq!(status, StatusCode::OK);

    // Headline numbers cover the requested group only.
    assert_eq!(body["totalSessions"], 2);
    assert_eq!(body["totalCorrect"], 3);
    assert_eq!(body["totalIncorrect"], 1);
    assert_eq!(body["activeParticipants"], 2);

    assert_eq!(body["comparison"]["current"]["correct"], 3);
    assert_eq!(body["comparison"]["current"]["incorrect"], 1);
    assert_eq!(body["comparison"]["current"]["participants"], 2);
    assert_eq!(body["comparison"]["others"]["correct"], 10);
    assert_eq!(body["comparison"]["others"]["incorrect"], 2);
    assert_eq!(body["comparison"]["others"]["participants"], 3);

    assert_eq!(body["group"]["groupName"], "Groep 8");
    assert_eq!(body["group"]["schoolName"], "De Vuurtoren");

    // The unscoped view still sees everyone.
    let (_, all) = common::get(&app, "/api/dashboard").await;
    assert_eq!(all["totalSessions"], 5);
    assert_eq!(all["totalCorrect"], 13);
    assert_eq!(all["totalIncorrect"], 3);
}

#[tokio::test]
async fn active_list_orders_by_score_then_misses_then_name() {
    let app = common::create_test_app().await;

    let mira = common::create_session(&app, "mira", None).await;
    let anna = common::create_session(&app, "Anna", None).await;
    let bo = common::create_session(&app, "Bo", None).await;

    // mira and Anna: 2 correct each; Bo: 2 correct, 1 incorrect.
    for id in [&mira, &anna, &bo] {
        common::record_attempt(&app, id, true).await;
        common::record_attempt(&app, id, true).await;
    }
    common::record_attempt(&app, &bo, false).await;

    let (status, body) = common::get(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["activeSessions"]
        .as_array()
        .expect("active list")
        .iter()
        .map(|row| row["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Anna", "mira", "Bo"]);
}

#[tokio::test]
async fn timeout_override_is_accepted() {
    let app = common::create_test_app().await;
    let session_id = common::create_session(&app, "Aisha", None).await;
    common::record_attempt(&app, &session_id, true).await;

    // A generous override keeps the fresh session visible.
    let (status, body) = common::get(&app, "/api/dashboard?timeoutMs=600000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activeParticipants"], 1);
}
