use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration};
use serde_json::{json, Value};
use tower::ServiceExt;

use nihongo_drill::api::{app_router, ApiState};
use nihongo_drill::{Catalog, JlptLevel, ManualClock, MemoryStore, SessionSettings, StudySession};

async fn create_test_app() -> (Router, ManualClock) {
    let clock = ManualClock::new(DateTime::from_timestamp_millis(1_704_067_200_000).unwrap());
    let settings = SessionSettings {
        level: JlptLevel::N5,
        batch_size: 10,
        seed: Some(7),
    };
    let session = StudySession::new(MemoryStore::new(), clock.clone(), Catalog::builtin(), settings).await;
    (app_router(ApiState::new(session), None), clock)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_word_batch_and_answer() {
    let (app, clock) = create_test_app().await;

    let (status, batch) = send(&app, Method::GET, "/api/words/batch", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = batch["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.len() <= 10);
    let key = items[0]["japanese"].as_str().unwrap().to_string();

    let (status, answer) = send(
        &app,
        Method::POST,
        "/api/words/answer",
        Some(json!({ "key": key, "correct": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["progress"]["state"], "learning_1");
    let expected = (clock_now_ms(&clock) + Duration::minutes(30).num_milliseconds()) as u64;
    assert_eq!(answer["progress"]["nextReviewAt"].as_u64(), Some(expected));
    assert!(answer["feedback"].as_str().unwrap().contains(&key));

    let (_, stats) = send(&app, Method::GET, "/api/words/stats", None).await;
    assert_eq!(stats["learning"], 1);
    assert_eq!(stats["due"], stats["total"].as_u64().unwrap() - 1);
}

fn clock_now_ms(clock: &ManualClock) -> i64 {
    use nihongo_drill::Clock;
    clock.now().timestamp_millis()
}

#[tokio::test]
async fn test_unknown_word_is_not_found() {
    let (app, _) = create_test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/words/answer",
        Some(json!({ "key": "存在しない", "correct": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_category_filter() {
    let (app, _) = create_test_app().await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/words/filter",
        Some(json!({ "categories": ["verb"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, batch) = send(&app, Method::GET, "/api/words/batch", None).await;
    let items = batch["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|item| item["category"] == "verb"));
}

#[tokio::test]
async fn test_level_switch() {
    let (app, _) = create_test_app().await;
    let (status, body) = send(&app, Method::PUT, "/api/level", Some(json!({ "level": "N4" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], "N4");
    assert!(body["words"]["total"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_particle_question_and_answer() {
    let (app, _) = create_test_app().await;

    let (status, question) = send(&app, Method::GET, "/api/particles/question", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(question["options"].as_array().unwrap().len(), 4);
    let correct = question["example"]["correct"].as_str().unwrap().to_string();

    let (status, result) = send(
        &app,
        Method::POST,
        "/api/particles/answer",
        Some(json!({ "questionId": question["id"], "particle": correct })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["correct"], true);
    assert_eq!(result["questionId"], question["id"]);
    assert_eq!(result["tier"], "beginner");

    let (_, stats) = send(&app, Method::GET, "/api/particles/stats", None).await;
    assert_eq!(stats["attempts"], 1);
    assert_eq!(stats["correct"], 1);
}

#[tokio::test]
async fn test_particle_answer_conflicts() {
    let (app, _) = create_test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/particles/answer",
        Some(json!({ "particle": "は" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, first) = send(&app, Method::GET, "/api/particles/question", None).await;
    let (_, _second) = send(&app, Method::GET, "/api/particles/question", None).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/particles/answer",
        Some(json!({ "questionId": first["id"], "particle": "は" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reset() {
    let (app, _) = create_test_app().await;
    let (_, batch) = send(&app, Method::GET, "/api/words/batch", None).await;
    let key = batch["items"][0]["japanese"].clone();
    send(
        &app,
        Method::POST,
        "/api/words/answer",
        Some(json!({ "key": key, "correct": true })),
    )
    .await;

    let (status, _) = send(&app, Method::POST, "/api/reset", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stats) = send(&app, Method::GET, "/api/words/stats", None).await;
    assert_eq!(stats["learning"], 0);
    assert_eq!(stats["due"], stats["total"]);
}
