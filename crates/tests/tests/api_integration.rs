use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use wayfarer_api::build_app_with_generator;
use wayfarer_llm::ScriptedGenerator;

const API_KEY: &str = "dev-wayfarer-key";

fn scripted_generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .with_reply(
            "researcher",
            r#"{"summary": "Spring brings cherry blossoms.", "best_time_to_visit": "April", "tips": ["Carry cash"]}"#,
        )
        .with_reply(
            "flight_planner",
            r#"{"options": [{"name": "Zipair economy", "price": 650}, {"name": "ANA business", "price": 3200}]}"#,
        )
        .with_reply(
            "hotel_planner",
            r#"{"options": [{"name": "Nine Hours capsule", "price": 45}, {"name": "Park Hyatt", "price": 700}]}"#,
        )
        .with_reply(
            "activity_planner",
            r#"{"options": [{"name": "Ueno Park hanami", "price": 0}, {"name": "teamLab Planets", "price": 30}]}"#,
        )
        .with_failure("synthesizer", "schedules disabled in tests")
        .with_reply(
            "quick_answer",
            "Yes, April is a great month for Tokyo. Expect cherry blossoms and crowds.",
        )
        .with_reply(
            "reviewer",
            r#"{"score": 7, "strengths": ["Seasonal"], "improvements": [], "summary": "Reasonable."}"#,
        )
}

async fn app() -> Router {
    build_app_with_generator(Arc::new(scripted_generator()))
        .await
        .expect("app should build")
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["generator"], "scripted");
}

#[tokio::test]
async fn chat_requires_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "text": "Plan a 5-day trip to Tokyo in April, budget $3000" }).to_string(),
        ))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_returns_two_costed_options() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/chat",
            json!({ "text": "Plan a 5-day trip to Tokyo in April, budget $3000" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;

    assert!(parsed["reply_text"].as_str().unwrap().contains("Tokyo"));
    let report = &parsed["report"];
    assert_eq!(report["request"]["destination"], "Tokyo");
    assert_eq!(report["options"]["budget"]["theme"], "budget");
    assert_eq!(report["options"]["comfort"]["theme"], "comfort");
    assert!(report["options"]["budget"]["total_cost"]["amount"].as_f64().unwrap() > 0.0);
    assert_eq!(report["review"]["score"], 7);
    assert!(report["notices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|notice| notice.as_str().unwrap().contains("default schedule")));
}

#[tokio::test]
async fn chat_without_destination_is_a_parse_error() {
    let response = app()
        .await
        .oneshot(post_json("/v1/chat", json!({ "text": "plan something fun" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let parsed = body_json(response).await;
    assert_eq!(parsed["error"], "parse_error");
    assert_eq!(
        parsed["message"],
        "Could not determine a destination from your request."
    );
    assert!(parsed["session_id"].as_str().is_some());
}

#[tokio::test]
async fn destination_question_is_answered_without_a_plan() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/chat",
            json!({ "text": "Is April good for visiting Tokyo?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert!(parsed["reply_text"]
        .as_str()
        .unwrap()
        .starts_with("Yes, April is a great month"));
    assert_eq!(parsed["report"], serde_json::Value::Null);
}

#[tokio::test]
async fn blank_chat_text_is_rejected() {
    let response = app()
        .await
        .oneshot(post_json("/v1/chat", json!({ "text": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn parse_endpoint_defaults_weekend_duration() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/parse",
            json!({ "text": "weekend Barcelona getaway, luxury budget" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["destination"], "Barcelona");
    assert_eq!(parsed["dates"]["duration_days"], 2);
    assert_eq!(parsed["budget"]["amount"], serde_json::Value::Null);
    assert!(parsed["interests"]
        .as_array()
        .unwrap()
        .contains(&json!("luxury")));
}

#[tokio::test]
async fn session_is_retrievable_after_chat() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/chat",
            json!({ "session_id": "trip-42", "text": "Plan a 5-day trip to Tokyo in April, budget $3000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let lookup = |id: &str| {
        Request::builder()
            .uri(format!("/v1/sessions/{id}"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(lookup("trip-42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["turns"].as_array().unwrap().len(), 1);

    let response = app.oneshot(lookup("missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
