mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wayfarer_agents::{ConciergeAgent, PipelineConfig, ProgressSink, TripPlanner};
use wayfarer_core::{parse_trip_request, ChatInput};
use wayfarer_llm::{OpenAiConfig, OpenAiGenerator, TextGenerator};
use wayfarer_observability::{AppMetrics, MetricsSnapshot};
use wayfarer_storage::Store;

pub use crate::rate_limit::{ClientRateLimiter, RateDecision};

const MAX_CHAT_TEXT_LEN: usize = 4_000;
const DEFAULT_API_KEY: &str = "dev-wayfarer-key";

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<ConciergeAgent<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: ClientRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    generator: &'static str,
    stage_timeout_seconds: u64,
    branch_timeout_seconds: u64,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ParseRequest {
    text: String,
}

pub async fn build_app() -> Result<Router> {
    let config = OpenAiConfig::from_env()
        .ok_or_else(|| anyhow!("WAYFARER_OPENAI_API_KEY is not set; refusing to start"))?;
    let generator =
        OpenAiGenerator::new(config).context("failed to build OpenAI HTTP client")?;
    build_app_with_generator(Arc::new(generator)).await
}

pub async fn build_app_with_generator(generator: Arc<dyn TextGenerator>) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = if let Ok(database_url) = env::var("WAYFARER_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let planner = TripPlanner::new(generator, PipelineConfig::from_env(), metrics.clone());
    let agent = Arc::new(ConciergeAgent::new(
        planner,
        Arc::new(store),
        metrics.clone(),
    ));

    let api_key = env::var("WAYFARER_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("WAYFARER_API_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("WAYFARER_API_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(30);

    let state = ApiState {
        agent,
        metrics,
        api_key,
        limiter: ClientRateLimiter::new(rate_limit_window, rate_limit_max),
        allowed_origins: Arc::new(parse_allowed_origins()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/parse", post(parse))
        .route("/v1/sessions/{session_id}", get(session_get))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let planner = state.agent.planner();
    let config = planner.config();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        generator: planner.generator_name(),
        stage_timeout_seconds: config.stage_timeout.as_secs(),
        branch_timeout_seconds: config.branch_timeout.as_secs(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> Response {
    if let Some(rejection) = validate_text(&request.text) {
        return rejection;
    }

    let (progress, mut events) = ProgressSink::channel();
    let progress_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!(
                stage = event.stage.as_str(),
                phase = ?event.phase,
                detail = event.detail.as_deref().unwrap_or(""),
                "pipeline progress"
            );
        }
    });

    let input = ChatInput {
        session_id: request.session_id,
        text: request.text,
    };
    let result = state.agent.handle_chat_with_progress(input, &progress).await;
    drop(progress);
    let _ = progress_log.await;

    match result {
        Ok(reply) => match reply.failure.clone() {
            None => (StatusCode::OK, Json(reply)).into_response(),
            Some(failure) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": failure.kind,
                    "message": failure.message,
                    "session_id": reply.session_id,
                    "reply_text": reply.reply_text,
                })),
            )
                .into_response(),
        },
        Err(err) => {
            error!(error = %err, "chat failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "chat_failed",
                    "message": err.to_string()
                })),
            )
                .into_response()
        }
    }
}

async fn parse(Json(request): Json<ParseRequest>) -> Response {
    if let Some(rejection) = validate_text(&request.text) {
        return rejection;
    }

    match parse_trip_request(&request.text) {
        Ok(trip) => (StatusCode::OK, Json(trip)).into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": err.kind(),
                "message": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn session_get(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.agent.load_session(&session_id).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "session_not_found",
                "message": format!("no active session {}", session_id)
            })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, session_id = %session_id, "session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "session_lookup_failed",
                    "message": err.to_string()
                })),
            )
                .into_response()
        }
    }
}

fn validate_text(text: &str) -> Option<Response> {
    let message = if text.trim().is_empty() {
        "text must not be empty".to_string()
    } else if text.chars().count() > MAX_CHAT_TEXT_LEN {
        format!("text must be at most {} characters", MAX_CHAT_TEXT_LEN)
    } else {
        return None;
    };

    Some(
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_request",
                "message": message
            })),
        )
            .into_response(),
    )
}

fn parse_allowed_origins() -> Vec<String> {
    env::var("WAYFARER_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| {
            vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ]
        })
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    match state.limiter.check(&ip) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "rate limit exceeded for this IP"
                })),
            )
                .into_response();
            let seconds = retry_after.as_secs().max(1).to_string();
            if let Ok(value) = HeaderValue::from_str(&seconds) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
