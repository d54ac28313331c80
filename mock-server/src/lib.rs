use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierStatus {
    pub tier: u32,
    pub name: String,
    pub model: String,
    pub active: bool,
    pub requests_today: u64,
    pub avg_latency_ms: f64,
    pub success_rate: f64,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwarmStatus {
    pub active_tier: u32,
    pub tier_status: Vec<TierStatus>,
    pub current_action: String,
    pub queue_depth: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub provider: String,
    pub region: String,
    pub cost_per_month: f64,
    pub optimization_score: f64,
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Roi {
    pub ratio: f64,
    pub total_savings: f64,
    pub total_cost: f64,
    pub net_profit: f64,
}

#[derive(Deserialize)]
pub struct OptimizeRequest {
    #[serde(rename = "type")]
    pub optimization_type: String,
    pub risk_limit: f64,
    pub dry_run: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub optimizations_found: u64,
    pub estimated_savings: f64,
    pub actions_applied: u64,
    pub status: String,
    pub dry_run: bool,
}

#[derive(Deserialize)]
pub struct ResourceQuery {
    pub provider: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub tier: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub message: String,
}

/// Bearer token required on `/api/*` routes, if any.
#[derive(Clone, Default)]
struct AuthState {
    token: Option<Arc<str>>,
}

/// Router without authentication.
pub fn app() -> Router {
    app_with_token(None)
}

/// Router that requires `Authorization: Bearer <token>` on every `/api/*`
/// route when `token` is set. `/health` stays public.
pub fn app_with_token(token: Option<String>) -> Router {
    let auth = AuthState {
        token: token.map(Arc::from),
    };
    let api = Router::new()
        .route("/api/swarm/live", get(swarm_live))
        .route("/api/optimize", post(optimize))
        .route("/api/resources", get(list_resources))
        .route("/api/roi", get(roi))
        .route("/api/ai/chat", post(chat))
        .route("/api/recommendations", get(recommendations))
        .route_layer(middleware::from_fn_with_state(auth, require_bearer));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(middleware::from_fn(echo_request_id))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_token(listener, None).await
}

pub async fn run_with_token(
    listener: TcpListener,
    token: Option<String>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        code: status.as_u16(),
        message: message.to_string(),
    };
    (status, Json(body)).into_response()
}

async fn require_bearer(State(auth): State<AuthState>, request: Request, next: Next) -> Response {
    let Some(expected) = auth.token.as_deref() else {
        return next.run(request).await;
    };
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        next.run(request).await
    } else {
        error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        )
    }
}

/// Copies the caller's `x-request-id` onto the response, minting one if absent.
async fn echo_request_id(request: Request, next: Next) -> Response {
    let id = request.headers().get(&REQUEST_ID).cloned().or_else(|| {
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()
    });
    let mut response = next.run(request).await;
    if let Some(id) = id {
        response.headers_mut().insert(REQUEST_ID, id);
    }
    response
}

async fn health() -> Json<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "checks": {"database": "ok", "swarm": "ok", "cache": "ok"},
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn sample_swarm() -> SwarmStatus {
    let tier = |tier: u32, name: &str, model: &str, active: bool, requests_today, latency, rate| {
        TierStatus {
            tier,
            name: name.to_string(),
            model: model.to_string(),
            active,
            requests_today,
            avg_latency_ms: latency,
            success_rate: rate,
            status: if active { "busy" } else { "idle" }.to_string(),
        }
    };
    SwarmStatus {
        active_tier: 2,
        tier_status: vec![
            tier(1, "Sentinel", "gemini-2.0-flash", false, 1250, 85.5, 0.995),
            tier(2, "Strategist", "gemini-1.5-pro", true, 310, 420.0, 0.982),
            tier(3, "Arbiter", "claude-3.5-sonnet", false, 42, 1180.0, 0.99),
        ],
        current_action: "analyzing idle compute".to_string(),
        queue_depth: 3,
    }
}

async fn swarm_live() -> Json<SwarmStatus> {
    Json(sample_swarm())
}

pub fn sample_resources() -> Vec<Resource> {
    let resource = |id: &str, resource_type: &str, provider: &str, region: &str, cost, score, env: &str| {
        Resource {
            id: id.to_string(),
            resource_type: resource_type.to_string(),
            provider: provider.to_string(),
            region: region.to_string(),
            cost_per_month: cost,
            optimization_score: score,
            tags: BTreeMap::from([("env".to_string(), env.to_string())]),
        }
    };
    vec![
        resource("i-0a1b2c3d", "ec2", "aws", "us-east-1", 312.4, 0.35, "prod"),
        resource("db-primary", "rds", "aws", "us-east-1", 890.0, 0.8, "prod"),
        resource("vm-batch-7", "compute", "gcp", "europe-west1", 145.75, 0.2, "staging"),
        resource("vm-web-01", "vm", "azure", "westeurope", 210.0, 0.65, "dev"),
    ]
}

async fn list_resources(Query(query): Query<ResourceQuery>) -> Json<Vec<Resource>> {
    let resources = sample_resources()
        .into_iter()
        .filter(|r| query.provider.as_ref().is_none_or(|p| &r.provider == p))
        .filter(|r| {
            query
                .resource_type
                .as_ref()
                .is_none_or(|t| &r.resource_type == t)
        })
        .collect();
    Json(resources)
}

async fn optimize(Json(input): Json<OptimizeRequest>) -> Response {
    if !["full", "cost", "performance"].contains(&input.optimization_type.as_str()) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "unknown optimization type",
        );
    }
    if !(0.0..=10.0).contains(&input.risk_limit) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "risk_limit must be between 0 and 10",
        );
    }

    // Anything scoring below 0.5 is a candidate; higher risk limits widen the net.
    let threshold = 0.5 + input.risk_limit / 100.0;
    let candidates: Vec<Resource> = sample_resources()
        .into_iter()
        .filter(|r| r.optimization_score < threshold)
        .collect();
    let found = candidates.len() as u64;
    let estimated_savings = candidates
        .iter()
        .map(|r| r.cost_per_month * (1.0 - r.optimization_score) * 0.5)
        .sum::<f64>();

    let body = OptimizeResponse {
        optimizations_found: found,
        estimated_savings: (estimated_savings * 100.0).round() / 100.0,
        actions_applied: if input.dry_run { 0 } else { found },
        status: if input.dry_run { "simulated" } else { "applied" }.to_string(),
        dry_run: input.dry_run,
    };
    Json(body).into_response()
}

async fn roi() -> Json<Roi> {
    Json(Roi {
        ratio: 3.5,
        total_savings: 1000.0,
        total_cost: 200.0,
        net_profit: 800.0,
    })
}

async fn chat(Json(input): Json<ChatRequest>) -> Response {
    if input.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "invalid_request", "message is empty");
    }
    Json(ChatResponse {
        response: format!("Analyzed: {}", input.message.trim()),
        model: "gemini-1.5-pro".to_string(),
        tier: 2,
    })
    .into_response()
}

async fn recommendations() -> Json<Vec<Value>> {
    Json(vec![
        json!({
            "id": "rec-1",
            "resource_id": "vm-batch-7",
            "action": "downsize",
            "estimated_savings": 58.3,
            "risk_score": 2.1,
        }),
        json!({
            "id": "rec-2",
            "resource_id": "i-0a1b2c3d",
            "action": "schedule_shutdown",
            "estimated_savings": 101.53,
            "risk_score": 4.0,
            "window": {"start": "20:00", "end": "06:00"},
        }),
    ])
}
