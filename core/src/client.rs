//! Stateless HTTP request builder and response parser for the Talos API.
//!
//! # Design
//! `TalosClient` holds only a `base_url` and an optional credential, and
//! carries no mutable state between calls. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. Something else executes the round-trip
//! (`BlockingClient` in this crate), keeping this half deterministic and free
//! of I/O.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ChatReply, ChatRequest, Health, OptimizationReport, OptimizationRequest, Recommendation,
    Resource, ResourceFilter, Roi, SwarmStatus,
};

pub const HEALTH_PATH: &str = "/health";
pub const SWARM_PATH: &str = "/api/swarm/live";
pub const OPTIMIZE_PATH: &str = "/api/optimize";
pub const RESOURCES_PATH: &str = "/api/resources";
pub const ROI_PATH: &str = "/api/roi";
pub const CHAT_PATH: &str = "/api/ai/chat";
pub const RECOMMENDATIONS_PATH: &str = "/api/recommendations";

/// Synchronous, stateless client for the Talos API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. When an API key is configured every built request
/// carries `authorization: Bearer <key>`.
#[derive(Clone)]
pub struct TalosClient {
    base_url: String,
    api_key: Option<String>,
}

impl TalosClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Attach a bearer credential. An empty key is ignored.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|k| !k.is_empty());
        self
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url);
        match &config.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn build_health(&self) -> HttpRequest {
        self.get(HEALTH_PATH, Vec::new())
    }

    pub fn build_swarm_status(&self) -> HttpRequest {
        self.get(SWARM_PATH, Vec::new())
    }

    pub fn build_run_optimization(
        &self,
        input: &OptimizationRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.post(OPTIMIZE_PATH, input)
    }

    pub fn build_get_resources(&self, filter: &ResourceFilter) -> HttpRequest {
        self.get(RESOURCES_PATH, filter.to_query())
    }

    pub fn build_get_roi(&self) -> HttpRequest {
        self.get(ROI_PATH, Vec::new())
    }

    pub fn build_chat(&self, message: &str) -> Result<HttpRequest, ApiError> {
        let input = ChatRequest {
            message: message.to_string(),
        };
        self.post(CHAT_PATH, &input)
    }

    pub fn build_get_recommendations(&self) -> HttpRequest {
        self.get(RECOMMENDATIONS_PATH, Vec::new())
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<Health, ApiError> {
        decode(response)
    }

    pub fn parse_swarm_status(&self, response: HttpResponse) -> Result<SwarmStatus, ApiError> {
        decode(response)
    }

    pub fn parse_run_optimization(
        &self,
        response: HttpResponse,
    ) -> Result<OptimizationReport, ApiError> {
        decode(response)
    }

    pub fn parse_get_resources(&self, response: HttpResponse) -> Result<Vec<Resource>, ApiError> {
        decode(response)
    }

    pub fn parse_get_roi(&self, response: HttpResponse) -> Result<Roi, ApiError> {
        decode(response)
    }

    /// Returns only the `response` text of a chat reply.
    pub fn parse_chat(&self, response: HttpResponse) -> Result<String, ApiError> {
        self.parse_chat_reply(response).map(|reply| reply.response)
    }

    pub fn parse_chat_reply(&self, response: HttpResponse) -> Result<ChatReply, ApiError> {
        decode(response)
    }

    pub fn parse_get_recommendations(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Recommendation>, ApiError> {
        decode(response)
    }

    fn get(&self, path: &str, query: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            query,
            headers: self.common_headers(),
            body: None,
        }
    }

    fn post<B: Serialize>(&self, path: &str, input: &B) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut headers = self.common_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers,
            body: Some(body),
        })
    }

    fn common_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(key) = &self.api_key {
            headers.push(("authorization".to_string(), format!("Bearer {key}")));
        }
        headers
    }
}

impl fmt::Debug for TalosClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TalosClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reject non-2xx responses, then decode the body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_slice(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TalosClient {
        TalosClient::new("http://localhost:8080")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn status(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn build_health_produces_correct_request() {
        let req = client().build_health();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/health");
        assert!(req.query.is_empty());
        assert!(req.body.is_none());
        assert_eq!(
            req.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn build_get_paths() {
        let c = client();
        assert_eq!(c.build_swarm_status().url, "http://localhost:8080/api/swarm/live");
        assert_eq!(c.build_get_roi().url, "http://localhost:8080/api/roi");
        assert_eq!(
            c.build_get_recommendations().url,
            "http://localhost:8080/api/recommendations"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TalosClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.build_get_roi().url, "http://localhost:8080/api/roi");
    }

    #[test]
    fn api_key_adds_bearer_header_to_every_request() {
        let c = client().with_api_key("secret");
        let requests = vec![
            c.build_health(),
            c.build_swarm_status(),
            c.build_run_optimization(&OptimizationRequest::default()).unwrap(),
            c.build_get_resources(&ResourceFilter::default()),
            c.build_get_roi(),
            c.build_chat("hi").unwrap(),
            c.build_get_recommendations(),
        ];
        for req in requests {
            assert_eq!(req.header("authorization"), Some("Bearer secret"), "{}", req.url);
        }
    }

    #[test]
    fn no_api_key_means_no_authorization_header() {
        let c = client().with_api_key("");
        assert!(!c.has_api_key());
        assert!(c.build_health().header("authorization").is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let printed = format!("{:?}", client().with_api_key("hunter2"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn build_run_optimization_defaults_to_dry_run() {
        let req = client()
            .build_run_optimization(&OptimizationRequest::default())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/api/optimize");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["type"], "full");
        assert_eq!(body["risk_limit"], 7.0);
        assert_eq!(body["dry_run"], true);
    }

    #[test]
    fn build_run_optimization_explicit_apply() {
        let input = OptimizationRequest::new()
            .optimization_type("performance")
            .risk_limit(2.5)
            .dry_run(false);
        let req = client().build_run_optimization(&input).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "performance", "risk_limit": 2.5, "dry_run": false})
        );
    }

    #[test]
    fn build_get_resources_without_filters_sends_no_query() {
        let req = client().build_get_resources(&ResourceFilter::new());
        assert_eq!(req.url, "http://localhost:8080/api/resources");
        assert!(req.query.is_empty());
    }

    #[test]
    fn build_get_resources_provider_only() {
        let req = client().build_get_resources(&ResourceFilter::new().provider("aws"));
        assert_eq!(req.query, vec![("provider".to_string(), "aws".to_string())]);
    }

    #[test]
    fn build_chat_body() {
        let req = client().build_chat("Should I optimize?").unwrap();
        assert_eq!(req.url, "http://localhost:8080/api/ai/chat");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"message": "Should I optimize?"}));
    }

    #[test]
    fn parse_get_roi_example() {
        let roi = client()
            .parse_get_roi(ok(
                r#"{"ratio":3.5,"total_savings":1000.0,"total_cost":200.0,"net_profit":800.0}"#,
            ))
            .unwrap();
        assert_eq!(
            roi,
            Roi {
                ratio: 3.5,
                total_savings: 1000.0,
                total_cost: 200.0,
                net_profit: 800.0,
            }
        );
    }

    #[test]
    fn parse_get_roi_missing_field_is_deserialization_error() {
        let err = client()
            .parse_get_roi(ok(r#"{"ratio":3.5,"total_savings":1000.0,"total_cost":200.0}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_error_status_wins_over_body_shape() {
        // A valid success body with an error status is still an HTTP failure.
        let err = client()
            .parse_get_roi(status(
                503,
                r#"{"ratio":3.5,"total_savings":1000.0,"total_cost":200.0,"net_profit":800.0}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 503, .. }));
    }

    #[test]
    fn parse_not_found_carries_body() {
        let err = client().parse_swarm_status(status(404, "no swarm")).unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no swarm");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error_status_with_binary_body() {
        let response = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: vec![0xff, 0xfe, b'o', b'o', b'p', b's'],
        };
        let err = client().parse_get_roi(response).unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 500);
                assert!(body.ends_with("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_success_with_invalid_utf8_is_deserialization_error() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: b"{\"ratio\":\xff}".to_vec(),
        };
        let err = client().parse_get_roi(response).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_accepts_any_2xx() {
        let health = client()
            .parse_health(status(202, r#"{"status":"degraded"}"#))
            .unwrap();
        assert_eq!(health.status, "degraded");
    }

    #[test]
    fn parse_swarm_status_success() {
        let body = r#"{
            "active_tier": 2,
            "tier_status": [
                {"tier":1,"name":"Sentinel","model":"gemini-2.0-flash","active":false,
                 "requests_today":120,"avg_latency_ms":85.5,"success_rate":0.99,"status":"idle"},
                {"tier":2,"name":"Strategist","model":"gemini-1.5-pro","active":true,
                 "requests_today":40,"avg_latency_ms":410.0,"success_rate":0.97,"status":"busy"}
            ],
            "current_action": "analyzing ec2 fleet",
            "queue_depth": 3
        }"#;
        let swarm = client().parse_swarm_status(ok(body)).unwrap();
        assert_eq!(swarm.active_tier, 2);
        assert_eq!(swarm.tier_status.len(), 2);
        assert_eq!(swarm.tier_status[0].name, "Sentinel");
        assert!(swarm.tier_status[1].active);
        assert_eq!(swarm.tier_status[1].avg_latency_ms, 410.0);
        assert_eq!(swarm.current_action, "analyzing ec2 fleet");
        assert_eq!(swarm.queue_depth, 3);
    }

    #[test]
    fn parse_chat_returns_response_field() {
        let text = client()
            .parse_chat(ok(r#"{"response":"Yes, downsize i-123.","model":"claude","tier":3}"#))
            .unwrap();
        assert_eq!(text, "Yes, downsize i-123.");
    }

    #[test]
    fn parse_chat_without_response_field() {
        let err = client().parse_chat(ok(r#"{"answer":"nope"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_get_recommendations_passthrough() {
        let recs = client()
            .parse_get_recommendations(ok(r#"[{"id":"r1","savings":12.5},{"nested":{"a":[1,2]}}]"#))
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["id"], "r1");
        assert_eq!(recs[1]["nested"]["a"][1], 2);
    }

    #[test]
    fn parse_get_resources_bad_json() {
        let err = client().parse_get_resources(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_run_optimization_success() {
        let report = client()
            .parse_run_optimization(ok(
                r#"{"optimizations_found":4,"estimated_savings":312.75,"actions_applied":0,"status":"simulated"}"#,
            ))
            .unwrap();
        assert_eq!(report.optimizations_found, 4);
        assert_eq!(report.estimated_savings, 312.75);
        assert_eq!(report.actions_applied, Some(0));
        assert_eq!(report.status.as_deref(), Some("simulated"));
        assert!(report.extra.is_empty());
    }
}
