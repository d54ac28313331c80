//! Domain DTOs for the Talos API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates.
//!
//! The four snapshot records (`TierStatus`, `SwarmStatus`, `Resource`, `Roi`)
//! are strict: every field is required and a missing one is a decode failure.
//! Endpoints whose shape the server owns (`/health`, `/api/optimize`) get a
//! partial schema with the fields callers rely on, and keep everything else in
//! a flattened `extra` map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of one AI tier in the swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

/// Aggregate swarm snapshot returned by `GET /api/swarm/live`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmStatus {
    pub active_tier: u32,
    pub tier_status: Vec<TierStatus>,
    pub current_action: String,
    pub queue_depth: u64,
}

/// A cloud resource as reported by `GET /api/resources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

/// Point-in-time ROI metrics from `GET /api/roi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub ratio: f64,
    pub total_savings: f64,
    pub total_cost: f64,
    pub net_profit: f64,
}

/// Response of `GET /health`. Only `status` is guaranteed.
///
/// `checks` and `timestamp` are kept as raw JSON: servers send the timestamp
/// either as unix seconds or as an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request payload for `POST /api/optimize`.
///
/// Defaults: `type = "full"`, `risk_limit = 7.0`, `dry_run = true`. A request
/// only applies changes when `dry_run(false)` is set explicitly. Neither the
/// type nor the risk limit is checked here; the server rejects bad values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// One of `"full"`, `"cost"`, `"performance"`.
    #[serde(rename = "type")]
    pub optimization_type: String,
    /// Maximum acceptable risk score, 0 to 10.
    pub risk_limit: f64,
    pub dry_run: bool,
}

pub const DEFAULT_OPTIMIZATION_TYPE: &str = "full";
pub const DEFAULT_RISK_LIMIT: f64 = 7.0;

impl Default for OptimizationRequest {
    fn default() -> Self {
        Self {
            optimization_type: DEFAULT_OPTIMIZATION_TYPE.to_string(),
            risk_limit: DEFAULT_RISK_LIMIT,
            dry_run: true,
        }
    }
}

impl OptimizationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optimization_type(mut self, optimization_type: impl Into<String>) -> Self {
        self.optimization_type = optimization_type.into();
        self
    }

    pub fn risk_limit(mut self, risk_limit: f64) -> Self {
        self.risk_limit = risk_limit;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of `POST /api/optimize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub optimizations_found: u64,
    pub estimated_savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_applied: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional filters for `GET /api/resources`. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub provider: Option<String>,
    pub resource_type: Option<String>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Query pairs in wire order: `provider` first, then `type`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(provider) = &self.provider {
            query.push(("provider".to_string(), provider.clone()));
        }
        if let Some(resource_type) = &self.resource_type {
            query.push(("type".to_string(), resource_type.clone()));
        }
        query
    }
}

/// Request payload for `POST /api/ai/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of `POST /api/ai/chat`. `BlockingClient::chat` returns only
/// `response`; the rest is available through `TalosClient::parse_chat_reply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u32>,
}

/// A recommendation is passed through untouched; its schema is server-defined.
pub type Recommendation = Map<String, Value>;
