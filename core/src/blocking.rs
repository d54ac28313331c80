//! Blocking client that executes Talos API calls end to end.
//!
//! Each method builds a request with `TalosClient`, tags it with a fresh
//! `x-request-id`, hands it to the transport, and parses the response. A call
//! makes exactly one attempt and blocks until the transport returns.

use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::TalosClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Health, OptimizationReport, OptimizationRequest, Recommendation, Resource, ResourceFilter,
    Roi, SwarmStatus,
};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Talos API client performing blocking HTTP calls.
///
/// ```no_run
/// use talos_core::{BlockingClient, ClientConfig, OptimizationRequest};
///
/// let client = BlockingClient::new(&ClientConfig::new("http://localhost:8080"));
/// let roi = client.get_roi()?;
/// let report = client.run_optimization(&OptimizationRequest::default())?;
/// println!("ROI {:.1}x, {} optimizations found", roi.ratio, report.optimizations_found);
/// # Ok::<(), talos_core::ApiError>(())
/// ```
pub struct BlockingClient<T = UreqTransport> {
    api: TalosClient,
    transport: T,
}

impl BlockingClient<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(TalosClient::from_config(config), UreqTransport::new())
    }

    pub fn from_env() -> Self {
        Self::new(&ClientConfig::from_env())
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(api: TalosClient, transport: T) -> Self {
        Self { api, transport }
    }

    /// The request builder / response parser this client drives.
    pub fn api(&self) -> &TalosClient {
        &self.api
    }

    pub fn health(&self) -> Result<Health, ApiError> {
        let response = self.send(self.api.build_health())?;
        self.api.parse_health(response)
    }

    pub fn get_swarm_status(&self) -> Result<SwarmStatus, ApiError> {
        let response = self.send(self.api.build_swarm_status())?;
        self.api.parse_swarm_status(response)
    }

    /// Pass `&OptimizationRequest::default()` for a dry run of a full
    /// optimization with risk limit 7.
    pub fn run_optimization(
        &self,
        input: &OptimizationRequest,
    ) -> Result<OptimizationReport, ApiError> {
        let response = self.send(self.api.build_run_optimization(input)?)?;
        self.api.parse_run_optimization(response)
    }

    pub fn get_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ApiError> {
        let response = self.send(self.api.build_get_resources(filter))?;
        self.api.parse_get_resources(response)
    }

    pub fn get_roi(&self) -> Result<Roi, ApiError> {
        let response = self.send(self.api.build_get_roi())?;
        self.api.parse_get_roi(response)
    }

    pub fn chat(&self, message: &str) -> Result<String, ApiError> {
        let response = self.send(self.api.build_chat(message)?)?;
        self.api.parse_chat(response)
    }

    pub fn get_recommendations(&self) -> Result<Vec<Recommendation>, ApiError> {
        let response = self.send(self.api.build_get_recommendations())?;
        self.api.parse_get_recommendations(response)
    }

    fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        request
            .headers
            .push((REQUEST_ID_HEADER.to_string(), request_id.clone()));
        let method = request.method.as_str();
        let url = request.url.clone();
        debug!(method, url = %url, request_id = %request_id, "sending request");

        let started = Instant::now();
        let response = match self.transport.execute(request) {
            Ok(response) => response,
            Err(err) => {
                warn!(method, url = %url, request_id = %request_id, error = %err, "request failed");
                return Err(err);
            }
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if response.is_success() {
            debug!(
                method,
                url = %url,
                request_id = %request_id,
                status = response.status,
                elapsed_ms,
                "received response"
            );
        } else {
            warn!(
                method,
                url = %url,
                request_id = %request_id,
                status = response.status,
                elapsed_ms,
                "server returned error status"
            );
        }
        Ok(response)
    }
}
