//! Synchronous API client for the Talos cloud optimization service.
//!
//! # Overview
//! `TalosClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `BlockingClient`
//! pairs it with a [`Transport`] (by default a pooled `ureq` agent) and exposes
//! one blocking method per endpoint.
//!
//! # Design
//! - `TalosClient` is stateless: it holds only `base_url` and an optional
//!   bearer key, both fixed at construction.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit and testable.
//! - Non-2xx responses fail with `ApiError::HttpError` before any decoding;
//!   shape mismatches fail with `ApiError::DeserializationError`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use blocking::BlockingClient;
pub use client::TalosClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    ChatReply, ChatRequest, Health, OptimizationReport, OptimizationRequest, Recommendation,
    Resource, ResourceFilter, Roi, SwarmStatus, TierStatus,
};
