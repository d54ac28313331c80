//! Client configuration.
//!
//! The base URL and credential are fixed once a client is built; nothing else
//! is configurable because the client performs a single blocking attempt per
//! call with no retry or timeout policy.

use std::fmt;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const BASE_URL_ENV: &str = "TALOS_BASE_URL";
pub const API_KEY_ENV: &str = "TALOS_API_KEY";

/// Where the Talos server lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach a credential. An empty key is treated as no key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|k| !k.is_empty());
        self
    }

    /// Read `TALOS_BASE_URL` and `TALOS_API_KEY`, falling back to
    /// `http://localhost:8080` and no credential.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = Self::new(base_url);
        match lookup(API_KEY_ENV) {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
