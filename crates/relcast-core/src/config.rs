//! Externally-supplied configuration for a copy run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::{ProviderConfig, ProviderKind};

/// One side of a copy: which provider, which repository, which auth headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Provider hosting the repository.
    pub provider: ProviderKind,

    /// Repository URL of the form `scheme://host/namespace/repo`.
    pub url: String,

    /// Extra headers, typically authentication.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl EndpointConfig {
    /// Create an endpoint with no extra headers.
    pub fn new(provider: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add the provider's personal-access-token header.
    pub fn with_token(self, token: &str) -> Self {
        let (name, value) = self.provider.token_header(token);
        self.with_header(name, value)
    }

    /// Resolve this endpoint into an immutable provider configuration.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        ProviderConfig::new(self.provider, &self.url, &self.headers)
    }
}

/// Full configuration for one copy run, passed into the orchestrator by
/// value. There is no process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Endpoint releases are read from.
    pub source: EndpointConfig,

    /// Endpoint releases are replayed into.
    pub destination: EndpointConfig,
}

impl CloneConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
