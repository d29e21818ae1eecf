//! Provider Configuration
//!
//! Defines the configuration schema for providers and the router.

use crate::error::{RelayError, Result};
use crate::provider::ProviderId;
use crate::router::Credential;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Provider configurations keyed by provider id
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderConfig>,

    /// Router settings; a file that omits them keeps the previous layer's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterConfig>,
}

/// Configuration for a single provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Full URL requests are POSTed to
    pub endpoint: String,

    /// Optional environment variable overriding `endpoint`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_env: Option<String>,

    /// Model name sent in the request body (informational for Gemini, whose
    /// endpoint names the model)
    pub model: String,

    /// Approximate USD cost per 1000 tokens
    #[serde(default)]
    pub cost_per_k_tokens: f64,

    /// Environment variable name for the primary API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Additional environment variables, tried in order after `api_key_env`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_keys_env: Vec<String>,

    /// Raw API keys (alternative to env vars)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_keys: Vec<String>,

    /// `anthropic-version` header value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Sampling parameters
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

/// Router-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Provider that picks up failed calls
    pub fallback_provider: ProviderId,

    /// Extra attempts on the fallback provider; 0 disables fallback
    pub fallback_depth: u32,

    /// Whole-request timeout for outbound calls
    pub timeout_secs: u64,

    /// TCP connect timeout
    pub connect_timeout_secs: u64,

    /// How long a key answered with HTTP 429 is skipped
    pub rate_limit_cooldown_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback_provider: ProviderId::Gemini,
            fallback_depth: 1,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            rate_limit_cooldown_secs: 60,
        }
    }
}

impl ProviderConfig {
    /// Minimal config with defaults for everything but endpoint and model
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            endpoint_env: None,
            model: model.into(),
            cost_per_k_tokens: 0.0,
            api_key_env: None,
            api_keys_env: Vec::new(),
            api_keys: Vec::new(),
            api_version: None,
            generation: GenerationConfig::default(),
        }
    }

    /// Add an inline key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.push(key.into());
        self
    }

    /// Set the cost rate
    pub fn with_cost(mut self, cost_per_k_tokens: f64) -> Self {
        self.cost_per_k_tokens = cost_per_k_tokens;
        self
    }

    /// Get the effective endpoint (from env var if configured, otherwise default)
    pub fn get_endpoint(&self) -> String {
        if let Some(env_var) = &self.endpoint_env {
            if let Ok(url) = std::env::var(env_var) {
                if !url.trim().is_empty() {
                    return url;
                }
            }
        }
        self.endpoint.clone()
    }

    /// Collect this provider's credentials.
    ///
    /// Blank or unset variables are skipped and duplicate secrets dropped, so
    /// a provider with nothing configured yields an empty list.
    pub fn credentials(&self) -> Vec<Credential> {
        let mut keys: Vec<Credential> = Vec::new();

        let env_vars = self.api_key_env.iter().chain(self.api_keys_env.iter());
        for env_var in env_vars {
            if let Ok(secret) = std::env::var(env_var) {
                push_unique(&mut keys, env_var.clone(), secret);
            }
        }

        for (i, secret) in self.api_keys.iter().enumerate() {
            push_unique(&mut keys, format!("inline-{}", i + 1), secret.clone());
        }

        keys
    }
}

fn push_unique(keys: &mut Vec<Credential>, name: String, secret: String) {
    let secret = secret.trim();
    if secret.is_empty() || keys.iter().any(|k| k.secret() == secret) {
        return;
    }
    keys.push(Credential::new(name, secret));
}

impl ProvidersConfig {
    /// Effective router settings
    pub fn router_config(&self) -> RouterConfig {
        self.router.clone().unwrap_or_default()
    }

    /// Reject configurations the router cannot honor
    pub fn validate(&self) -> Result<()> {
        for (id, provider) in &self.providers {
            let rate = provider.cost_per_k_tokens;
            if !rate.is_finite() || rate < 0.0 {
                return Err(RelayError::Config(format!(
                    "cost_per_k_tokens for '{}' must be a non-negative number, got {}",
                    id, rate
                )));
            }
            if provider.endpoint.trim().is_empty() {
                return Err(RelayError::Config(format!(
                    "endpoint for '{}' is empty",
                    id
                )));
            }
        }

        let router = self.router_config();
        if router.fallback_depth > 0 && !self.providers.contains_key(&router.fallback_provider) {
            return Err(RelayError::Config(format!(
                "fallback provider '{}' has no provider entry",
                router.fallback_provider
            )));
        }
        if router.timeout_secs == 0 {
            return Err(RelayError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if router.connect_timeout_secs == 0 {
            return Err(RelayError::Config(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
