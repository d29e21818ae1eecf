//! Provider Dispatch
//!
//! Routes a chat request to the requested provider and, when that fails,
//! to the configured fallback provider.

use crate::api::{CallResult, ChatMessage, Role};
use crate::client::HttpClient;
use crate::config::{ConfigLoader, ProvidersConfig};
use crate::cost::CostEstimator;
use crate::error::{RelayError, Result};
use crate::offline::offline_reply;
use crate::provider::{ProviderAdapter, ProviderId};
use crate::router::{FallbackPolicy, KeyPool, KeyPoolStats};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Routes calls across providers
pub struct Router {
    /// Adapters per configured provider
    adapters: HashMap<ProviderId, ProviderAdapter>,

    /// Credential pools per configured provider (possibly empty)
    key_pools: HashMap<ProviderId, KeyPool>,

    /// HTTP client
    http_client: HttpClient,

    costs: CostEstimator,

    policy: FallbackPolicy,

    /// Cooldown applied to a key answered with HTTP 429
    rate_limit_cooldown: Duration,
}

impl Router {
    /// Create a router from the default configuration sources
    pub fn new() -> Result<Self> {
        let loader = ConfigLoader::new()?;
        Self::from_config(loader.into_config())
    }

    /// Create a router with a custom config path
    pub fn with_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let loader = ConfigLoader::from_path(path)?;
        Self::from_config(loader.into_config())
    }

    /// Create a router from a config object
    pub fn from_config(config: ProvidersConfig) -> Result<Self> {
        config.validate()?;

        let router_config = config.router_config();
        let costs = CostEstimator::from_config(&config);

        let mut adapters = HashMap::new();
        let mut key_pools = HashMap::new();

        for (id, provider) in config.providers {
            let credentials = provider.credentials();
            debug!(provider = %id, keys = credentials.len(), "Configured provider");

            key_pools.insert(id, KeyPool::new(id, credentials));
            adapters.insert(id, ProviderAdapter::new(id, provider));
        }

        Ok(Self {
            adapters,
            key_pools,
            http_client: HttpClient::from_config(&router_config)?,
            costs,
            policy: FallbackPolicy::from_config(&router_config),
            rate_limit_cooldown: Duration::from_secs(router_config.rate_limit_cooldown_secs),
        })
    }

    /// Route a call to `provider`, falling back per the policy on failure.
    ///
    /// The requested provider is tried once. If it fails and it is not the
    /// fallback provider itself, the fallback provider is tried with a fresh
    /// credential, at most `fallback_depth` times. The last error is returned
    /// when every attempt fails.
    pub async fn call(
        &self,
        provider: ProviderId,
        messages: &[ChatMessage],
        system_prompt: &str,
    ) -> Result<CallResult> {
        if messages.is_empty() {
            return Err(RelayError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }
        if messages.iter().all(|m| m.role == Role::System) {
            return Err(RelayError::InvalidRequest(
                "at least one user or assistant message is required".to_string(),
            ));
        }

        let mut result = self.attempt(provider, messages, system_prompt).await;
        let mut hops = 0;

        while let Err(err) = &result {
            let Some(next) = self.policy.next_hop(provider, hops) else {
                break;
            };

            warn!(
                provider = %provider,
                fallback = %next,
                error = %err,
                "Provider call failed, falling back"
            );

            hops += 1;
            result = self
                .attempt(next, messages, system_prompt)
                .await
                .map(|mut r| {
                    r.fell_back = true;
                    r
                });
        }

        result
    }

    /// Like [`Router::call`], but answers with the offline reply instead of
    /// an error when every attempt failed
    pub async fn call_or_offline(
        &self,
        provider: ProviderId,
        messages: &[ChatMessage],
        system_prompt: &str,
    ) -> CallResult {
        match self.call(provider, messages, system_prompt).await {
            Ok(result) => result,
            Err(err) => {
                warn!(provider = %provider, error = %err, "No provider answered, using offline reply");
                CallResult {
                    content: offline_reply(provider, messages),
                    tokens: 0,
                    cost_usd: 0.0,
                    provider_used: provider,
                    response_time_ms: 0,
                    fell_back: true,
                }
            }
        }
    }

    /// One attempt against one provider with the next credential from its pool
    async fn attempt(
        &self,
        provider: ProviderId,
        messages: &[ChatMessage],
        system_prompt: &str,
    ) -> Result<CallResult> {
        let adapter = self
            .adapters
            .get(&provider)
            .ok_or(RelayError::ProviderNotConfigured(provider))?;
        let pool = self
            .key_pools
            .get(&provider)
            .ok_or(RelayError::ProviderNotConfigured(provider))?;

        let credential = pool.next()?;
        debug!(provider = %provider, key = credential.name(), endpoint = adapter.endpoint(), "Dispatching chat request");

        match adapter
            .invoke(&self.http_client, messages, system_prompt, credential)
            .await
        {
            Ok(mut result) => {
                result.cost_usd = self.costs.estimate(provider, result.tokens);
                info!(
                    provider = %provider,
                    tokens = result.tokens,
                    cost_usd = result.cost_usd,
                    elapsed_ms = result.response_time_ms,
                    "Provider call completed"
                );
                Ok(result)
            }
            Err(err) => {
                if err.is_rate_limited() {
                    pool.mark_rate_limited(credential.name(), self.rate_limit_cooldown);
                }
                Err(err)
            }
        }
    }

    /// Fallback policy in effect
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Configured providers, in display order
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<_> = self.adapters.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Get provider info
    pub fn provider_info(&self, id: ProviderId) -> Option<ProviderInfo> {
        let adapter = self.adapters.get(&id)?;
        Some(ProviderInfo {
            id,
            endpoint: adapter.endpoint().to_string(),
            model: adapter.config().model.clone(),
            has_keys: self.key_pools.get(&id).is_some_and(|p| !p.is_empty()),
        })
    }

    /// Usage statistics for a provider's key pool
    pub fn pool_stats(&self, id: ProviderId) -> Option<KeyPoolStats> {
        self.key_pools.get(&id).map(|p| p.stats())
    }
}

/// Provider information
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub endpoint: String,
    pub model: String,
    pub has_keys: bool,
}
