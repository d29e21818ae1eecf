//! Fallback Policy
//!
//! Decides which provider, if any, gets the next attempt after a failure.

use crate::config::RouterConfig;
use crate::provider::ProviderId;

/// Single designated fallback provider with a bounded number of extra attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Provider that picks up failed calls
    pub provider: ProviderId,

    /// Extra attempts allowed per call; 0 disables fallback
    pub depth: u32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            provider: ProviderId::Gemini,
            depth: 1,
        }
    }
}

impl FallbackPolicy {
    pub fn new(provider: ProviderId, depth: u32) -> Self {
        Self { provider, depth }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.fallback_provider, config.fallback_depth)
    }

    /// Provider for the next attempt after `hops_taken` fallbacks have failed.
    ///
    /// A call that was addressed to the fallback provider itself never falls
    /// back; its error is the caller's.
    pub fn next_hop(&self, requested: ProviderId, hops_taken: u32) -> Option<ProviderId> {
        if requested == self.provider || hops_taken >= self.depth {
            None
        } else {
            Some(self.provider)
        }
    }
}
