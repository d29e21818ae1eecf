//! Cost Estimation
//!
//! Static per-provider USD rates, for bookkeeping only.

use crate::config::ProvidersConfig;
use crate::provider::ProviderId;
use std::collections::HashMap;

/// Maps `(provider, tokens)` to an approximate USD cost
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    /// USD per 1000 tokens
    rates: HashMap<ProviderId, f64>,
}

impl CostEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rates taken from each provider's `cost_per_k_tokens`
    pub fn from_config(config: &ProvidersConfig) -> Self {
        config
            .providers
            .iter()
            .fold(Self::new(), |est, (id, p)| est.with_rate(*id, p.cost_per_k_tokens))
    }

    /// Set a rate. Negative or non-finite rates are ignored.
    pub fn with_rate(mut self, provider: ProviderId, usd_per_k_tokens: f64) -> Self {
        if usd_per_k_tokens.is_finite() && usd_per_k_tokens >= 0.0 {
            self.rates.insert(provider, usd_per_k_tokens);
        }
        self
    }

    pub fn rate(&self, provider: ProviderId) -> Option<f64> {
        self.rates.get(&provider).copied()
    }

    /// `(tokens / 1000) * rate`, or 0 when the provider has no rate
    pub fn estimate(&self, provider: ProviderId, tokens: u64) -> f64 {
        match self.rate(provider) {
            Some(rate) => (tokens as f64 / 1000.0) * rate,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate() {
        let est = CostEstimator::new().with_rate(ProviderId::Claude, 0.008);
        assert!((est.estimate(ProviderId::Claude, 1500) - 0.012).abs() < 1e-12);
        assert_eq!(est.estimate(ProviderId::Claude, 0), 0.0);
    }

    #[test]
    fn test_unknown_rate_is_zero() {
        let est = CostEstimator::new().with_rate(ProviderId::Claude, 0.008);
        assert_eq!(est.estimate(ProviderId::OpenAi, 10_000), 0.0);
    }

    #[test]
    fn test_invalid_rates_ignored() {
        let est = CostEstimator::new()
            .with_rate(ProviderId::Gemini, -0.5)
            .with_rate(ProviderId::DeepSeek, f64::INFINITY);
        assert_eq!(est.rate(ProviderId::Gemini), None);
        assert_eq!(est.estimate(ProviderId::DeepSeek, 1000), 0.0);
    }

    #[test]
    fn test_monotonic_and_non_negative() {
        let est = CostEstimator::new()
            .with_rate(ProviderId::Gemini, 0.0005)
            .with_rate(ProviderId::OpenAi, 0.002);

        for id in ProviderId::ALL {
            let mut previous = 0.0;
            for tokens in (0..50_000u64).step_by(997) {
                let cost = est.estimate(id, tokens);
                assert!(cost >= 0.0);
                assert!(cost >= previous, "{} not monotonic at {}", id, tokens);
                previous = cost;
            }
        }
    }
}
