//! Credential Pool Management
//!
//! Hands out a provider's credentials in round-robin order, skipping keys the
//! provider has recently throttled.

use crate::error::{RelayError, Result};
use crate::provider::ProviderId;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Upper bound on any single cooldown
pub const MAX_COOLDOWN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A single API key with usage tracking
pub struct Credential {
    /// Where the key came from, e.g. `GEMINI_API_KEY_2`
    name: String,

    /// The actual API key value
    secret: String,

    /// Time until which this key is rate limited (if any)
    rate_limited_until: RwLock<Option<Instant>>,

    /// Total number of times this key was handed out
    request_count: AtomicU64,
}

impl Credential {
    /// Create a new credential
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            rate_limited_until: RwLock::new(None),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Check if this key is currently rate limited
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limit_remaining().is_some()
    }

    /// Get remaining rate limit duration
    pub fn rate_limit_remaining(&self) -> Option<Duration> {
        let guard = self.rate_limited_until.read();
        let until = (*guard)?;
        let now = Instant::now();
        (now < until).then(|| until - now)
    }

    /// Mark this key as rate limited, for at most [`MAX_COOLDOWN`]
    pub fn mark_rate_limited(&self, duration: Duration) {
        let duration = duration.min(MAX_COOLDOWN);
        *self.rate_limited_until.write() = Some(Instant::now() + duration);
    }

    /// Clear rate limit status
    pub fn clear_rate_limit(&self) {
        *self.rate_limited_until.write() = None;
    }

    fn record_usage(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

// Never print the secret
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("rate_limited", &self.is_rate_limited())
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Pool of credentials for one provider
#[derive(Debug)]
pub struct KeyPool {
    /// Provider this pool belongs to
    provider: ProviderId,

    /// Keys in insertion order
    keys: Vec<Credential>,

    /// Round-robin cursor, only ever incremented
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Create a new key pool
    pub fn new(provider: ProviderId, keys: Vec<Credential>) -> Self {
        Self {
            provider,
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pool with no credentials; every `next()` fails
    pub fn empty(provider: ProviderId) -> Self {
        Self::new(provider, Vec::new())
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Next credential in round-robin order.
    ///
    /// Keys on cooldown are skipped while any other key is available. When
    /// every key is cooling down, the one that frees up soonest is returned.
    pub fn next(&self) -> Result<&Credential> {
        if self.keys.is_empty() {
            return Err(RelayError::EmptyPool(self.provider));
        }

        let key = self.next_round_robin();
        key.record_usage();
        Ok(key)
    }

    fn next_round_robin(&self) -> &Credential {
        let len = self.keys.len();

        for _ in 0..len {
            let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
            let key = &self.keys[idx];

            if !key.is_rate_limited() {
                return key;
            }
        }

        self.soonest_available()
    }

    fn soonest_available(&self) -> &Credential {
        self.keys
            .iter()
            .min_by_key(|k| k.rate_limit_remaining().unwrap_or(Duration::ZERO))
            .unwrap_or(&self.keys[0])
    }

    /// Mark the key with the given name as rate limited
    pub fn mark_rate_limited(&self, name: &str, duration: Duration) {
        if let Some(key) = self.keys.iter().find(|k| k.name() == name) {
            key.mark_rate_limited(duration);
        }
    }

    /// Lift the cooldown on the key with the given name
    pub fn clear_rate_limit(&self, name: &str) {
        if let Some(key) = self.keys.iter().find(|k| k.name() == name) {
            key.clear_rate_limit();
        }
    }

    /// Check if all keys are currently rate limited
    pub fn all_rate_limited(&self) -> bool {
        !self.keys.is_empty() && self.keys.iter().all(|k| k.is_rate_limited())
    }

    /// Get statistics about the pool
    pub fn stats(&self) -> KeyPoolStats {
        let total = self.keys.len();
        let rate_limited = self.keys.iter().filter(|k| k.is_rate_limited()).count();
        let total_requests: u64 = self.keys.iter().map(|k| k.request_count()).sum();

        KeyPoolStats {
            total_keys: total,
            available_keys: total - rate_limited,
            rate_limited_keys: rate_limited,
            total_requests,
        }
    }
}

/// Statistics about a key pool
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct KeyPoolStats {
    pub total_keys: usize,
    pub available_keys: usize,
    pub rate_limited_keys: usize,
    pub total_requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(secrets: &[&str]) -> KeyPool {
        KeyPool::new(
            ProviderId::Gemini,
            secrets
                .iter()
                .map(|s| Credential::new(format!("env-{}", s), *s))
                .collect(),
        )
    }

    #[test]
    fn test_key_rate_limiting() {
        let key = Credential::new("GEMINI_API_KEY", "test-key");

        assert!(!key.is_rate_limited());

        key.mark_rate_limited(Duration::from_secs(60));
        assert!(key.is_rate_limited());

        key.clear_rate_limit();
        assert!(!key.is_rate_limited());
    }

    #[test]
    fn test_huge_cooldown_is_capped() {
        let pool = pool(&["a", "b"]);
        pool.mark_rate_limited("env-a", Duration::from_secs(u64::MAX));

        let key = &pool.keys[0];
        assert!(key.is_rate_limited());
        assert!(key.rate_limit_remaining().unwrap() <= MAX_COOLDOWN);
        assert_eq!(pool.next().unwrap().secret(), "b");
    }

    #[test]
    fn test_concurrent_next_keeps_counts() {
        const THREADS: usize = 8;
        const CALLS: usize = 300;
        let pool = pool(&["k1", "k2", "k3", "k4"]);

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..CALLS {
                        pool.next().unwrap();
                    }
                });
            }
        });

        assert_eq!(pool.stats().total_requests, (THREADS * CALLS) as u64);
        assert_eq!(pool.cursor.load(Ordering::Relaxed), THREADS * CALLS);
        for key in &pool.keys {
            assert_eq!(key.request_count(), (THREADS * CALLS / 4) as u64);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = Credential::new("GEMINI_API_KEY", "super-secret");
        let printed = format!("{:?}", key);
        assert!(printed.contains("GEMINI_API_KEY"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_key_pool_round_robin() {
        let pool = pool(&["keyA", "keyB", "keyC"]);

        let seen: Vec<_> = (0..4).map(|_| pool.next().unwrap().secret()).collect();
        assert_eq!(seen, vec!["keyA", "keyB", "keyC", "keyA"]);
    }

    #[test]
    fn test_each_key_once_per_cycle() {
        let pool = pool(&["k1", "k2", "k3", "k4", "k5"]);

        for _ in 0..3 {
            let cycle: Vec<_> = (0..5).map(|_| pool.next().unwrap().secret()).collect();
            assert_eq!(cycle, vec!["k1", "k2", "k3", "k4", "k5"]);
        }
        assert_eq!(pool.stats().total_requests, 15);
    }

    #[test]
    fn test_single_key_pool_repeats() {
        let pool = pool(&["only"]);
        assert_eq!(pool.next().unwrap().secret(), "only");
        assert_eq!(pool.next().unwrap().secret(), "only");
    }

    #[test]
    fn test_empty_pool_fails_every_time() {
        let pool = KeyPool::empty(ProviderId::DeepSeek);

        for _ in 0..3 {
            let err = pool.next().unwrap_err();
            assert!(matches!(err, RelayError::EmptyPool(ProviderId::DeepSeek)));
        }
        assert_eq!(pool.cursor.load(Ordering::Relaxed), 0);
        assert!(!pool.all_rate_limited());
    }

    #[test]
    fn test_key_pool_skips_rate_limited() {
        let pool = pool(&["key1", "key2"]);

        pool.mark_rate_limited("env-key1", Duration::from_secs(60));

        assert_eq!(pool.next().unwrap().secret(), "key2");
        assert_eq!(pool.next().unwrap().secret(), "key2");

        pool.clear_rate_limit("env-key1");
        let next_two: Vec<_> = (0..2).map(|_| pool.next().unwrap().secret()).collect();
        assert!(next_two.contains(&"key1"));
    }

    #[test]
    fn test_all_rate_limited_returns_soonest() {
        let pool = pool(&["key1", "key2"]);

        pool.mark_rate_limited("env-key1", Duration::from_secs(120));
        pool.mark_rate_limited("env-key2", Duration::from_secs(5));

        assert!(pool.all_rate_limited());
        assert_eq!(pool.next().unwrap().secret(), "key2");

        let stats = pool.stats();
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.available_keys, 0);
        assert_eq!(stats.rate_limited_keys, 2);
    }
}
