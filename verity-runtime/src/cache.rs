//! Result cache seam
//!
//! The orchestrator works the same whether every lookup hits or misses;
//! a cache only saves time. Keys are query fingerprints.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

use verity_core::ConsolidatedResult;

/// Cache of finished results keyed by query fingerprint
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<ConsolidatedResult>;

    async fn set(&self, key: &str, value: ConsolidatedResult, ttl: Duration);
}

/// A cache that never holds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl ResultCache for NoCache {
    async fn get(&self, _key: &str) -> Option<ConsolidatedResult> {
        None
    }

    async fn set(&self, _key: &str, _value: ConsolidatedResult, _ttl: Duration) {}
}

#[derive(Clone)]
struct CachedEntry {
    result: ConsolidatedResult,
    ttl: Duration,
}

/// Expire each entry after its own TTL
struct EntryTtl;

impl Expiry<String, CachedEntry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, CachedEntry>,
}

impl MemoryCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<ConsolidatedResult> {
        self.cache.get(key).await.map(|entry| entry.result)
    }

    async fn set(&self, key: &str, value: ConsolidatedResult, ttl: Duration) {
        self.cache
            .insert(key.to_string(), CachedEntry { result: value, ttl })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use verity_core::{general_context, TerminalState, Verdict, VerdictLabel};

    fn result(query: &str) -> ConsolidatedResult {
        ConsolidatedResult {
            query: query.to_string(),
            fingerprint: "abc".to_string(),
            verdict: Verdict {
                label: VerdictLabel::True,
                confidence: 0.8,
                summary: "ok".to_string(),
                engine_agreement: false,
            },
            evidence: Vec::new(),
            engine_verdicts: Vec::new(),
            domain_context: general_context(),
            timing_ms: 10,
            errors: BTreeMap::new(),
            state: TerminalState::Done,
            cached: false,
        }
    }

    #[tokio::test]
    async fn test_no_cache_always_misses() {
        let cache = NoCache;
        cache.set("k", result("q"), Duration::from_secs(60)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new(16);
        cache.set("k", result("q"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.map(|r| r.query), Some("q".to_string()));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_entry_expires() {
        let cache = MemoryCache::new(16);
        cache.set("short", result("q"), Duration::from_millis(50)).await;
        cache.set("long", result("q"), Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }
}
