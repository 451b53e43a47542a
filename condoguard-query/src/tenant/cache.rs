//! Caching layer for tenant directory lookups.
//!
//! Tenants change rarely, so lookups are cached with a TTL. Misses are
//! cached too (with a shorter TTL) so that requests for unknown subdomains
//! do not hit the store every time. Store errors are never cached.
//!
//! ```rust,ignore
//! use condoguard_query::tenant::{CacheConfig, CachedDirectory, EngineDirectory};
//!
//! let directory = CachedDirectory::new(
//!     EngineDirectory::new(engine),
//!     CacheConfig::new(1_000).with_ttl(Duration::from_secs(300)),
//! );
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use super::directory::TenantDirectory;
use super::model::Tenant;
use crate::config::TenancyConfig;
use crate::error::QueryResult;

/// Configuration for the tenant cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Time-to-live for cached tenants.
    pub ttl: Duration,
    /// Time-to-live for negative entries (subdomain not registered).
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(300),
            negative_ttl: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with the given max entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Default::default()
        }
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the negative TTL.
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// `None` is a negative entry.
    tenant: Option<Tenant>,
    created_at: Instant,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(tenant: Option<Tenant>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            tenant,
            created_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Counters for cache behaviour.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    /// Lookups answered with a cached tenant.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups answered with a cached "not registered".
    pub fn negative_hits(&self) -> u64 {
        self.negative_hits.load(Ordering::Relaxed)
    }

    /// Lookups that went to the inner directory.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Entries dropped to make room.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Fraction of lookups served from cache.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits() + self.negative_hits();
        let total = served + self.misses();
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

/// A [`TenantDirectory`] that caches another directory's answers.
#[derive(Debug)]
pub struct CachedDirectory<D> {
    inner: D,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    metrics: CacheMetrics,
}

impl<D: TenantDirectory> CachedDirectory<D> {
    /// Wrap `inner` with a cache.
    pub fn new(inner: D, config: CacheConfig) -> Self {
        Self {
            inner,
            config,
            entries: RwLock::new(HashMap::new()),
            metrics: CacheMetrics::default(),
        }
    }

    /// Wrap `inner` with the cache settings of `config`.
    pub fn from_config(inner: D, config: &TenancyConfig) -> Self {
        Self::new(inner, config.cache.to_cache_config())
    }

    /// The cache counters.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Number of live and expired entries currently held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry for `subdomain`.
    pub fn invalidate(&self, subdomain: &str) {
        self.entries.write().remove(&subdomain.to_ascii_lowercase());
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn lookup(&self, key: &str) -> Option<Option<Tenant>> {
        let entries = self.entries.read();
        let entry = entries.get(key).filter(|e| !e.is_expired())?;
        if entry.tenant.is_some() {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.negative_hits.fetch_add(1, Ordering::Relaxed);
        }
        Some(entry.tenant.clone())
    }

    fn store(&self, key: String, tenant: Option<Tenant>) {
        let ttl = if tenant.is_some() {
            self.config.ttl
        } else {
            self.config.negative_ttl
        };
        if self.config.max_entries == 0 || ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write();
        if entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            entries.retain(|_, e| !e.is_expired());
        }
        while entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                    self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
        entries.insert(key, CacheEntry::new(tenant, ttl));
    }
}

#[async_trait]
impl<D: TenantDirectory> TenantDirectory for CachedDirectory<D> {
    async fn find_by_subdomain(&self, subdomain: &str) -> QueryResult<Option<Tenant>> {
        let key = subdomain.to_ascii_lowercase();
        if let Some(cached) = self.lookup(&key) {
            trace!(found = cached.is_some(), "Tenant directory cache hit");
            return Ok(cached);
        }

        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        let tenant = self.inner.find_by_subdomain(&key).await?;
        self.store(key, tenant.clone());
        Ok(tenant)
    }
}
