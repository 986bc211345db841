//! Cache metrics for observability

use crate::keys::CacheKey;
use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: CounterVec,
    misses: CounterVec,
    writes: CounterVec,
    invalidations: CounterVec,
    errors: CounterVec,
}

fn counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("valid metric definition")
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: counter("movie_cache_hits_total", "Total store hits", &["entity"]),
            misses: counter("movie_cache_misses_total", "Total store misses", &["entity"]),
            writes: counter("movie_cache_writes_total", "Total store writes", &["entity"]),
            invalidations: counter(
                "movie_cache_invalidations_total",
                "Total store deletions",
                &["entity"],
            ),
            errors: counter(
                "movie_cache_errors_total",
                "Total store errors",
                &["entity", "error_type"],
            ),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.invalidations.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(CacheMetricsInner::new)
}

/// Cache metrics wrapper
#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_hit(&self, key: &str) {
        let entity = CacheKey::entity_type(key);
        get_metrics().hits.with_label_values(&[entity]).inc();
    }

    pub fn record_miss(&self, key: &str) {
        let entity = CacheKey::entity_type(key);
        get_metrics().misses.with_label_values(&[entity]).inc();
    }

    pub fn record_write(&self, key: &str) {
        let entity = CacheKey::entity_type(key);
        get_metrics().writes.with_label_values(&[entity]).inc();
    }

    pub fn record_invalidation(&self, key: &str) {
        let entity = CacheKey::entity_type(key);
        get_metrics()
            .invalidations
            .with_label_values(&[entity])
            .inc();
    }

    pub fn record_error(&self, key: &str, error_type: &str) {
        let entity = CacheKey::entity_type(key);
        get_metrics()
            .errors
            .with_label_values(&[entity, error_type])
            .inc();
    }
}
