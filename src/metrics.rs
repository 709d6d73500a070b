//! Corpus metrics with Prometheus plus a TTL-cached summary snapshot
//!
//! Two layers:
//! - Prometheus counters/histograms for operational monitoring
//! - A `MetricsAggregator` that computes corpus-wide counts on demand and
//!   caches the snapshot for a TTL, since every recompute is a full
//!   directory scan
//!
//! NOTE: We intentionally avoid document_id in metric labels to prevent
//! high-cardinality explosion that can crash Prometheus.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::aggregator::CorpusAggregator;
use crate::graph::CoOccurrenceGraph;
use crate::normalize::EntityType;

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Ingestion Metrics
    // ============================================================================

    /// Documents processed by result
    pub static ref DOCUMENTS_PROCESSED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docgraph_documents_processed_total", "Total documents processed"),
        &["result"]  // result: "ok", "skipped", "delegated"
    ).unwrap();

    /// Per-document extraction duration
    pub static ref EXTRACTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docgraph_extraction_duration_seconds",
            "Per-document extraction duration"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    ).unwrap();

    /// Entities extracted per document, by category
    pub static ref ENTITIES_EXTRACTED: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "docgraph_entities_extracted",
            "Entities extracted per document"
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &["category"]  // category: "people", "locations", "dates", "flights"
    ).unwrap();

    /// External enrichment delegations by result
    pub static ref ENRICHMENT_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docgraph_enrichment_total", "External enrichment delegations"),
        &["result"]  // result: "ok", "failed"
    ).unwrap();

    // ============================================================================
    // Graph Metrics (aggregate)
    // ============================================================================

    /// Current edge count in the co-occurrence graph
    pub static ref GRAPH_EDGES: IntGauge = IntGauge::new(
        "docgraph_graph_edges",
        "Edges in the co-occurrence graph"
    ).unwrap();

    /// Graph rebuild duration
    pub static ref GRAPH_BUILD_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docgraph_graph_build_duration_seconds",
            "Full graph rebuild duration"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).unwrap();

    // ============================================================================
    // Discovery Metrics
    // ============================================================================

    /// Discovery pass duration
    pub static ref DISCOVERY_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docgraph_discovery_duration_seconds",
            "Full discovery pass duration"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).unwrap();

    /// Discoveries emitted by type
    pub static ref DISCOVERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docgraph_discoveries_total", "Discoveries emitted"),
        &["discovery_type"]
    ).unwrap();

    // ============================================================================
    // Cache and Error Metrics
    // ============================================================================

    /// Metrics snapshot cache hits and misses
    pub static ref METRICS_CACHE_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docgraph_metrics_cache_total", "Metrics cache lookups"),
        &["result"]  // result: "hit", "miss"
    ).unwrap();

    /// Total errors by type
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("docgraph_errors_total", "Total errors by type"),
        &["error_type"]
    ).unwrap();

    /// Documents rejected by validation
    pub static ref VALIDATION_REJECTIONS: IntCounter = IntCounter::new(
        "docgraph_validation_rejections",
        "Documents rejected by input validation"
    ).unwrap();
}

/// Register all metrics with the global registry
pub fn register_metrics() -> Result<(), prometheus::Error> {
    // Ingestion metrics
    METRICS_REGISTRY.register(Box::new(DOCUMENTS_PROCESSED_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(EXTRACTION_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(ENTITIES_EXTRACTED.clone()))?;
    METRICS_REGISTRY.register(Box::new(ENRICHMENT_TOTAL.clone()))?;

    // Graph metrics
    METRICS_REGISTRY.register(Box::new(GRAPH_EDGES.clone()))?;
    METRICS_REGISTRY.register(Box::new(GRAPH_BUILD_DURATION.clone()))?;

    // Discovery metrics
    METRICS_REGISTRY.register(Box::new(DISCOVERY_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(DISCOVERIES_TOTAL.clone()))?;

    // Cache and error metrics
    METRICS_REGISTRY.register(Box::new(METRICS_CACHE_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(VALIDATION_REJECTIONS.clone()))?;

    Ok(())
}

/// Helper to time operations with histogram (RAII pattern)
/// Usage: let _timer = Timer::new(EXTRACTION_DURATION.clone());
#[allow(unused)] // Public API utility for metrics consumers
pub struct Timer {
    histogram: Histogram,
    start: Instant,
}

#[allow(unused)] // Public API utility
impl Timer {
    /// Create timer that records duration to histogram on drop
    pub fn new(histogram: Histogram) -> Self {
        Self {
            histogram,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

// ============================================================================
// Corpus summary snapshot
// ============================================================================

/// Corpus-wide counts served to status views
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub documents_processed: usize,
    pub people: usize,
    pub locations: usize,
    pub organizations: usize,
    pub dates: usize,
    pub flights: usize,
    pub connections: usize,
}

struct CachedMetrics {
    data: SystemMetrics,
    computed_at: Instant,
}

/// Computes the summary snapshot on demand and caches it for a TTL.
///
/// Concurrent misses may each recompute independently; last writer wins,
/// which is harmless because all of them computed from live state.
pub struct MetricsAggregator {
    cache: Mutex<Option<CachedMetrics>>,
    ttl: Duration,
}

impl MetricsAggregator {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            cache: Mutex::new(None),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Cached snapshot, recomputed if older than the TTL
    pub fn get(
        &self,
        aggregator: &CorpusAggregator,
        graph: &CoOccurrenceGraph,
    ) -> SystemMetrics {
        {
            let cache = self.cache.lock();
            if let Some(cached) = cache.as_ref() {
                if cached.computed_at.elapsed() < self.ttl {
                    METRICS_CACHE_TOTAL.with_label_values(&["hit"]).inc();
                    return cached.data.clone();
                }
            }
        }

        METRICS_CACHE_TOTAL.with_label_values(&["miss"]).inc();
        self.refresh(aggregator, graph)
    }

    /// Force a recompute, replacing whatever is cached
    pub fn refresh(
        &self,
        aggregator: &CorpusAggregator,
        graph: &CoOccurrenceGraph,
    ) -> SystemMetrics {
        let data = compute(aggregator, graph);
        *self.cache.lock() = Some(CachedMetrics {
            data: data.clone(),
            computed_at: Instant::now(),
        });
        data
    }

    /// Drop the cached snapshot so the next read recomputes
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }
}

fn compute(aggregator: &CorpusAggregator, graph: &CoOccurrenceGraph) -> SystemMetrics {
    let mut metrics = SystemMetrics {
        documents_processed: aggregator.document_count(),
        connections: graph.edge_count(),
        ..Default::default()
    };

    for entity in aggregator.all() {
        match entity.entity_type {
            EntityType::Person => metrics.people += 1,
            EntityType::Location => metrics.locations += 1,
            EntityType::Organization => metrics.organizations += 1,
            EntityType::Date => metrics.dates += 1,
            EntityType::Flight => metrics.flights += 1,
        }
    }

    metrics
}
