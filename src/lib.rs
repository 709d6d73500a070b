//! docgraph Library
//!
//! Entity-graph pipeline for unstructured document corpora.
//! Turns raw text into a typed entity directory, a weighted co-occurrence
//! graph, and derived analytics.
//!
//! # Key Features
//! - Rule-based extraction (gazetteers + regex families with confidences)
//! - Corpus-wide aggregation with type-namespaced canonical keys
//! - Weighted co-occurrence graph over person entities
//! - Discovery heuristics (clusters, hubs, geographic patterns, anomalies)
//! - TTL-cached corpus metrics plus Prometheus instrumentation
//!
//! # Pipeline shape
//! - Per-document extraction is parallel (rayon); aggregation is sequential
//! - `build_graph()` is the barrier between ingestion and graph queries
//! - Single-pass, best-effort batch semantics: bad documents are skipped
//!   and logged, never retried

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod errors;
pub mod extraction;
pub mod graph;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod tracing_setup;
pub mod validation;

pub use aggregator::{CorpusAggregator, DocId, DocumentRecord, Entity};
pub use config::PipelineConfig;
pub use discovery::{
    Cluster, Discovery, DiscoveryEngine, DiscoveryType, GeographicPattern, HubEntity, Severity,
};
pub use errors::{PipelineError, Result};
pub use extraction::{ExtractionResult, PatternExtractor};
pub use graph::{CoOccurrenceGraph, Connection, VisualizationData};
pub use metrics::{MetricsAggregator, SystemMetrics};
pub use normalize::EntityType;
pub use pipeline::{Document, Enricher, EntityGraphPipeline, NoopEnricher};

// Re-export dependencies to ensure tests/benchmarks use the same version
pub use chrono;
pub use parking_lot;
pub use uuid;
