//! Pipeline orchestration and the public query surface
//!
//! Ties the components together: extraction runs in parallel per document,
//! aggregation merges results sequentially in input order, and
//! `build_graph()` is the hard barrier between ingestion and the
//! graph/discovery queries. Queries before the barrier see an empty graph
//! and yield empty results rather than errors.

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregator::{CorpusAggregator, Entity};
use crate::config::PipelineConfig;
use crate::discovery::{Cluster, Discovery, DiscoveryEngine, GeographicPattern, HubEntity};
use crate::errors::{PipelineError, Result, ValidationErrorExt};
use crate::extraction::{ExtractionResult, PatternExtractor};
use crate::graph::{self, CoOccurrenceGraph, Connection, VisualizationData};
use crate::metrics::{
    MetricsAggregator, SystemMetrics, Timer, DOCUMENTS_PROCESSED_TOTAL, ENRICHMENT_TOTAL,
    ENTITIES_EXTRACTED, EXTRACTION_DURATION, GRAPH_BUILD_DURATION, GRAPH_EDGES,
    VALIDATION_REJECTIONS,
};
use crate::validation::{validate_document_id, validate_document_text, validate_limit};

/// One input document. The id is an opaque caller-supplied key; the dataset
/// tag groups documents by source collection.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub dataset_tag: String,
}

/// Opaque external enrichment collaborator, invoked only when the
/// delegation gate fires. Failure degrades to local-only extraction for
/// that document; it never aborts the batch.
pub trait Enricher: Send + Sync {
    fn enrich(&self, doc: &Document, local: &mut ExtractionResult) -> anyhow::Result<()>;
}

/// Default enricher that does nothing
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn enrich(&self, _doc: &Document, _local: &mut ExtractionResult) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Full entity-graph pipeline over a document corpus
pub struct EntityGraphPipeline {
    config: PipelineConfig,
    extractor: PatternExtractor,
    aggregator: CorpusAggregator,
    graph: RwLock<CoOccurrenceGraph>,
    discovery: DiscoveryEngine,
    metrics: MetricsAggregator,
    enricher: Box<dyn Enricher>,
}

impl EntityGraphPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let extractor = PatternExtractor::new().with_caps(
            config.max_people_per_document,
            config.max_locations_per_document,
            config.max_dates_per_document,
            config.max_flights_per_document,
        );
        let graph = RwLock::new(CoOccurrenceGraph::new(config.max_paired_people));
        let metrics = MetricsAggregator::new(config.metrics_ttl_secs);
        let discovery = DiscoveryEngine::new(
            Box::new(crate::discovery::UuidIds),
            config.anomaly_top_edges,
        );

        Self {
            config,
            extractor,
            aggregator: CorpusAggregator::new(),
            graph,
            discovery,
            metrics,
            enricher: Box::new(NoopEnricher),
        }
    }

    /// Swap in an external enrichment collaborator
    pub fn with_enricher(mut self, enricher: Box<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Ingest a batch of documents. Extraction is embarrassingly parallel;
    /// aggregation merges sequentially in input order so repeated runs over
    /// the same corpus agree. Invalid documents are skipped and logged,
    /// never aborting the batch. Returns the number of documents ingested.
    pub fn ingest_corpus(&self, documents: &[Document]) -> usize {
        // Validate up front so the parallel phase only sees clean input
        let valid: Vec<&Document> = documents
            .iter()
            .filter(|doc| match Self::validate(doc) {
                Ok(()) => true,
                Err(e) => {
                    warn!(doc_id = %doc.id, "skipping document: {e}");
                    VALIDATION_REJECTIONS.inc();
                    DOCUMENTS_PROCESSED_TOTAL
                        .with_label_values(&["skipped"])
                        .inc();
                    false
                }
            })
            .collect();

        let extracted: Vec<(&Document, ExtractionResult)> = valid
            .par_iter()
            .map(|doc| {
                let _timer = Timer::new(EXTRACTION_DURATION.clone());
                let result = self.extractor.extract(&doc.text);
                (*doc, result)
            })
            .collect();

        // Enrichment and aggregation stay sequential: the enricher is an
        // external collaborator and merge order determines nothing but we
        // keep it reproducible anyway
        let mut ingested = 0usize;
        for (doc, mut result) in extracted {
            if PatternExtractor::needs_external_analysis(result.total_found(), doc.text.len()) {
                // The enricher works on a scratch copy; a collaborator that
                // writes partial output and then fails must not leave the
                // local extraction half-mutated
                let mut enriched = result.clone();
                match self.enricher.enrich(doc, &mut enriched) {
                    Ok(()) => {
                        result = enriched;
                        ENRICHMENT_TOTAL.with_label_values(&["ok"]).inc();
                        DOCUMENTS_PROCESSED_TOTAL
                            .with_label_values(&["delegated"])
                            .inc();
                    }
                    Err(e) => {
                        warn!(doc_id = %doc.id, "enrichment failed, using local results: {e}");
                        ENRICHMENT_TOTAL.with_label_values(&["failed"]).inc();
                    }
                }
            }

            ENTITIES_EXTRACTED
                .with_label_values(&["people"])
                .observe(result.people.len() as f64);
            ENTITIES_EXTRACTED
                .with_label_values(&["locations"])
                .observe(result.locations.len() as f64);
            ENTITIES_EXTRACTED
                .with_label_values(&["dates"])
                .observe(result.dates.len() as f64);
            ENTITIES_EXTRACTED
                .with_label_values(&["flights"])
                .observe(result.flights.len() as f64);

            self.aggregator.ingest(&doc.id, &doc.dataset_tag, &result);
            DOCUMENTS_PROCESSED_TOTAL.with_label_values(&["ok"]).inc();
            ingested += 1;
        }

        self.metrics.invalidate();
        info!(
            ingested,
            skipped = documents.len() - ingested,
            entities = self.aggregator.entity_count(),
            "corpus ingestion complete"
        );
        ingested
    }

    fn validate(doc: &Document) -> anyhow::Result<()> {
        validate_document_id(&doc.id)?;
        validate_document_text(&doc.text)?;
        Ok(())
    }

    /// Rebuild the co-occurrence graph from everything ingested so far.
    /// The barrier between ingestion and graph-backed queries.
    pub fn build_graph(&self) {
        let _timer = Timer::new(GRAPH_BUILD_DURATION.clone());
        let mut graph = self.graph.write();
        graph.build(&self.aggregator);
        GRAPH_EDGES.set(graph.edge_count() as i64);
        drop(graph);

        self.metrics.invalidate();
        info!(edges = self.graph.read().edge_count(), "graph built");
    }

    // =========================================================================
    // Entity queries
    // =========================================================================

    pub fn entities(&self) -> Vec<Entity> {
        self.aggregator.all()
    }

    pub fn top_entities(
        &self,
        limit: usize,
        type_filter: Option<crate::normalize::EntityType>,
    ) -> Result<Vec<Entity>> {
        validate_limit(limit).map_validation_err("limit")?;
        Ok(self.aggregator.top(limit, type_filter))
    }

    pub fn search_entities(&self, query: &str, limit: usize) -> Result<Vec<Entity>> {
        validate_limit(limit).map_validation_err("limit")?;
        Ok(self.aggregator.search(query, limit))
    }

    /// Entity details plus its connections, or EntityNotFound
    pub fn entity_profile(&self, id: &str) -> Result<(Entity, Vec<Connection>)> {
        let entity = self
            .aggregator
            .by_id(id)
            .ok_or_else(|| PipelineError::EntityNotFound(id.to_string()))?;
        let connections = self.graph.read().for_entity(id);
        Ok((entity, connections))
    }

    // =========================================================================
    // Graph queries
    // =========================================================================

    pub fn connections(&self) -> Vec<Connection> {
        self.graph.read().connections()
    }

    pub fn strongest_connections(&self, limit: usize) -> Result<Vec<Connection>> {
        validate_limit(limit).map_validation_err("limit")?;
        Ok(self.graph.read().strongest(limit))
    }

    pub fn visualization(&self, node_limit: usize, edge_limit: usize) -> Result<VisualizationData> {
        validate_limit(node_limit).map_validation_err("node_limit")?;
        validate_limit(edge_limit).map_validation_err("edge_limit")?;
        Ok(graph::visualization_data(
            &self.aggregator,
            &self.graph.read(),
            node_limit,
            edge_limit,
        ))
    }

    // =========================================================================
    // Discovery queries
    // =========================================================================

    pub fn discoveries(&self) -> Vec<Discovery> {
        let _timer = Timer::new(crate::metrics::DISCOVERY_DURATION.clone());
        let graph = self.graph.read();
        let discoveries = self.discovery.run_all_discoveries(&self.aggregator, &graph);
        for d in &discoveries {
            crate::metrics::DISCOVERIES_TOTAL
                .with_label_values(&[match d.discovery_type {
                    crate::discovery::DiscoveryType::NetworkCluster => "network_cluster",
                    crate::discovery::DiscoveryType::GeographicPattern => "geographic_pattern",
                    crate::discovery::DiscoveryType::StrongConnection => "strong_connection",
                }])
                .inc();
        }
        discoveries
    }

    pub fn clusters(&self, min_strength: usize, min_size: usize) -> Vec<Cluster> {
        self.discovery
            .find_network_clusters(&self.graph.read(), min_strength, min_size)
    }

    pub fn hubs(&self, limit: usize) -> Result<Vec<HubEntity>> {
        validate_limit(limit).map_validation_err("limit")?;
        Ok(self
            .discovery
            .find_most_connected(&self.aggregator, &self.graph.read(), limit))
    }

    pub fn geographic_patterns(&self) -> Vec<GeographicPattern> {
        self.discovery.find_geographic_patterns(&self.aggregator)
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    pub fn system_metrics(&self) -> SystemMetrics {
        self.metrics.get(&self.aggregator, &self.graph.read())
    }
}
