//! End-to-end pipeline integration tests
//!
//! Drives the full pipeline the way the CLI does: ingest a corpus, build
//! the graph, then exercise the query surface, the metrics cache, the
//! delegation gate and the failure-tolerance guarantees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docgraph::config::PipelineConfig;
use docgraph::extraction::{ExtractedEntity, ExtractionResult};
use docgraph::normalize::EntityType;
use docgraph::pipeline::{Document, Enricher, EntityGraphPipeline};

fn doc(id: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        text: text.to_string(),
        dataset_tag: "pipeline_tests".to_string(),
    }
}

fn flight_log_corpus() -> Vec<Document> {
    vec![
        doc(
            "deposition-1",
            "Jeffrey Epstein and Ghislaine Maxwell were deposed on 03/04/2008 \
             regarding the Palm Beach property.",
        ),
        doc(
            "deposition-2",
            "Jeffrey Epstein met Bill Clinton. The flight TEB -> PBI on \
             03/05/2008 is documented.",
        ),
        doc(
            "manifest-1",
            "Manifest 03/05/2008 TEB -> PBI: Jeffrey Epstein, Ghislaine Maxwell, \
             Sarah Kellen.",
        ),
    ]
}

// ==================== End to end ====================

mod end_to_end {
    use super::*;

    #[test]
    fn test_full_run_query_surface() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        assert_eq!(pipeline.ingest_corpus(&flight_log_corpus()), 3);
        pipeline.build_graph();

        // Entities
        let top_people = pipeline.top_entities(10, Some(EntityType::Person)).unwrap();
        assert_eq!(top_people[0].display_name, "Jeffrey Epstein");
        assert_eq!(top_people[0].document_ids.len(), 3);

        let hits = pipeline.search_entities("maxwell", 10).unwrap();
        assert_eq!(hits.len(), 1);

        // Profile
        let (entity, connections) = pipeline.entity_profile("ghislaine maxwell").unwrap();
        assert_eq!(entity.document_ids.len(), 2);
        assert!(!connections.is_empty());

        // Graph
        let strongest = pipeline.strongest_connections(5).unwrap();
        assert_eq!(strongest[0].strength, 2); // Epstein-Maxwell in two documents

        // Metrics
        let metrics = pipeline.system_metrics();
        assert_eq!(metrics.documents_processed, 3);
        assert_eq!(metrics.people, 4);
        assert_eq!(metrics.flights, 1); // same route+date collapses

        // Visualization
        let viz = pipeline.visualization(10, 10).unwrap();
        assert!(!viz.nodes.is_empty());
    }

    #[test]
    fn test_reingesting_document_keeps_membership_stable() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        let corpus = flight_log_corpus();
        pipeline.ingest_corpus(&corpus);
        pipeline.ingest_corpus(&corpus[..1].to_vec());
        pipeline.build_graph();

        let (entity, _) = pipeline.entity_profile("jeffrey epstein").unwrap();
        // document_ids never double; occurrence counts may
        assert_eq!(entity.document_ids.len(), 3);
        assert_eq!(pipeline.system_metrics().documents_processed, 3);
    }

    #[test]
    fn test_ingest_after_build_requires_rebuild() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        pipeline.ingest_corpus(&flight_log_corpus());
        pipeline.build_graph();
        let before = pipeline.connections().len();

        pipeline.ingest_corpus(&[doc(
            "late-arrival",
            "Alan Dershowitz met Alfredo Rodriguez.",
        )]);
        // Old snapshot until the barrier runs again
        assert_eq!(pipeline.connections().len(), before);

        pipeline.build_graph();
        assert_eq!(pipeline.connections().len(), before + 1);
    }
}

// ==================== Fault tolerance ====================

mod fault_tolerance {
    use super::*;

    #[test]
    fn test_bad_documents_do_not_poison_batch() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        let mut corpus = flight_log_corpus();
        corpus.insert(1, doc("", "missing id"));
        corpus.insert(2, doc("blank-doc", "   \n  "));
        corpus.push(doc("huge-doc", &"x".repeat(6 * 1024 * 1024)));

        assert_eq!(pipeline.ingest_corpus(&corpus), 3);
        pipeline.build_graph();
        assert_eq!(pipeline.system_metrics().documents_processed, 3);
    }

    #[test]
    fn test_queries_on_empty_pipeline() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        pipeline.build_graph();

        assert!(pipeline.entities().is_empty());
        assert!(pipeline.strongest_connections(10).unwrap().is_empty());
        assert!(pipeline.discoveries().is_empty());
        assert!(pipeline.clusters(1, 2).is_empty());
        assert!(pipeline.visualization(10, 10).unwrap().nodes.is_empty());
    }
}

// ==================== Enrichment ====================

struct CountingEnricher {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl Enricher for CountingEnricher {
    fn enrich(&self, _doc: &Document, local: &mut ExtractionResult) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Writes before failing, like a collaborator dying mid-response
        local.people.push(ExtractedEntity {
            name: "Remote Finding".to_string(),
            confidence: 0.6,
            mentions: 1,
            context: None,
        });
        if self.fail {
            anyhow::bail!("collaborator timeout");
        }
        Ok(())
    }
}

mod enrichment {
    use super::*;

    fn sparse_text() -> String {
        "nothing recognizable appears in this long passage of plain words ".repeat(100)
    }

    #[test]
    fn test_gate_fires_only_for_sparse_long_documents() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline =
            EntityGraphPipeline::new(PipelineConfig::default()).with_enricher(Box::new(
                CountingEnricher {
                    calls: calls.clone(),
                    fail: false,
                },
            ));

        pipeline.ingest_corpus(&[
            doc("sparse", &sparse_text()),
            doc("rich", "Jeffrey Epstein met Ghislaine Maxwell in Palm Beach on 03/04/2008."),
        ]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The enricher's contribution landed in the directory
        assert!(pipeline
            .search_entities("Remote Finding", 5)
            .unwrap()
            .first()
            .is_some());
    }

    #[test]
    fn test_failure_degrades_to_local_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline =
            EntityGraphPipeline::new(PipelineConfig::default()).with_enricher(Box::new(
                CountingEnricher {
                    calls: calls.clone(),
                    fail: true,
                },
            ));

        let ingested = pipeline.ingest_corpus(&[doc("sparse", &sparse_text())]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ingested, 1, "enrichment failure must not drop the document");

        // The collaborator wrote a partial result before failing; none of
        // it may leak into the directory
        assert!(pipeline
            .search_entities("Remote Finding", 5)
            .unwrap()
            .is_empty());
    }
}

// ==================== Metrics cache ====================

mod metrics_cache {
    use super::*;

    #[test]
    fn test_ingest_invalidates_cache() {
        let pipeline = EntityGraphPipeline::new(PipelineConfig::default());
        pipeline.ingest_corpus(&flight_log_corpus());
        pipeline.build_graph();
        let before = pipeline.system_metrics();

        pipeline.ingest_corpus(&[doc("extra", "Alan Dershowitz filed a motion.")]);

        let after = pipeline.system_metrics();
        assert_eq!(after.documents_processed, before.documents_processed + 1);
        assert_eq!(after.people, before.people + 1);
    }
}
