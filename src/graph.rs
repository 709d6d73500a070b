//! Weighted co-occurrence graph over person entities
//!
//! One undirected edge per canonical entity pair; weight is the number of
//! distinct documents both endpoints share. Edges are keyed `(a, b)` with
//! `a < b` under the id total order, so `(A,B)` and `(B,A)` always land on
//! the same edge.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::aggregator::{CorpusAggregator, DocId};
use crate::normalize::EntityType;

/// An undirected, weighted edge between two entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Lesser endpoint id (total order on canonical ids)
    pub a: String,

    /// Greater endpoint id
    pub b: String,

    /// Documents in which both endpoints appear
    pub shared_document_ids: BTreeSet<DocId>,

    /// Edge weight: |shared_document_ids|
    pub strength: usize,
}

/// Builds and owns the connection set. Entity metadata stays with the
/// aggregator; this structure only holds canonical ids.
#[derive(Default)]
pub struct CoOccurrenceGraph {
    edges: HashMap<(String, String), BTreeSet<DocId>>,

    /// Person-list cap applied per document before pairing
    max_paired: usize,
}

impl CoOccurrenceGraph {
    pub fn new(max_paired: usize) -> Self {
        Self {
            edges: HashMap::new(),
            max_paired,
        }
    }

    /// Build the full edge set from the aggregator's per-document records.
    /// Discards any previously built edges (wholesale rebuild).
    pub fn build(&mut self, aggregator: &CorpusAggregator) {
        self.edges.clear();

        for record in aggregator.document_records() {
            // Cap before pairing: bounds the O(n²) blow-up on entity-dense
            // documents at the cost of undercounting their connections
            let people: Vec<&String> =
                record.person_keys.iter().take(self.max_paired).collect();

            for i in 0..people.len() {
                for j in (i + 1)..people.len() {
                    let (a, b) = canonical_pair(people[i], people[j]);
                    self.edges
                        .entry((a, b))
                        .or_default()
                        .insert(record.doc_id.clone());
                }
            }
        }
    }

    /// All connections, strongest first (endpoint ids break ties)
    pub fn connections(&self) -> Vec<Connection> {
        let mut out: Vec<Connection> = self
            .edges
            .iter()
            .map(|((a, b), docs)| Connection {
                a: a.clone(),
                b: b.clone(),
                shared_document_ids: docs.clone(),
                strength: docs.len(),
            })
            .collect();
        sort_by_strength(&mut out);
        out
    }

    /// Top edges by strength
    pub fn strongest(&self, limit: usize) -> Vec<Connection> {
        let mut out = self.connections();
        out.truncate(limit);
        out
    }

    /// Every edge incident to one entity, strongest first
    pub fn for_entity(&self, id: &str) -> Vec<Connection> {
        let mut out: Vec<Connection> = self
            .edges
            .iter()
            .filter(|((a, b), _)| a == id || b == id)
            .map(|((a, b), docs)| Connection {
                a: a.clone(),
                b: b.clone(),
                shared_document_ids: docs.clone(),
                strength: docs.len(),
            })
            .collect();
        sort_by_strength(&mut out);
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Order a pair of ids canonically so the undirected edge is stored once
pub fn canonical_pair(x: &str, y: &str) -> (String, String) {
    if x <= y {
        (x.to_string(), y.to_string())
    } else {
        (y.to_string(), x.to_string())
    }
}

fn sort_by_strength(connections: &mut [Connection]) {
    connections.sort_by(|x, y| {
        y.strength
            .cmp(&x.strength)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
}

// =============================================================================
// Visualization
// =============================================================================

/// A positioned node for graph rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub occurrences: u64,
    /// (x, y, z) on the rank-ordered spiral
    pub position: [f32; 3],
}

/// A rendered edge between two positioned nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub strength: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Rank-ordered decorative spiral layout. Positions are a deterministic
/// function of a node's rank index among the top entities, except for the
/// uniform random height jitter. This is not a force-directed or
/// graph-theoretic embedding.
pub fn visualization_data(
    aggregator: &CorpusAggregator,
    graph: &CoOccurrenceGraph,
    node_limit: usize,
    edge_limit: usize,
) -> VisualizationData {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let top = aggregator.top(node_limit, None);
    let n = node_limit.max(1) as f32;

    let nodes: Vec<GraphNode> = top
        .iter()
        .enumerate()
        .map(|(i, entity)| {
            let t = i as f32 / n;
            let angle = t * 6.0 * std::f32::consts::PI;
            let radius = 5.0 + t * 15.0;
            let height: f32 = rng.gen_range(-5.0..5.0);

            GraphNode {
                id: entity.id.clone(),
                name: entity.display_name.clone(),
                entity_type: entity.entity_type,
                occurrences: entity.occurrences,
                position: [radius * angle.cos(), height, radius * angle.sin()],
            }
        })
        .collect();

    // Only edges whose endpoints were both placed
    let placed: std::collections::HashSet<&str> =
        nodes.iter().map(|node| node.id.as_str()).collect();

    let edges: Vec<GraphEdge> = graph
        .strongest(edge_limit * 4)
        .into_iter()
        .filter(|c| placed.contains(c.a.as_str()) && placed.contains(c.b.as_str()))
        .take(edge_limit)
        .map(|c| GraphEdge {
            source: c.a,
            target: c.b,
            strength: c.strength,
        })
        .collect();

    VisualizationData { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PatternExtractor;

    fn aggregator_with(docs: &[(&str, &str)]) -> CorpusAggregator {
        let extractor = PatternExtractor::new();
        let agg = CorpusAggregator::new();
        for (id, text) in docs {
            agg.ingest(id, "test", &extractor.extract(text));
        }
        agg
    }

    #[test]
    fn test_canonical_pair_ordering() {
        assert_eq!(canonical_pair("b", "a"), ("a".to_string(), "b".to_string()));
        assert_eq!(canonical_pair("a", "b"), ("a".to_string(), "b".to_string()));
    }

    #[test]
    fn test_shared_document_scenario() {
        let agg = aggregator_with(&[
            ("doc1", "Jeffrey Epstein met Ghislaine Maxwell."),
            ("doc2", "Jeffrey Epstein met Bill Clinton."),
        ]);

        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);

        let connections = graph.connections();
        assert_eq!(connections.len(), 2);
        assert!(connections.iter().all(|c| c.strength == 1));

        // No edge between Maxwell and Clinton: never co-mentioned
        assert!(!connections.iter().any(|c| {
            c.a.contains("maxwell") && c.b.contains("clinton")
                || c.a.contains("clinton") && c.b.contains("maxwell")
        }));
    }

    #[test]
    fn test_rebuild_is_wholesale() {
        let agg = aggregator_with(&[("doc1", "Jeffrey Epstein met Ghislaine Maxwell.")]);
        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);
        let first = graph.edge_count();
        graph.build(&agg);
        assert_eq!(graph.edge_count(), first);
    }

    #[test]
    fn test_pairing_cap_bounds_edges() {
        // Five distinct people, cap at 3: C(3,2) = 3 edges, not C(5,2) = 10
        let agg = aggregator_with(&[(
            "doc1",
            "Alice Adams met Bob Brown, Carol Clark, Dan Drake and Eve Evans.",
        )]);

        let mut graph = CoOccurrenceGraph::new(3);
        graph.build(&agg);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_for_entity_filters_and_sorts() {
        let agg = aggregator_with(&[
            ("doc1", "Jeffrey Epstein met Ghislaine Maxwell."),
            ("doc2", "Jeffrey Epstein met Ghislaine Maxwell."),
            ("doc3", "Jeffrey Epstein met Bill Clinton."),
        ]);

        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);

        let edges = graph.for_entity("jeffrey epstein");
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].strength, 2); // Maxwell edge first
        assert!(edges[0].a.contains("maxwell") || edges[0].b.contains("maxwell"));
    }

    #[test]
    fn test_strength_bounded_by_endpoint_documents() {
        let agg = aggregator_with(&[
            ("doc1", "Jeffrey Epstein met Ghislaine Maxwell."),
            ("doc2", "Jeffrey Epstein met Ghislaine Maxwell."),
        ]);

        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);

        for c in graph.connections() {
            let a_docs = agg.by_id(&c.a).unwrap().document_ids.len();
            let b_docs = agg.by_id(&c.b).unwrap().document_ids.len();
            assert!(c.strength <= a_docs.min(b_docs));
        }
    }

    #[test]
    fn test_spiral_layout_positions() {
        let agg = aggregator_with(&[("doc1", "Jeffrey Epstein met Ghislaine Maxwell.")]);
        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);

        let data = visualization_data(&agg, &graph, 10, 10);
        assert!(!data.nodes.is_empty());

        for (i, node) in data.nodes.iter().enumerate() {
            let t = i as f32 / 10.0;
            let angle = t * 6.0 * std::f32::consts::PI;
            let radius = 5.0 + t * 15.0;

            assert!((node.position[0] - radius * angle.cos()).abs() < 1e-4);
            assert!((node.position[2] - radius * angle.sin()).abs() < 1e-4);
            assert!(node.position[1] >= -5.0 && node.position[1] < 5.0);
        }
    }

    #[test]
    fn test_empty_corpus_empty_graph() {
        let agg = CorpusAggregator::new();
        let mut graph = CoOccurrenceGraph::new(20);
        graph.build(&agg);

        assert!(graph.is_empty());
        assert!(graph.connections().is_empty());
        assert!(graph.strongest(10).is_empty());
        assert!(graph.for_entity("anyone").is_empty());
    }
}
