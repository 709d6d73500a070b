//! Discovery engine: read-only analyses over the aggregated corpus
//!
//! Every analysis here consumes aggregator and graph snapshots without
//! mutating them, so discoveries can be recomputed at any time and two runs
//! over the same corpus agree (ids aside).

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::info;
use uuid::Uuid;

use crate::aggregator::{CorpusAggregator, DocId};
use crate::constants::{
    ANOMALY_HIGH_STRENGTH, ANOMALY_MIN_STRENGTH, ANOMALY_TOP_EDGES, CLUSTER_CRITICAL_SIZE,
    CLUSTER_DISCOVERY_MIN_SIZE, GEO_DISCOVERY_MIN_PEOPLE, GEO_HIGH_PEOPLE, GEO_MIN_PEOPLE,
};
use crate::graph::CoOccurrenceGraph;

/// Discovery severity, ordered most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank: lower sorts first
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryType {
    NetworkCluster,
    GeographicPattern,
    StrongConnection,
}

/// A single finding produced by one of the analyses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub id: String,
    #[serde(rename = "type")]
    pub discovery_type: DiscoveryType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Canonical ids of the entities involved
    pub entity_ids: Vec<String>,
    /// Documents supporting the finding
    pub document_ids: BTreeSet<DocId>,
    /// Analysis-specific details (sizes, strengths, location names)
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// A connected component of the co-occurrence graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub entity_ids: Vec<String>,
    pub size: usize,
    /// Sum of edge strengths inside the component, each edge counted once
    pub total_strength: usize,
    pub avg_strength: f64,
    /// Union of the shared-document sets of the component's edges
    pub document_ids: BTreeSet<DocId>,
}

/// A location together with the people and dates appearing in its documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographicPattern {
    pub location_id: String,
    pub location_name: String,
    pub people: Vec<String>,
    pub dates: Vec<String>,
    pub document_ids: BTreeSet<DocId>,
    pub document_count: usize,
}

/// An entity ranked by weighted degree in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubEntity {
    pub id: String,
    pub name: String,
    /// Weighted degree: sum of incident edge strengths
    pub connections: usize,
    pub documents: usize,
}

/// Supplies ids for emitted discoveries. Production uses [`UuidIds`]; tests
/// swap in [`SequentialIds`] for stable assertions.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic counter-based ids
#[derive(Default)]
pub struct SequentialIds {
    counter: std::sync::atomic::AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("discovery-{n}")
    }
}

/// Runs the individual analyses and the combined discovery pass
pub struct DiscoveryEngine {
    ids: Box<dyn IdGenerator>,
    anomaly_top_edges: usize,
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new(Box::new(UuidIds), ANOMALY_TOP_EDGES)
    }
}

impl DiscoveryEngine {
    pub fn new(ids: Box<dyn IdGenerator>, anomaly_top_edges: usize) -> Self {
        Self {
            ids,
            anomaly_top_edges,
        }
    }

    /// Connected components of the graph with at least `min_strength` on
    /// every traversed edge and at least `min_size` members. Components
    /// below the size floor are dropped, never merged. Sorted by size
    /// descending, then average strength descending.
    pub fn find_network_clusters(
        &self,
        graph: &CoOccurrenceGraph,
        min_strength: usize,
        min_size: usize,
    ) -> Vec<Cluster> {
        // Adjacency restricted to qualifying edges
        let mut adjacency: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        let connections = graph.connections();
        for c in &connections {
            if c.strength >= min_strength {
                adjacency.entry(&c.a).or_default().push((&c.b, c.strength));
                adjacency.entry(&c.b).or_default().push((&c.a, c.strength));
            }
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut clusters = Vec::new();

        // Deterministic seed order
        let mut seeds: Vec<&str> = adjacency.keys().copied().collect();
        seeds.sort_unstable();

        for seed in seeds {
            if visited.contains(seed) {
                continue;
            }

            // Iterative BFS; recursion would overflow on chain-shaped
            // components in a large corpus
            let mut members: BTreeSet<&str> = BTreeSet::new();
            let mut queue: VecDeque<&str> = VecDeque::new();
            visited.insert(seed);
            queue.push_back(seed);

            while let Some(node) = queue.pop_front() {
                members.insert(node);
                if let Some(neighbors) = adjacency.get(node) {
                    for &(next, _) in neighbors {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }

            // Each undirected edge counted once via the canonical (a, b) key
            let mut total_strength = 0usize;
            let mut edge_count = 0usize;
            let mut document_ids: BTreeSet<DocId> = BTreeSet::new();
            for c in &connections {
                if c.strength >= min_strength
                    && members.contains(c.a.as_str())
                    && members.contains(c.b.as_str())
                {
                    total_strength += c.strength;
                    edge_count += 1;
                    document_ids.extend(c.shared_document_ids.iter().cloned());
                }
            }

            if members.len() < min_size {
                continue;
            }

            let avg_strength = if edge_count > 0 {
                total_strength as f64 / edge_count as f64
            } else {
                0.0
            };

            clusters.push(Cluster {
                id: self.ids.next_id(),
                entity_ids: members.iter().map(|s| s.to_string()).collect(),
                size: members.len(),
                total_strength,
                avg_strength,
                document_ids,
            });
        }

        clusters.sort_by(|x, y| {
            y.size.cmp(&x.size).then_with(|| {
                y.avg_strength
                    .partial_cmp(&x.avg_strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        clusters
    }

    /// Entities ranked by weighted degree (id ascending tie-break)
    pub fn find_most_connected(
        &self,
        aggregator: &CorpusAggregator,
        graph: &CoOccurrenceGraph,
        limit: usize,
    ) -> Vec<HubEntity> {
        let mut degrees: HashMap<String, usize> = HashMap::new();
        for c in graph.connections() {
            *degrees.entry(c.a.clone()).or_default() += c.strength;
            *degrees.entry(c.b.clone()).or_default() += c.strength;
        }

        let mut hubs: Vec<HubEntity> = degrees
            .into_iter()
            .filter_map(|(id, weighted_degree)| {
                let entity = aggregator.by_id(&id)?;
                Some(HubEntity {
                    id,
                    name: entity.display_name,
                    connections: weighted_degree,
                    documents: entity.document_ids.len(),
                })
            })
            .collect();

        hubs.sort_by(|x, y| {
            y.connections
                .cmp(&x.connections)
                .then_with(|| x.id.cmp(&y.id))
        });
        hubs.truncate(limit);
        hubs
    }

    /// Locations whose documents collectively mention at least three people.
    /// People and dates are associated with a location by sharing a
    /// document, not by textual proximity.
    pub fn find_geographic_patterns(
        &self,
        aggregator: &CorpusAggregator,
    ) -> Vec<GeographicPattern> {
        type LocationAccumulator = (BTreeSet<String>, BTreeSet<String>, BTreeSet<DocId>);
        let mut by_location: HashMap<String, LocationAccumulator> = HashMap::new();

        for record in aggregator.document_records() {
            for loc_key in &record.location_keys {
                let (people, dates, docs) = by_location.entry(loc_key.clone()).or_default();
                for person_key in &record.person_keys {
                    people.insert(person_key.clone());
                }
                for date_key in &record.date_keys {
                    dates.insert(date_key.clone());
                }
                docs.insert(record.doc_id.clone());
            }
        }

        let mut patterns: Vec<GeographicPattern> = by_location
            .into_iter()
            .filter(|(_, (people, _, _))| people.len() >= GEO_MIN_PEOPLE)
            .filter_map(|(loc_id, (people, dates, docs))| {
                let entity = aggregator.by_id(&loc_id)?;
                Some(GeographicPattern {
                    location_id: loc_id,
                    location_name: entity.display_name,
                    people: people.into_iter().collect(),
                    dates: dates.into_iter().collect(),
                    document_count: docs.len(),
                    document_ids: docs,
                })
            })
            .collect();

        patterns.sort_by(|x, y| {
            y.people
                .len()
                .cmp(&x.people.len())
                .then_with(|| x.location_id.cmp(&y.location_id))
        });
        patterns
    }

    /// Unusually strong edges among the top of the strength ranking
    pub fn find_co_occurrence_anomalies(
        &self,
        aggregator: &CorpusAggregator,
        graph: &CoOccurrenceGraph,
    ) -> Vec<Discovery> {
        graph
            .strongest(self.anomaly_top_edges)
            .into_iter()
            .filter(|c| c.strength >= ANOMALY_MIN_STRENGTH)
            .map(|c| {
                let a_name = display_name_or_id(aggregator, &c.a);
                let b_name = display_name_or_id(aggregator, &c.b);
                let severity = if c.strength >= ANOMALY_HIGH_STRENGTH {
                    Severity::High
                } else {
                    Severity::Medium
                };

                let mut metadata = BTreeMap::new();
                metadata.insert("strength".to_string(), json!(c.strength));

                Discovery {
                    id: self.ids.next_id(),
                    discovery_type: DiscoveryType::StrongConnection,
                    severity,
                    title: format!("Strong connection: {a_name} and {b_name}"),
                    description: format!(
                        "{a_name} and {b_name} appear together in {} documents",
                        c.strength
                    ),
                    document_ids: c.shared_document_ids,
                    entity_ids: vec![c.a, c.b],
                    metadata,
                }
            })
            .collect()
    }

    /// Full discovery pass: clusters, geographic patterns and anomalies,
    /// merged and sorted by severity
    pub fn run_all_discoveries(
        &self,
        aggregator: &CorpusAggregator,
        graph: &CoOccurrenceGraph,
    ) -> Vec<Discovery> {
        let mut discoveries = Vec::new();

        for cluster in self.find_network_clusters(graph, 1, CLUSTER_DISCOVERY_MIN_SIZE) {
            let severity = if cluster.size >= CLUSTER_CRITICAL_SIZE {
                Severity::Critical
            } else {
                Severity::High
            };
            let mut metadata = BTreeMap::new();
            metadata.insert("size".to_string(), json!(cluster.size));
            metadata.insert("total_strength".to_string(), json!(cluster.total_strength));
            metadata.insert("avg_strength".to_string(), json!(cluster.avg_strength));

            discoveries.push(Discovery {
                id: self.ids.next_id(),
                discovery_type: DiscoveryType::NetworkCluster,
                severity,
                title: format!("Network cluster of {} entities", cluster.size),
                description: format!(
                    "{} connected entities, average connection strength {:.1}",
                    cluster.size, cluster.avg_strength
                ),
                entity_ids: cluster.entity_ids,
                document_ids: cluster.document_ids,
                metadata,
            });
        }

        for pattern in self.find_geographic_patterns(aggregator) {
            if pattern.people.len() < GEO_DISCOVERY_MIN_PEOPLE {
                continue;
            }
            let severity = if pattern.people.len() >= GEO_HIGH_PEOPLE {
                Severity::High
            } else {
                Severity::Medium
            };
            let mut entity_ids = vec![pattern.location_id.clone()];
            entity_ids.extend(pattern.people.iter().cloned());

            let mut metadata = BTreeMap::new();
            metadata.insert("location".to_string(), json!(pattern.location_name));
            metadata.insert("people_count".to_string(), json!(pattern.people.len()));
            metadata.insert("date_count".to_string(), json!(pattern.dates.len()));

            discoveries.push(Discovery {
                id: self.ids.next_id(),
                discovery_type: DiscoveryType::GeographicPattern,
                severity,
                title: format!(
                    "{} people associated with {}",
                    pattern.people.len(),
                    pattern.location_name
                ),
                description: format!(
                    "{} people appear in the {} documents mentioning {}",
                    pattern.people.len(),
                    pattern.document_count,
                    pattern.location_name
                ),
                entity_ids,
                document_ids: pattern.document_ids,
                metadata,
            });
        }

        discoveries.extend(self.find_co_occurrence_anomalies(aggregator, graph));

        discoveries.sort_by_key(|d| d.severity.rank());

        info!(count = discoveries.len(), "discovery pass complete");
        discoveries
    }
}

fn display_name_or_id(aggregator: &CorpusAggregator, id: &str) -> String {
    aggregator
        .by_id(id)
        .map(|e| e.display_name)
        .unwrap_or_else(|| id.to_string())
}

/// Weighted-degree lookup for a single entity, used by the profile view
pub fn weighted_degree(graph: &CoOccurrenceGraph, id: &str) -> usize {
    graph.for_entity(id).iter().map(|c| c.strength).sum()
}
