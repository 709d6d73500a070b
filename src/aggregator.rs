//! Corpus-wide entity directory
//!
//! Merges per-document extraction results into a single directory keyed by
//! canonical entity id. The aggregator exclusively owns this state; the
//! graph builder and discovery engine read it through snapshots.
//!
//! Two intentionally different metrics are tracked per entity:
//! - `occurrences` counts mention events across the whole corpus
//! - `document_ids.len()` counts distinct documents
//!
//! Document membership is idempotent: re-ingesting a document cannot add its
//! id twice. Occurrences, however, follow mention-count semantics and will
//! double on re-ingest. Callers that need strict idempotence should dedup
//! document ids upstream (recorded as a reconciliation point in DESIGN.md).

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::extraction::ExtractionResult;
use crate::normalize::{entity_id, EntityType};
use crate::validation::validate_entity_name;

/// Opaque document identifier supplied by the ingestion collaborator
pub type DocId = String;

/// A corpus-wide entity with aggregated counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical key: pure function of (type, normalized display name)
    pub id: String,

    /// Name as first encountered in the corpus
    pub display_name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Distinct documents mentioning this entity (sorted for determinism)
    pub document_ids: BTreeSet<DocId>,

    /// Total mention events across the corpus; always >= document_ids.len()
    pub occurrences: u64,

    /// Snippet from the first extraction that produced this entity
    pub context: Option<String>,
}

/// Per-document entity key lists, consumed by the graph builder and the
/// discovery engine. Replaced wholesale if a document is re-ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: DocId,
    pub dataset_tag: String,
    pub person_keys: Vec<String>,
    pub location_keys: Vec<String>,
    pub date_keys: Vec<String>,
    pub flight_keys: Vec<String>,
}

/// Corpus aggregator: the synchronization point of the pipeline.
///
/// Writes are serialized behind locks; accumulation is associative and
/// commutative with respect to final counts, so merge order does not affect
/// the outcome.
#[derive(Default)]
pub struct CorpusAggregator {
    entities: RwLock<HashMap<String, Entity>>,
    documents: RwLock<BTreeMap<DocId, DocumentRecord>>,
}

impl CorpusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one document's extraction output into the directory
    pub fn ingest(&self, doc_id: &str, dataset_tag: &str, extraction: &ExtractionResult) {
        let mut record = DocumentRecord {
            doc_id: doc_id.to_string(),
            dataset_tag: dataset_tag.to_string(),
            person_keys: Vec::new(),
            location_keys: Vec::new(),
            date_keys: Vec::new(),
            flight_keys: Vec::new(),
        };

        {
            let mut entities = self.entities.write();

            for person in &extraction.people {
                if let Some(key) = Self::upsert(
                    &mut entities,
                    doc_id,
                    &person.name,
                    EntityType::Person,
                    person.mentions as u64,
                    person.context.clone(),
                ) {
                    record.person_keys.push(key);
                }
            }

            for location in &extraction.locations {
                if let Some(key) = Self::upsert(
                    &mut entities,
                    doc_id,
                    &location.name,
                    EntityType::Location,
                    location.mentions as u64,
                    location.context.clone(),
                ) {
                    record.location_keys.push(key);
                }
            }

            for date in &extraction.dates {
                if let Some(key) = Self::upsert(
                    &mut entities,
                    doc_id,
                    &date.normalized,
                    EntityType::Date,
                    1,
                    None,
                ) {
                    record.date_keys.push(key);
                }
            }

            for flight in &extraction.flights {
                let display = format!("{} to {}", flight.origin, flight.destination);
                if let Some(key) = Self::upsert(
                    &mut entities,
                    doc_id,
                    &display,
                    EntityType::Flight,
                    1,
                    None,
                ) {
                    record.flight_keys.push(key);
                }
            }
        }

        // Key lists are deduped per document so pairwise edge generation
        // never sees the same entity twice in one list
        dedup_in_place(&mut record.person_keys);
        dedup_in_place(&mut record.location_keys);
        dedup_in_place(&mut record.date_keys);
        dedup_in_place(&mut record.flight_keys);

        self.documents
            .write()
            .insert(doc_id.to_string(), record);
    }

    /// Insert or update one entity; returns its canonical key, or None if the
    /// name fails minimum validation (silently dropped, per error policy)
    fn upsert(
        entities: &mut HashMap<String, Entity>,
        doc_id: &str,
        display_name: &str,
        entity_type: EntityType,
        mentions: u64,
        context: Option<String>,
    ) -> Option<String> {
        if let Err(e) = validate_entity_name(display_name) {
            debug!(name = %display_name, "dropping entity: {e}");
            return None;
        }

        let key = entity_id(display_name, entity_type);
        if key.len() <= entity_type.key_prefix().len() {
            // Name normalized away to nothing
            return None;
        }

        match entities.get_mut(&key) {
            Some(entity) => {
                entity.document_ids.insert(doc_id.to_string());
                entity.occurrences += mentions;
                if entity.context.is_none() {
                    entity.context = context;
                }
            }
            None => {
                let mut document_ids = BTreeSet::new();
                document_ids.insert(doc_id.to_string());
                entities.insert(
                    key.clone(),
                    Entity {
                        id: key.clone(),
                        display_name: display_name.to_string(),
                        entity_type,
                        document_ids,
                        occurrences: mentions,
                        context,
                    },
                );
            }
        }

        Some(key)
    }

    /// All entities, sorted by occurrences descending (id ascending tie-break)
    pub fn all(&self) -> Vec<Entity> {
        let mut out: Vec<Entity> = self.entities.read().values().cloned().collect();
        sort_by_occurrences(&mut out);
        out
    }

    /// Top entities by occurrences, optionally filtered by type
    pub fn top(&self, limit: usize, type_filter: Option<EntityType>) -> Vec<Entity> {
        let entities = self.entities.read();
        let mut out: Vec<Entity> = entities
            .values()
            .filter(|e| type_filter.map_or(true, |t| e.entity_type == t))
            .cloned()
            .collect();
        sort_by_occurrences(&mut out);
        out.truncate(limit);
        out
    }

    /// Case-insensitive substring search over display names
    pub fn search(&self, query: &str, limit: usize) -> Vec<Entity> {
        let needle = query.to_lowercase();
        let entities = self.entities.read();
        let mut out: Vec<Entity> = entities
            .values()
            .filter(|e| e.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_by_occurrences(&mut out);
        out.truncate(limit);
        out
    }

    /// Look up one entity by canonical id
    pub fn by_id(&self, id: &str) -> Option<Entity> {
        self.entities.read().get(id).cloned()
    }

    /// Snapshot of per-document records in document-id order
    pub fn document_records(&self) -> Vec<DocumentRecord> {
        self.documents.read().values().cloned().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }
}

fn sort_by_occurrences(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn dedup_in_place(keys: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    keys.retain(|k| seen.insert(k.clone()));
}
