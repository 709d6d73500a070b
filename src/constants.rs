//! Documented constants for the extraction-and-graph pipeline
//!
//! All tunable parameters in one place with justification for their values.
//! Centralizing constants prevents magic numbers and makes tuning easier.

// =============================================================================
// EXTRACTION CONFIDENCE SCORES
// Heuristic [0,1] weights indicating extraction reliability, not statistical
// probabilities. Higher = stronger evidence class.
// =============================================================================

/// Confidence for exact gazetteer matches
///
/// A curated-list hit is the strongest evidence we have short of human
/// review. Not 1.0 because OCR noise can still produce coincidental
/// substrings of short names.
pub const GAZETTEER_CONFIDENCE: f32 = 0.95;

/// Confidence for known-airport-code matches
///
/// Three-letter codes are matched with word boundaries against a closed set,
/// but codes like "SAF" collide with ordinary acronyms occasionally.
pub const AIRPORT_CODE_CONFIDENCE: f32 = 0.9;

/// Confidence for `City, ST` pattern matches
pub const CITY_STATE_CONFIDENCE: f32 = 0.8;

/// Confidence for normalized date matches
///
/// The regex families are unambiguous once an invalid calendar date is
/// rejected, but the month-first reading of NN/NN/YYYY remains an
/// assumption.
pub const DATE_CONFIDENCE: f32 = 0.85;

/// Confidence for regex-family person matches (honorific or capitalized pair)
///
/// Capitalization heuristics over legal text produce a meaningful
/// false-positive rate even after the stoplist, hence the markdown from
/// gazetteer confidence.
pub const PATTERN_CONFIDENCE: f32 = 0.7;

// =============================================================================
// PER-DOCUMENT EXTRACTION CAPS
// Bound pathological documents (OCR dumps, concatenated exhibits) so one
// input cannot blow up downstream aggregation. First-encountered order is
// preserved for determinism.
// =============================================================================

/// Maximum person entities extracted from a single document
pub const MAX_PEOPLE_PER_DOCUMENT: usize = 100;

/// Maximum location entities extracted from a single document
pub const MAX_LOCATIONS_PER_DOCUMENT: usize = 50;

/// Maximum date entities extracted from a single document
pub const MAX_DATES_PER_DOCUMENT: usize = 100;

/// Maximum flight entities extracted from a single document
pub const MAX_FLIGHTS_PER_DOCUMENT: usize = 50;

/// Context window size in characters, centered on a match
///
/// 100 chars is enough to show the surrounding sentence fragment in result
/// views without storing whole pages per entity.
pub const CONTEXT_WINDOW_CHARS: usize = 100;

/// Window in characters around a flight match searched for an associated date
pub const FLIGHT_DATE_WINDOW_CHARS: usize = 100;

// =============================================================================
// EXTERNAL ANALYSIS DELEGATION GATE
// The sole control point for invoking the (costly, out-of-scope) enrichment
// collaborator. These thresholds determine the local/remote cost trade-off
// for the whole pipeline and are reproduced exactly.
// =============================================================================

/// Text length above which a sparse document qualifies for delegation
pub const DELEGATION_MIN_TEXT_LEN: usize = 5000;

/// Local entity count below which a long document qualifies for delegation
pub const DELEGATION_SPARSE_ENTITY_COUNT: usize = 3;

/// Local entity count above which delegation is always skipped
pub const DELEGATION_RICH_ENTITY_COUNT: usize = 10;

/// Text length below which delegation is always skipped
pub const DELEGATION_SHORT_TEXT_LEN: usize = 500;

// =============================================================================
// GRAPH CONSTRUCTION
// =============================================================================

/// Per-document person-list cap before pairwise edge generation
///
/// Pairing is O(n²): 20 people → at most 190 edges per document. Entity-dense
/// documents (flight manifests, address books) silently undercount
/// co-occurrence beyond this cap, an explicit scalability trade-off.
pub const MAX_PAIRED_PEOPLE_PER_DOCUMENT: usize = 20;

// =============================================================================
// DISCOVERY THRESHOLDS
// =============================================================================

/// Minimum cluster size for a network-cluster discovery
pub const CLUSTER_DISCOVERY_MIN_SIZE: usize = 5;

/// Cluster size at which severity escalates to critical
pub const CLUSTER_CRITICAL_SIZE: usize = 10;

/// Minimum associated people for a location to be a geographic pattern
pub const GEO_MIN_PEOPLE: usize = 3;

/// Minimum associated people for a geographic-pattern discovery
pub const GEO_DISCOVERY_MIN_PEOPLE: usize = 5;

/// People count at which a geographic discovery escalates to high severity
pub const GEO_HIGH_PEOPLE: usize = 10;

/// Number of strongest edges scanned for co-occurrence anomalies
pub const ANOMALY_TOP_EDGES: usize = 20;

/// Minimum edge strength to be flagged as an anomaly
pub const ANOMALY_MIN_STRENGTH: usize = 5;

/// Edge strength at which an anomaly escalates to high severity
pub const ANOMALY_HIGH_STRENGTH: usize = 10;

// =============================================================================
// VALIDATION LIMITS
// =============================================================================

/// Minimum entity display-name length; shorter names are silently dropped
pub const MIN_ENTITY_NAME_LEN: usize = 2;

/// Maximum entity display-name length
pub const MAX_ENTITY_NAME_LEN: usize = 256;

/// Maximum document id length
pub const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Maximum document text size in bytes (5MB)
///
/// Larger inputs are almost always concatenation mistakes upstream; skipping
/// them protects the regex pass without aborting the batch.
pub const MAX_DOCUMENT_TEXT_LEN: usize = 5 * 1024 * 1024;

/// Maximum accepted query limit
pub const MAX_QUERY_LIMIT: usize = 10_000;

// =============================================================================
// METRICS CACHE
// =============================================================================

/// TTL for the cached corpus metrics snapshot, in seconds
///
/// Metrics are a full directory scan; 60s keeps dashboards fresh enough for
/// a batch tool while bounding recompute cost. Concurrent misses may each
/// recompute independently (no single-flight); acceptable for a batch tool,
/// an improvement point for a service deployment.
pub const METRICS_CACHE_TTL_SECS: u64 = 60;
