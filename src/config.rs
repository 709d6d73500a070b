//! Configuration management for the docgraph pipeline
//!
//! All configurable parameters in one place with environment variable
//! overrides. Follows the principle: sensible defaults, configurable in
//! production.

use std::env;
use tracing::info;

use crate::constants::{
    ANOMALY_TOP_EDGES, MAX_DATES_PER_DOCUMENT, MAX_FLIGHTS_PER_DOCUMENT,
    MAX_LOCATIONS_PER_DOCUMENT, MAX_PAIRED_PEOPLE_PER_DOCUMENT, MAX_PEOPLE_PER_DOCUMENT,
    METRICS_CACHE_TTL_SECS,
};

/// Pipeline configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-document extraction cap for people (default: 100)
    pub max_people_per_document: usize,

    /// Per-document extraction cap for locations (default: 50)
    pub max_locations_per_document: usize,

    /// Per-document extraction cap for dates (default: 100)
    pub max_dates_per_document: usize,

    /// Per-document extraction cap for flights (default: 50)
    pub max_flights_per_document: usize,

    /// Person-list cap before pairwise edge generation (default: 20)
    ///
    /// Caps the O(n²) pair blow-up on entity-dense documents. Raising this
    /// recovers undercounted connections at quadratic cost per document.
    pub max_paired_people: usize,

    /// TTL for the cached metrics snapshot in seconds (default: 60)
    pub metrics_ttl_secs: u64,

    /// Number of strongest edges scanned for anomalies (default: 20)
    pub anomaly_top_edges: usize,

    /// Worker thread hint for the extraction phase (default: 0 = rayon decides)
    pub worker_threads: usize,

    /// Whether running in production mode
    pub is_production: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_people_per_document: MAX_PEOPLE_PER_DOCUMENT,
            max_locations_per_document: MAX_LOCATIONS_PER_DOCUMENT,
            max_dates_per_document: MAX_DATES_PER_DOCUMENT,
            max_flights_per_document: MAX_FLIGHTS_PER_DOCUMENT,
            max_paired_people: MAX_PAIRED_PEOPLE_PER_DOCUMENT,
            metrics_ttl_secs: METRICS_CACHE_TTL_SECS,
            anomaly_top_edges: ANOMALY_TOP_EDGES,
            worker_threads: 0,
            is_production: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults
    #[allow(clippy::field_reassign_with_default)] // Environment overrides require mutable config
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.is_production = env::var("DOCGRAPH_ENV")
            .map(|v| {
                let v = v.to_lowercase();
                v == "production" || v == "prod"
            })
            .unwrap_or(false);

        if let Ok(val) = env::var("DOCGRAPH_MAX_PEOPLE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_people_per_document = n.clamp(1, 1000);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_MAX_LOCATIONS") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_locations_per_document = n.clamp(1, 1000);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_MAX_DATES") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_dates_per_document = n.clamp(1, 1000);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_MAX_FLIGHTS") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_flights_per_document = n.clamp(1, 1000);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_MAX_PAIRED_PEOPLE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_paired_people = n.clamp(2, 100);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_METRICS_TTL") {
            if let Ok(n) = val.parse() {
                config.metrics_ttl_secs = n;
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_ANOMALY_TOP_EDGES") {
            if let Ok(n) = val.parse::<usize>() {
                config.anomaly_top_edges = n.clamp(1, 1000);
            }
        }

        if let Ok(val) = env::var("DOCGRAPH_WORKERS") {
            if let Ok(n) = val.parse() {
                config.worker_threads = n;
            }
        }

        config
    }

    /// Log the current configuration
    pub fn log(&self) {
        info!("Configuration:");
        info!(
            "   Mode: {}",
            if self.is_production {
                "PRODUCTION"
            } else {
                "Development"
            }
        );
        info!(
            "   Extraction caps: people={} locations={} dates={} flights={}",
            self.max_people_per_document,
            self.max_locations_per_document,
            self.max_dates_per_document,
            self.max_flights_per_document
        );
        info!("   Pairing cap: {} people/document", self.max_paired_people);
        info!("   Metrics TTL: {}s", self.metrics_ttl_secs);
        info!("   Anomaly scan: top {} edges", self.anomaly_top_edges);
        if self.worker_threads > 0 {
            info!("   Workers: {}", self.worker_threads);
        } else {
            info!("   Workers: auto");
        }
    }
}

/// Environment variable documentation
#[allow(unused)] // Public API - available for CLI help output
pub fn print_env_help() {
    println!("docgraph Configuration Environment Variables:");
    println!();
    println!("  DOCGRAPH_ENV               - Set to 'production' or 'prod' for production mode");
    println!("  DOCGRAPH_MAX_PEOPLE        - Per-document person cap (default: 100)");
    println!("  DOCGRAPH_MAX_LOCATIONS     - Per-document location cap (default: 50)");
    println!("  DOCGRAPH_MAX_DATES         - Per-document date cap (default: 100)");
    println!("  DOCGRAPH_MAX_FLIGHTS       - Per-document flight cap (default: 50)");
    println!("  DOCGRAPH_MAX_PAIRED_PEOPLE - Pairing cap before edge generation (default: 20)");
    println!("  DOCGRAPH_METRICS_TTL       - Metrics cache TTL in seconds (default: 60)");
    println!("  DOCGRAPH_ANOMALY_TOP_EDGES - Strongest edges scanned for anomalies (default: 20)");
    println!("  DOCGRAPH_WORKERS           - Extraction worker threads (default: auto)");
    println!();
    println!("  RUST_LOG                   - Log level (e.g., info, debug, trace)");
    println!();
}
