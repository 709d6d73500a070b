//! docgraph - entity-graph pipeline over a directory of text documents
//!
//! Reads every `.txt` file in the given directory (one document per file,
//! dataset tag = directory name), runs extraction, aggregation, graph build
//! and discovery, then prints a JSON report to stdout.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use docgraph::config::{print_env_help, PipelineConfig};
use docgraph::metrics::{register_metrics, SystemMetrics};
use docgraph::pipeline::{Document, EntityGraphPipeline};
use docgraph::tracing_setup::init_tracing;
use docgraph::{Connection, Discovery, Entity};

/// Top-level JSON report printed to stdout
#[derive(Serialize)]
struct Report {
    metrics: SystemMetrics,
    top_entities: Vec<Entity>,
    strongest_connections: Vec<Connection>,
    discoveries: Vec<Discovery>,
}

const REPORT_TOP_ENTITIES: usize = 25;
const REPORT_TOP_CONNECTIONS: usize = 25;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: docgraph <directory>");
        println!();
        println!("Ingests every .txt file in <directory> as one document and prints");
        println!("a JSON report (metrics, top entities, connections, discoveries).");
        println!();
        print_env_help();
        return Ok(());
    }

    if init_tracing().is_err() {
        eprintln!("warning: tracing initialization failed, continuing without logs");
    }
    register_metrics().context("failed to register metrics")?;

    let dir = args
        .get(1)
        .map(PathBuf::from)
        .context("usage: docgraph <directory>")?;

    let config = PipelineConfig::from_env();
    config.log();

    if config.worker_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build_global()
            .context("failed to configure worker pool")?;
    }

    let documents = load_documents(&dir)?;
    info!(count = documents.len(), dir = %dir.display(), "loaded documents");

    let pipeline = EntityGraphPipeline::new(config);
    pipeline.ingest_corpus(&documents);
    pipeline.build_graph();

    let report = Report {
        metrics: pipeline.system_metrics(),
        top_entities: pipeline.top_entities(REPORT_TOP_ENTITIES, None)?,
        strongest_connections: pipeline.strongest_connections(REPORT_TOP_CONNECTIONS)?,
        discoveries: pipeline.discoveries(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Read every .txt file in the directory as one document. The dataset tag
/// is the directory name; the document id is the file stem.
fn load_documents(dir: &PathBuf) -> Result<Vec<Document>> {
    let dataset_tag = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "corpus".to_string());

    let mut documents = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }

        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;

        documents.push(Document {
            id,
            text,
            dataset_tag: dataset_tag.clone(),
        });
    }

    // Directory iteration order is platform-dependent; sort for
    // reproducible runs
    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}
