//! Structured error types with machine-readable codes
//!
//! The pipeline is a single-pass, best-effort batch tool: per-document
//! failures are skipped and logged by the caller, never retried. These types
//! exist for input validation and for surfacing genuine internal faults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error payload for embedding callers (API layers, CLIs)
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

/// Pipeline error types with proper categorization
#[derive(Debug)]
pub enum PipelineError {
    // Validation errors
    InvalidInput { field: String, reason: String },
    InvalidDocument { id: String, reason: String },

    // Not found
    EntityNotFound(String),

    // Phase ordering: graph/discovery queries before aggregation completed
    GraphNotBuilt,

    // External enrichment collaborator failed (degrades to local extraction)
    EnrichmentFailed { document_id: String, reason: String },

    // Internal errors
    SerializationError(String),

    // Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl PipelineError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidDocument { .. } => "INVALID_DOCUMENT",
            Self::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            Self::GraphNotBuilt => "GRAPH_NOT_BUILT",
            Self::EnrichmentFailed { .. } => "ENRICHMENT_FAILED",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::InvalidDocument { id, reason } => {
                format!("Invalid document '{id}': {reason}")
            }
            Self::EntityNotFound(id) => format!("Entity not found: {id}"),
            Self::GraphNotBuilt => {
                "Connection graph not built: run build_graph() after ingest".to_string()
            }
            Self::EnrichmentFailed {
                document_id,
                reason,
            } => {
                format!("External enrichment failed for document '{document_id}': {reason}")
            }
            Self::SerializationError(msg) => format!("Serialization error: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to a structured payload
    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code().to_string(),
            message: self.message(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PipelineError {}

/// Convert from anyhow::Error to PipelineError
impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| PipelineError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;
