//! Input validation for the batch pipeline
//!
//! Document-level failures are skip-and-log (partial-corpus tolerance);
//! entity-level failures are silently dropped during aggregation. Nothing
//! here is retried.

use anyhow::{anyhow, Result};

use crate::constants::{
    MAX_DOCUMENT_ID_LEN, MAX_DOCUMENT_TEXT_LEN, MAX_ENTITY_NAME_LEN, MAX_QUERY_LIMIT,
    MIN_ENTITY_NAME_LEN,
};

/// Validate a document id
pub fn validate_document_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(anyhow!("document id cannot be empty"));
    }

    if id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(anyhow!(
            "document id too long: {} chars (max: {})",
            id.len(),
            MAX_DOCUMENT_ID_LEN
        ));
    }

    if id.chars().any(|c| c.is_control()) {
        return Err(anyhow!("document id contains control characters"));
    }

    Ok(())
}

/// Validate document text before extraction
pub fn validate_document_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("document text is empty"));
    }

    if text.len() > MAX_DOCUMENT_TEXT_LEN {
        return Err(anyhow!(
            "document text too large: {} bytes (max: {})",
            text.len(),
            MAX_DOCUMENT_TEXT_LEN
        ));
    }

    Ok(())
}

/// Validate an entity display name before it enters the directory
///
/// Failing names are dropped, not reported: category regexes over OCR text
/// routinely produce one-character fragments.
pub fn validate_entity_name(name: &str) -> Result<()> {
    let trimmed = name.trim();

    if trimmed.len() < MIN_ENTITY_NAME_LEN {
        return Err(anyhow!(
            "entity name too short: {} chars (min: {})",
            trimmed.len(),
            MIN_ENTITY_NAME_LEN
        ));
    }

    if trimmed.len() > MAX_ENTITY_NAME_LEN {
        return Err(anyhow!(
            "entity name too long: {} chars (max: {})",
            trimmed.len(),
            MAX_ENTITY_NAME_LEN
        ));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(anyhow!("entity name contains control characters"));
    }

    Ok(())
}

/// Validate a query result limit
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(anyhow!("limit must be greater than 0"));
    }

    if limit > MAX_QUERY_LIMIT {
        return Err(anyhow!("limit too large: {limit} (max: {MAX_QUERY_LIMIT})"));
    }

    Ok(())
}
