//! Name normalization and canonical entity keys
//!
//! An entity's id is a pure function of `(type, normalized name)`. Keys are
//! type-namespaced so that a location and a person sharing a literal string
//! ("Paris") never collide in the directory.

use serde::{Deserialize, Serialize};

/// Entity categories recognized by the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Location,
    Organization,
    Date,
    Flight,
}

impl EntityType {
    /// Get string representation of the entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Location => "location",
            Self::Organization => "organization",
            Self::Date => "date",
            Self::Flight => "flight",
        }
    }

    /// Key namespace prefix. Person keys are unprefixed (the dominant
    /// category, and the legacy key format downstream consumers expect);
    /// every other type gets a tag to prevent cross-type collisions.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Person => "",
            Self::Location => "loc_",
            Self::Organization => "org_",
            Self::Date => "date_",
            Self::Flight => "flight_",
        }
    }
}

/// Canonicalize a raw name into the lookup form: lowercase, characters
/// outside `[a-z0-9 ]` stripped, whitespace collapsed.
///
/// Stable and total: identical inputs always produce identical output.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true; // trims leading whitespace

    for c in raw.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if c.is_whitespace() && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
        // Everything else (punctuation, non-ascii) is stripped outright.
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Compute the canonical, type-namespaced entity id
pub fn entity_id(raw: &str, entity_type: EntityType) -> String {
    format!("{}{}", entity_type.key_prefix(), normalize_name(raw))
}
