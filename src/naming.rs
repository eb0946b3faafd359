//! Logical identifier generation.
//!
//! Resource graphs address every declaration by a capitalized,
//! alphanumeric-only logical id derived from a human-readable display
//! name. Display names may contain spaces, hyphens, dots, or slashes;
//! the derived id must match `^[A-Z][A-Za-z0-9]*$`.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Derive a logical identifier from a display name.
///
/// Strips every character outside `[A-Za-z0-9]`, then uppercases the
/// first remaining character. Pure and idempotent. Returns an empty
/// string when the input has no alphanumeric characters; callers treat
/// that as a configuration error.
#[must_use]
pub fn generate_id(name: &str) -> String {
    let mut id: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    if !id.is_empty() {
        let first = id.remove(0).to_ascii_uppercase();
        id.insert(0, first);
    }
    id
}

/// Tracks generated identifiers across one topology so that similar
/// display names cannot silently shadow each other's resources.
///
/// Registering the same display name twice is idempotent and returns the
/// same id. Registering a different name that collapses to an existing id
/// fails with [`Error::DuplicateIdentifier`].
#[derive(Debug, Default)]
pub struct IdRegistry {
    sources: HashMap<String, String>,
}

impl IdRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` and return its logical id.
    pub fn register(&mut self, name: &str) -> Result<String> {
        let id = generate_id(name);
        if id.is_empty() {
            return Err(Error::Config(format!(
                "display name '{name}' contains no alphanumeric characters"
            )));
        }
        if let Some(existing) = self.sources.get(&id) {
            if existing == name {
                return Ok(id);
            }
            return Err(Error::DuplicateIdentifier {
                id,
                existing: existing.clone(),
                conflicting: name.to_string(),
            });
        }
        self.sources.insert(id.clone(), name.to_string());
        Ok(id)
    }
}
