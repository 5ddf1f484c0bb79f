//! Source-to-target ID mapping, the table that preserves referential
//! relationships across companies.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::transfer::EntityType;

/// In-memory mapping keyed by entity type and source ID, scoped to one
/// run. Each entity type owns its own table; a journal line resolving an
/// account goes through the Account table, never another type's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap {
    tables: BTreeMap<EntityType, BTreeMap<String, String>>,
}

impl IdMap {
    #[must_use]
    pub fn new() -> Self {
        IdMap::default()
    }

    /// Inserts or overwrites the mapping for `(entity_type, source_id)`.
    pub fn put(
        &mut self,
        entity_type: EntityType,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) {
        self.tables
            .entry(entity_type)
            .or_default()
            .insert(source_id.into(), target_id.into());
    }

    #[must_use]
    pub fn get(&self, entity_type: EntityType, source_id: &str) -> Option<&str> {
        self.tables
            .get(&entity_type)?
            .get(source_id)
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, entity_type: EntityType, source_id: &str) -> bool {
        self.get(entity_type, source_id).is_some()
    }

    /// Number of mappings recorded for one entity type.
    #[must_use]
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.tables.get(&entity_type).map_or(0, BTreeMap::len)
    }

    /// Writes the mapping as JSON for manual inspection or retries.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
