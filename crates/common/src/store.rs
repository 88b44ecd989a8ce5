//! Field value store
//!
//! Holds at most one [`FieldValueEntry`] per entity. Every state mutation
//! bumps a monotonic version; a write that would not change anything leaves
//! both the entries and the version untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::mode::EditMode;
use crate::types::{Entity, FieldValueEntry};

/// Persistable view of the working state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub mode: EditMode,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub entries: Vec<FieldValueEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldValueStore {
    entries: Vec<FieldValueEntry>,
    version: u64,
}

impl FieldValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore entries at a known version.
    ///
    /// Duplicate ids keep the first entry; expressions without a cached
    /// value are dropped.
    pub fn from_entries(entries: Vec<FieldValueEntry>, version: u64) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .map(|mut e| {
                let input = &e.input;
                e.original_expressions.retain(|k, _| input.contains_key(k));
                e
            })
            .collect();
        Self { entries, version }
    }

    pub fn entries(&self) -> &[FieldValueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, entity_id: &str) -> Option<&FieldValueEntry> {
        self.entries.iter().find(|e| e.id == entity_id)
    }

    /// Current value of a field, or `""` when none was recorded.
    pub fn get_value(&self, entity_id: &str, field: &str) -> &str {
        self.get(entity_id)
            .and_then(|e| e.input.get(field))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn original_expression(&self, entity_id: &str, field: &str) -> Option<&str> {
        self.get(entity_id)
            .and_then(|e| e.original_expressions.get(field))
            .map(String::as_str)
    }

    /// Write one field of one entity. Returns whether anything changed.
    pub fn upsert(
        &mut self,
        entity: &Entity,
        order: i64,
        field: &str,
        value: &str,
        original_expression: Option<&str>,
    ) -> bool {
        let index = match self.entries.iter().position(|e| e.id == entity.id) {
            Some(index) => {
                let entry = &self.entries[index];
                let unchanged = entry.input.get(field).map(String::as_str) == Some(value)
                    && entry.original_expressions.get(field).map(String::as_str)
                        == original_expression
                    && entry.order == Some(order);
                if unchanged {
                    debug!("No change for {}.{}", entity.id, field);
                    return false;
                }
                index
            }
            None => {
                self.entries.push(FieldValueEntry::for_entity(entity, order));
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        entry.input.insert(field.to_string(), value.to_string());
        match original_expression {
            Some(expr) => {
                entry
                    .original_expressions
                    .insert(field.to_string(), expr.to_string());
            }
            None => {
                entry.original_expressions.remove(field);
            }
        }
        entry.order = Some(order);
        entry.entity_name = entity.name.clone();
        entry.creator_name = entity.creator_name.clone();

        self.version += 1;
        debug!("Stored {}.{} (version {})", entity.id, field, self.version);
        true
    }

    /// Replace every entry at once, as an import does.
    pub fn replace_all(&mut self, entries: Vec<FieldValueEntry>) {
        let version = self.version + 1;
        *self = Self::from_entries(entries, version);
    }

    /// Remove every entry. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.clear();
        self.version += 1;
        true
    }

    /// Drop entries whose entity is no longer in the collection.
    pub fn retain_entities(&mut self, entities: &[Entity]) -> usize {
        let known: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        let before = self.entries.len();
        self.entries.retain(|e| known.contains(e.id.as_str()));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    pub fn snapshot(&self, mode: EditMode) -> StoreSnapshot {
        StoreSnapshot {
            mode,
            version: self.version,
            entries: self.entries.clone(),
        }
    }
}
