//! Import and export of field value documents
//!
//! The exported document is a JSON array of
//! `{ id, input, order, entityName, creatorName }` records where every value
//! that came from a deferred expression is written back as that expression.
//! Import is the reverse, validated against the active entity collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::FieldValueStore;
use crate::types::{id_string, Entity, FieldValueEntry, ORDER_SENTINEL};

/// Fixed download name of the exported document
pub const EXPORT_FILE_NAME: &str = "dynamic-data.json";

/// One record of the exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntry {
    pub id: String,
    pub input: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub creator_name: String,
}

impl From<&FieldValueEntry> for ExportedEntry {
    fn from(entry: &FieldValueEntry) -> Self {
        let input = entry
            .input
            .keys()
            .filter_map(|k| entry.export_value(k).map(|v| (k.clone(), v.to_string())))
            .collect();

        Self {
            id: entry.id.clone(),
            input,
            order: entry.order,
            entity_name: entry.entity_name.clone(),
            creator_name: entry.creator_name.clone(),
        }
    }
}

/// Build the export document in ascending `order`.
pub fn export(store: &FieldValueStore) -> Vec<ExportedEntry> {
    let mut entries: Vec<&FieldValueEntry> = store.entries().iter().collect();
    entries.sort_by_key(|e| e.sort_key());
    entries.into_iter().map(ExportedEntry::from).collect()
}

/// Export document as pretty-printed JSON text
pub fn export_json(store: &FieldValueStore) -> Result<String> {
    let document = export(store);
    info!("Exporting {} field value entries", document.len());
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse import text into its top-level array elements.
pub fn parse_document(text: &str) -> Result<Vec<Value>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::Parse(format!("invalid JSON: {}", e)))?;
    into_elements(value)
}

/// Accept an already parsed document.
pub fn into_elements(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(elements) => Ok(elements),
        _ => Err(Error::Parse("imported data must be an array".to_string())),
    }
}

/// Result of matching an import document against the entity collection
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    /// Surviving entries in ascending `order`
    pub entries: Vec<FieldValueEntry>,
    /// The entity collection re-sorted to follow the imported order
    pub reordered: Vec<Entity>,
    /// Elements without a truthy `id` or an object `input`
    pub skipped_malformed: usize,
    /// Elements that lost to a richer record with the same id
    pub merged_duplicates: usize,
    /// Entries referencing entities absent from the collection
    pub dropped_stale: usize,
}

struct Candidate<'a> {
    id: String,
    input: &'a serde_json::Map<String, Value>,
    order: Option<i64>,
}

/// Match import elements to known entities.
///
/// Pure: nothing is applied until the caller installs the plan.
pub fn plan_import(elements: &[Value], entities: &[Entity]) -> ImportPlan {
    let mut plan = ImportPlan::default();

    // Dedup by id, the record with more input keys wins; ties keep the first.
    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for element in elements {
        let Some(candidate) = candidate(element) else {
            plan.skipped_malformed += 1;
            continue;
        };

        match by_id.get(&candidate.id) {
            Some(&slot) => {
                plan.merged_duplicates += 1;
                if candidate.input.len() > candidates[slot].input.len() {
                    candidates[slot] = candidate;
                }
            }
            None => {
                by_id.insert(candidate.id.clone(), candidates.len());
                candidates.push(candidate);
            }
        }
    }

    let positions: HashMap<&str, usize> = entities
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.as_str(), i))
        .collect();

    for candidate in candidates {
        let Some(&index) = positions.get(candidate.id.as_str()) else {
            debug!("Dropping import entry for unknown entity {}", candidate.id);
            plan.dropped_stale += 1;
            continue;
        };

        let entity = &entities[index];
        let mut entry = FieldValueEntry::for_entity(entity, index as i64);
        entry.order = Some(candidate.order.unwrap_or(index as i64));
        entry.input = candidate
            .input
            .iter()
            .map(|(k, v)| (k.clone(), value_text(v)))
            .collect();
        plan.entries.push(entry);
    }

    plan.entries.sort_by_key(|e| e.sort_key());

    let orders: HashMap<&str, i64> = plan
        .entries
        .iter()
        .map(|e| (e.id.as_str(), e.sort_key()))
        .collect();
    let mut reordered = entities.to_vec();
    reordered.sort_by_key(|e| orders.get(e.id.as_str()).copied().unwrap_or(ORDER_SENTINEL));
    plan.reordered = reordered;

    info!(
        "Import plan: {} entries, {} stale, {} malformed, {} duplicates",
        plan.entries.len(),
        plan.dropped_stale,
        plan.skipped_malformed,
        plan.merged_duplicates
    );

    plan
}

fn candidate(element: &Value) -> Option<Candidate<'_>> {
    let obj = element.as_object()?;
    let id = obj.get("id").and_then(id_string)?;
    let input = obj.get("input")?.as_object()?;
    let order = obj.get("order").and_then(|o| match o {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    });

    Some(Candidate { id, input, order })
}

/// Imported values are strings; other JSON scalars keep their text form.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entities(ids: &[&str]) -> Vec<Entity> {
        ids.iter()
            .map(|id| Entity::new(*id, json!("<name>")).with_name(format!("case {}", id)))
            .collect()
    }

    fn reordered_ids(plan: &ImportPlan) -> Vec<&str> {
        plan.reordered.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_export_rehydrates_expressions_and_sorts() {
        let ents = entities(&["T1", "T2"]);
        let mut store = FieldValueStore::new();
        store.upsert(&ents[1], 1, "name", "Bob", None);
        store.upsert(&ents[0], 0, "name", "Ada", Some("faker.person.firstName()"));

        let doc = export(&store);
        assert_eq!(doc[0].id, "T1");
        assert_eq!(doc[0].input["name"], "faker.person.firstName()");
        assert_eq!(doc[0].entity_name, "case T1");
        assert_eq!(doc[1].input["name"], "Bob");
    }

    #[test]
    fn test_export_puts_undefined_order_last() {
        let mut a = FieldValueEntry::default();
        a.id = "A".into();
        let mut b = FieldValueEntry::default();
        b.id = "B".into();
        b.order = Some(5);
        let store = FieldValueStore::from_entries(vec![a, b], 0);

        let ids: Vec<_> = export(&store).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_export_json_is_two_space_pretty() {
        let ents = entities(&["T1"]);
        let mut store = FieldValueStore::new();
        store.upsert(&ents[0], 0, "name", "Ada", None);
        let text = export_json(&store).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"T1\""));
    }

    #[test]
    fn test_parse_document_errors() {
        assert!(parse_document("{not valid json").unwrap_err().is_parse());
        let err = parse_document(r#"{"id": "T1"}"#).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
        assert_eq!(parse_document("[]").unwrap().len(), 0);
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let doc = json!([
            {"id": "", "input": {"a": "1"}},
            {"id": "T1", "input": "nope"},
            {"input": {"a": "1"}},
            42,
            {"id": "T1", "input": {"name": "Ada"}}
        ]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["T1"]));
        assert_eq!(plan.skipped_malformed, 4);
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].input["name"], "Ada");
    }

    #[test]
    fn test_richer_duplicate_wins_and_ties_keep_first() {
        let doc = json!([
            {"id": "T1", "input": {"a": "first"}},
            {"id": "T1", "input": {"a": "second", "b": "2"}},
            {"id": "T2", "input": {"a": "kept"}},
            {"id": "T2", "input": {"a": "tie"}}
        ]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["T1", "T2"]));
        assert_eq!(plan.merged_duplicates, 2);
        assert_eq!(plan.entries[0].input["a"], "second");
        assert_eq!(plan.entries[1].input["a"], "kept");
    }

    #[test]
    fn test_stale_references_are_dropped() {
        let doc = json!([{"id": "ghost", "input": {"x": "1"}}]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["T1"]));
        assert!(plan.entries.is_empty());
        assert_eq!(plan.dropped_stale, 1);
        assert_eq!(reordered_ids(&plan), vec!["T1"]);
    }

    #[test]
    fn test_order_defaults_to_entity_position() {
        let doc = json!([
            {"id": "T3", "input": {}},
            {"id": "T1", "input": {}, "order": "first"}
        ]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["T1", "T2", "T3"]));
        let orders: Vec<_> = plan.entries.iter().map(|e| (e.id.as_str(), e.order)).collect();
        assert_eq!(orders, vec![("T1", Some(0)), ("T3", Some(2))]);
    }

    #[test]
    fn test_imported_order_reorders_entities() {
        let doc = json!([
            {"id": "T3", "input": {"name": "c"}, "order": 0},
            {"id": "T1", "input": {"name": "a"}, "order": 1}
        ]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["T1", "T2", "T3", "T4"]));
        assert_eq!(reordered_ids(&plan), vec!["T3", "T1", "T2", "T4"]);
        assert_eq!(plan.entries[0].id, "T3");
    }

    #[test]
    fn test_float_typed_ids_match_integer_entities() {
        let doc = json!([{"id": 3.0, "input": {"name": "c"}}]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["1", "3"]));
        assert_eq!(plan.dropped_stale, 0);
        assert_eq!(plan.entries[0].id, "3");
        assert_eq!(plan.entries[0].order, Some(1));
    }

    #[test]
    fn test_non_string_input_values_keep_text_form() {
        let doc = json!([{"id": 7, "input": {"n": 3, "b": true, "o": {"k": 1}, "z": null}}]);
        let plan = plan_import(doc.as_array().unwrap(), &entities(&["7"]));
        let input = &plan.entries[0].input;
        assert_eq!(input["n"], "3");
        assert_eq!(input["b"], "true");
        assert_eq!(input["o"], r#"{"k":1}"#);
        assert_eq!(input["z"], "");
    }
}
