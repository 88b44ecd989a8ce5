//! Placeholder token extraction
//!
//! Scans the serialized JSON text of a value for three token conventions:
//! `<name>`, `${name}` and `{{name}}`. Keys and values are scanned alike
//! because the scan runs over the full serialized text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

use crate::types::Entity;

pub(crate) const ANGLE_PATTERN: &str = r#"<([^<>"]+)>"#;
pub(crate) const DOLLAR_PATTERN: &str = r#"\$\{([^{}"]+)\}"#;
pub(crate) const DOUBLE_BRACE_PATTERN: &str = r#"\{\{([^{}"]+)\}\}"#;

static TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [ANGLE_PATTERN, DOLLAR_PATTERN, DOUBLE_BRACE_PATTERN]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Whether a trimmed candidate qualifies as a dynamic field name.
pub fn is_field_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with("var")
        && !name.starts_with('$')
        && !name.contains("function")
}

/// Extract the distinct field names referenced anywhere in `value`.
///
/// A value that cannot be serialized contributes no fields.
pub fn extract_fields<T: Serialize + ?Sized>(value: &T) -> BTreeSet<String> {
    match serde_json::to_string(value) {
        Ok(text) => extract_from_text(&text),
        Err(e) => {
            warn!("Skipping field extraction, value failed to serialize: {}", e);
            BTreeSet::new()
        }
    }
}

/// Extract field names from already serialized text.
pub fn extract_from_text(text: &str) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();

    for pattern in TOKEN_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let name = caps[1].trim();
            if is_field_name(name) {
                fields.insert(name.to_string());
            }
        }
    }

    fields
}

/// Fields of a single entity's payload
pub fn entity_fields(entity: &Entity) -> BTreeSet<String> {
    extract_fields(&entity.payload)
}

/// Fields shared by every value in the collection.
///
/// The first value's set seeds the intersection; an empty collection has no
/// common fields.
pub fn common_fields<T: Serialize>(values: &[T]) -> BTreeSet<String> {
    let mut sets = values.iter().map(|v| extract_fields(v));

    let Some(seed) = sets.next() else {
        return BTreeSet::new();
    };

    sets.fold(seed, |acc, set| acc.intersection(&set).cloned().collect())
}

/// Fields shared by every entity payload
pub fn common_entity_fields(entities: &[Entity]) -> BTreeSet<String> {
    let payloads: Vec<_> = entities.iter().map(|e| &e.payload).collect();
    common_fields(&payloads)
}

/// Per-entity field sets in collection order
pub fn fields_by_entity(entities: &[Entity]) -> Vec<(String, BTreeSet<String>)> {
    entities
        .iter()
        .map(|e| (e.id.clone(), entity_fields(e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use test_case::test_case;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_all_three_conventions() {
        let value = json!({"a": "<a>", "b": "${b}", "c": ["{{c}}"]});
        assert_eq!(extract_fields(&value), set(&["a", "b", "c"]));
    }

    #[test_case("<varName>" ; "var prefix")]
    #[test_case("${$index}" ; "dollar prefix")]
    #[test_case("{{myfunctionCall}}" ; "contains function")]
    #[test_case("<   >" ; "blank after trim")]
    fn test_filtered_candidates(token: &str) {
        let value = json!({ "step": token });
        assert!(extract_fields(&value).is_empty());
    }

    #[test]
    fn test_names_are_trimmed_and_deduplicated() {
        let value = json!(["< user >", "${user}", "{{ user}}", "<user>"]);
        assert_eq!(extract_fields(&value), set(&["user"]));
    }

    #[test]
    fn test_tokens_in_keys_are_found() {
        let value = json!({"<header>": {"nested": {"${token}": 1}}});
        assert_eq!(extract_fields(&value), set(&["header", "token"]));
    }

    #[test]
    fn test_serialization_failure_yields_empty_set() {
        let mut bad: HashMap<(i32, i32), &str> = HashMap::new();
        bad.insert((1, 2), "<a>");
        assert!(extract_fields(&bad).is_empty());
    }

    #[test]
    fn test_common_fields_intersection() {
        let values = vec![json!("<a> <b>"), json!("<b> <c>")];
        assert_eq!(common_fields(&values), set(&["b"]));
    }

    #[test]
    fn test_common_fields_of_empty_collection() {
        let values: Vec<serde_json::Value> = Vec::new();
        assert!(common_fields(&values).is_empty());
    }

    #[test]
    fn test_fields_by_entity_preserves_collection_order() {
        let entities = vec![
            Entity::new("T2", json!("<x>")),
            Entity::new("T1", json!("<y> <x>")),
        ];
        let by_entity = fields_by_entity(&entities);
        assert_eq!(by_entity[0], ("T2".to_string(), set(&["x"])));
        assert_eq!(by_entity[1], ("T1".to_string(), set(&["x", "y"])));
        assert_eq!(common_entity_fields(&entities), set(&["x"]));
    }
}
