//! Weave field values back into entity payloads

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::extract::{is_field_name, ANGLE_PATTERN, DOLLAR_PATTERN, DOUBLE_BRACE_PATTERN};

// Single pass over all three conventions so a substituted value is never
// scanned again.
static ANY_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        "{}|{}|{}",
        DOUBLE_BRACE_PATTERN, DOLLAR_PATTERN, ANGLE_PATTERN
    ))
    .ok()
});

/// Replace every known token in `text` with its value.
pub fn substitute_text(text: &str, input: &BTreeMap<String, String>) -> String {
    let Some(pattern) = ANY_TOKEN.as_ref() else {
        return text.to_string();
    };

    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let name = (1..=3)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            match input.get(name) {
                Some(value) if is_field_name(name) => value.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Copy of `payload` with tokens replaced in keys and string values at any
/// depth. Tokens without a value are left intact.
pub fn substitute(payload: &Value, input: &BTreeMap<String, String>) -> Value {
    match payload {
        Value::String(s) => Value::String(substitute_text(s, input)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, input)).collect()),
        Value::Object(obj) => {
            let mut out = Map::new();
            for (key, value) in obj {
                out.insert(substitute_text(key, input), substitute(value, input));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_all_conventions() {
        let values = input(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(substitute_text("<a> ${b} {{ c }}", &values), "1 2 3");
    }

    #[test]
    fn test_unknown_and_filtered_tokens_are_kept() {
        let values = input(&[("varX", "nope")]);
        assert_eq!(substitute_text("<varX> <missing>", &values), "<varX> <missing>");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let values = input(&[("a", "<b>"), ("b", "oops")]);
        assert_eq!(substitute_text("<a>", &values), "<b>");
    }

    #[test]
    fn test_substitutes_keys_and_nested_values() {
        let values = input(&[("field", "email"), ("user", "ada@example.com")]);
        let payload = json!({
            "steps": [{"<field>": "${user}", "retries": 3, "ok": true}],
            "title": "Login as {{user}}"
        });
        assert_eq!(
            substitute(&payload, &values),
            json!({
                "steps": [{"email": "ada@example.com", "retries": 3, "ok": true}],
                "title": "Login as ada@example.com"
            })
        );
    }
}
