//! Core types for the dynamic fields engine

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Sentinel order for entries or entities without a defined position.
pub const ORDER_SENTINEL: i64 = i64::MAX;

/// A test-case-like object owned by the host application.
///
/// The payload is opaque: placeholder tokens may appear anywhere inside it,
/// in keys or in string values, at any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default, alias = "testCaseName")]
    pub name: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub payload: Value,
}

impl Entity {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            creator_name: String::new(),
            payload,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_creator(mut self, creator_name: impl Into<String>) -> Self {
        self.creator_name = creator_name.into();
        self
    }

    /// Build an entity from a loosely shaped host record.
    ///
    /// The record must carry a string or numeric `id`. When it has no
    /// `payload` member the whole record is scanned as the payload.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id").and_then(id_string)?;

        let name = obj
            .get("name")
            .or_else(|| obj.get("testCaseName"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let creator_name = obj
            .get("creatorName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let payload = obj.get("payload").cloned().unwrap_or_else(|| value.clone());

        Some(Self {
            id,
            name,
            creator_name,
            payload,
        })
    }
}

/// Convert a JSON identifier into its string form.
///
/// Only truthy strings and numbers qualify. Integral floats print without
/// a fraction, so `1.0` and `1` name the same entity.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
                Some((f as i64).to_string())
            }
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}

/// Largest float that still holds every smaller integer exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Values recorded for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValueEntry {
    pub id: String,

    /// Field name to current display and substitution value
    #[serde(default)]
    pub input: BTreeMap<String, String>,

    /// Field name to the expression text that produced the value in `input`.
    /// Absent keys are plain literal values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub original_expressions: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default)]
    pub entity_name: String,

    #[serde(default)]
    pub creator_name: String,
}

impl FieldValueEntry {
    pub fn for_entity(entity: &Entity, order: i64) -> Self {
        Self {
            id: entity.id.clone(),
            input: BTreeMap::new(),
            original_expressions: BTreeMap::new(),
            order: Some(order),
            entity_name: entity.name.clone(),
            creator_name: entity.creator_name.clone(),
        }
    }

    /// Sort key used by export and import
    pub fn sort_key(&self) -> i64 {
        self.order.unwrap_or(ORDER_SENTINEL)
    }

    /// Value as it should appear in an exported document
    pub fn export_value(&self, field: &str) -> Option<&str> {
        self.original_expressions
            .get(field)
            .or_else(|| self.input.get(field))
            .map(String::as_str)
    }
}
