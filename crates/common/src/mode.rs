//! Substitution mode controller
//!
//! Decides which entities a single edit lands on. In global mode an edit fans
//! out to every entity that declares the field; in individual mode it lands
//! on one entity only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::extract::{common_entity_fields, entity_fields};
use crate::types::Entity;

/// Edit mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Global,
    Individual,
}

impl EditMode {
    pub fn toggled(self) -> Self {
        match self {
            EditMode::Global => EditMode::Individual,
            EditMode::Individual => EditMode::Global,
        }
    }
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditMode::Global => write!(f, "global"),
            EditMode::Individual => write!(f, "individual"),
        }
    }
}

/// An entity selected to receive a write, with its current display index
#[derive(Debug, Clone, Copy)]
pub struct WriteTarget<'a> {
    pub entity: &'a Entity,
    pub order: i64,
}

/// Two-state mode machine plus write planning
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: EditMode,
}

impl ModeController {
    pub fn new(mode: EditMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    pub fn toggle(&mut self) -> EditMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Imported documents carry per-entity values
    pub fn on_import(&mut self) {
        self.mode = EditMode::Individual;
    }

    pub fn on_clear(&mut self) {
        self.mode = EditMode::Global;
    }

    /// Resolve the entities a write of `field` lands on.
    ///
    /// Global mode fans out to every entity whose own payload declares
    /// `field`. A global write naming a known entity for a field outside the
    /// common set came from a per-entity editor and lands on that entity
    /// alone, as does every individual write.
    pub fn plan_write<'a>(
        &self,
        entities: &'a [Entity],
        entity_id: &str,
        field: &str,
    ) -> Result<Vec<WriteTarget<'a>>> {
        let named = entities
            .iter()
            .enumerate()
            .find(|(_, e)| e.id == entity_id);

        let fan_out = self.mode == EditMode::Global
            && (named.is_none() || common_entity_fields(entities).contains(field));

        if fan_out {
            let targets: Vec<_> = entities
                .iter()
                .enumerate()
                .filter(|(_, e)| entity_fields(e).contains(field))
                .map(|(i, entity)| WriteTarget {
                    entity,
                    order: i as i64,
                })
                .collect();

            if targets.is_empty() {
                return Err(Error::NotFound {
                    kind: "field".to_string(),
                    id: field.to_string(),
                });
            }

            debug!("Global write of '{}' fans out to {} entities", field, targets.len());
            return Ok(targets);
        }

        let (index, entity) = named.ok_or_else(|| Error::entity_not_found(entity_id))?;

        Ok(vec![WriteTarget {
            entity,
            order: index as i64,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("T1", json!("Hello <name>, your code is <code>")),
            Entity::new("T2", json!("<name> only")),
        ]
    }

    fn ids(targets: &[WriteTarget<'_>]) -> Vec<(String, i64)> {
        targets.iter().map(|t| (t.entity.id.clone(), t.order)).collect()
    }

    #[test]
    fn test_toggle_and_lifecycle_transitions() {
        let mut mode = ModeController::default();
        assert_eq!(mode.mode(), EditMode::Global);
        assert_eq!(mode.toggle(), EditMode::Individual);
        assert_eq!(mode.toggle(), EditMode::Global);

        mode.on_import();
        assert_eq!(mode.mode(), EditMode::Individual);
        mode.on_clear();
        assert_eq!(mode.mode(), EditMode::Global);
    }

    #[test]
    fn test_global_common_field_fans_out() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Global);
        let targets = mode.plan_write(&entities, "*", "name").unwrap();
        assert_eq!(ids(&targets), vec![("T1".into(), 0), ("T2".into(), 1)]);
    }

    #[test]
    fn test_global_non_common_field_targets_one_entity() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Global);
        let targets = mode.plan_write(&entities, "T1", "code").unwrap();
        assert_eq!(ids(&targets), vec![("T1".into(), 0)]);
    }

    #[test]
    fn test_individual_targets_one_entity() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Individual);
        let targets = mode.plan_write(&entities, "T2", "name").unwrap();
        assert_eq!(ids(&targets), vec![("T2".into(), 1)]);
    }

    #[test]
    fn test_global_wildcard_skips_entities_without_field() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Global);
        let targets = mode.plan_write(&entities, "*", "code").unwrap();
        assert_eq!(ids(&targets), vec![("T1".into(), 0)]);
    }

    #[test]
    fn test_global_write_of_undeclared_field_is_not_found() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Global);
        let err = mode.plan_write(&entities, "*", "missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref kind, .. } if kind == "field"));
    }

    #[test]
    fn test_unknown_entity_is_not_found() {
        let entities = entities();
        let mode = ModeController::new(EditMode::Individual);
        let err = mode.plan_write(&entities, "ghost", "name").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
