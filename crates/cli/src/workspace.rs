//! Working files for the CLI host
//!
//! The CLI plays the part of the editor UI: it owns the entity collection
//! (a JSON array of test case records on disk) and persists the engine's
//! working state between invocations.

use anyhow::{Context, Result};
use casebook_common::{
    DynamicFields, EditMode, Entity, FieldValueStore, StoreObserver, StoreSnapshot,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CliConfig;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("entities file {0} must contain a JSON array")]
    EntitiesNotArray(PathBuf),

    #[error("state file {0} is not a valid Casebook state")]
    CorruptState(PathBuf),
}

/// Test case records loaded from disk, in display order
pub struct EntityFile {
    path: PathBuf,
    records: Vec<Value>,
    pub entities: Vec<Entity>,
}

impl EntityFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read entities file {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        let Value::Array(records) = value else {
            return Err(WorkspaceError::EntitiesNotArray(path.to_path_buf()).into());
        };

        let entities: Vec<Entity> = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                let entity = Entity::from_value(record);
                if entity.is_none() {
                    warn!("Skipping record {} in {}: no usable id", i, path.display());
                }
                entity
            })
            .collect();

        debug!("Loaded {} entities from {}", entities.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            records,
            entities,
        })
    }

    /// Rewrite the file so records follow `ordered`.
    ///
    /// Records without a usable id keep their relative place at the end.
    pub async fn write_order(&mut self, ordered: &[Entity]) -> Result<()> {
        let rank: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect();

        let mut keyed: Vec<(usize, Value)> = self
            .records
            .drain(..)
            .map(|record| {
                let key = Entity::from_value(&record)
                    .and_then(|e| rank.get(e.id.as_str()).copied())
                    .unwrap_or(usize::MAX);
                (key, record)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);

        self.records = keyed.into_iter().map(|(_, record)| record).collect();
        self.entities = ordered.to_vec();

        let content = serde_json::to_string_pretty(&self.records)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write entities file {}", self.path.display()))?;
        info!("Reordered {} entities in {}", self.entities.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What the engine reported during one command
#[derive(Debug, Default)]
pub struct Changes {
    pub data_changed: bool,
    pub reordered: Option<Vec<Entity>>,
}

/// Observer that records engine callbacks for the session to act on
#[derive(Clone, Default)]
pub struct ChangeTracker(Rc<RefCell<Changes>>);

impl ChangeTracker {
    pub fn data_changed(&self) -> bool {
        self.0.borrow().data_changed
    }

    pub fn take_reordered(&self) -> Option<Vec<Entity>> {
        self.0.borrow_mut().reordered.take()
    }
}

impl StoreObserver for ChangeTracker {
    fn on_data_change(&mut self, store: &FieldValueStore) {
        debug!("Store changed (version {})", store.version());
        self.0.borrow_mut().data_changed = true;
    }

    fn on_entities_reordered(&mut self, entities: &[Entity]) {
        self.0.borrow_mut().reordered = Some(entities.to_vec());
    }
}

/// Engine plus its persisted state file
pub struct Session {
    pub engine: DynamicFields,
    state_path: PathBuf,
    tracker: ChangeTracker,
    mode_at_load: EditMode,
}

impl Session {
    pub async fn open(config: &CliConfig, state_path: PathBuf) -> Result<Self> {
        let snapshot = load_snapshot(&state_path).await?;
        let mode_at_load = snapshot.mode;
        let tracker = ChangeTracker::default();

        let engine = DynamicFields::from_snapshot(snapshot, config.faker())
            .with_max_suggestions(config.max_suggestions)
            .with_observer(tracker.clone());

        Ok(Self {
            engine,
            state_path,
            tracker,
            mode_at_load,
        })
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Persist the state when the store or the mode changed.
    pub async fn save_if_changed(&self) -> Result<bool> {
        if !self.tracker.data_changed() && self.engine.mode() == self.mode_at_load {
            return Ok(false);
        }

        if let Some(parent) = self.state_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.engine.snapshot())?;
        tokio::fs::write(&self.state_path, content)
            .await
            .with_context(|| format!("Failed to write state {}", self.state_path.display()))?;
        debug!("Saved state to {}", self.state_path.display());
        Ok(true)
    }
}

async fn load_snapshot(path: &Path) -> Result<StoreSnapshot> {
    if !path.exists() {
        return Ok(StoreSnapshot::default());
    }
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str::<StoreSnapshot>(&content)
        .map_err(|_| WorkspaceError::CorruptState(path.to_path_buf()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn write_json(path: &Path, value: &Value) {
        tokio::fs::write(path, serde_json::to_string(value).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_entities_skips_records_without_id() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cases.json");
        write_json(
            &path,
            &json!([
                {"id": "T1", "name": "Login", "steps": ["<user>"]},
                {"name": "draft"},
                {"id": "T2", "payload": {"q": "{{query}}"}}
            ]),
        )
        .await;

        let file = EntityFile::load(&path).await.unwrap();
        assert_eq!(file.entities.len(), 2);
        assert_eq!(file.entities[0].name, "Login");
        assert_eq!(file.entities[1].payload, json!({"q": "{{query}}"}));
    }

    #[tokio::test]
    async fn test_load_entities_requires_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cases.json");
        write_json(&path, &json!({"id": "T1"})).await;

        let err = EntityFile::load(&path).await.err().unwrap();
        assert!(err.to_string().contains("must contain a JSON array"));
    }

    #[tokio::test]
    async fn test_write_order_keeps_records_intact() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cases.json");
        write_json(
            &path,
            &json!([
                {"id": "A", "extra": 1},
                {"note": "no id"},
                {"id": "B", "extra": 2}
            ]),
        )
        .await;

        let mut file = EntityFile::load(&path).await.unwrap();
        let reversed: Vec<Entity> = file.entities.iter().rev().cloned().collect();
        file.write_order(&reversed).await.unwrap();

        let written: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(
            written,
            json!([{"id": "B", "extra": 2}, {"id": "A", "extra": 1}, {"note": "no id"}])
        );
    }

    #[tokio::test]
    async fn test_session_persists_only_on_change() {
        let tmp = TempDir::new().unwrap();
        let state = tmp.path().join(".casebook").join("state.json");
        let config = CliConfig {
            faker_seed: Some(5),
            ..Default::default()
        };
        let entities = vec![Entity::new("T1", json!("<name>"))];

        let session = Session::open(&config, state.clone()).await.unwrap();
        assert!(!session.save_if_changed().await.unwrap());
        assert!(!state.exists());

        let mut session = Session::open(&config, state.clone()).await.unwrap();
        session
            .engine
            .set_value(&entities, "T1", "name", "Ada", None)
            .unwrap();
        assert!(session.save_if_changed().await.unwrap());

        let reopened = Session::open(&config, state.clone()).await.unwrap();
        assert_eq!(reopened.engine.get_value("T1", "name"), "Ada");
    }

    #[tokio::test]
    async fn test_mode_change_alone_is_persisted() {
        let tmp = TempDir::new().unwrap();
        let state = tmp.path().join("state.json");
        let config = CliConfig::default();

        let mut session = Session::open(&config, state.clone()).await.unwrap();
        session.engine.toggle_mode();
        assert!(session.save_if_changed().await.unwrap());

        let reopened = Session::open(&config, state).await.unwrap();
        assert_eq!(reopened.engine.mode(), EditMode::Individual);
    }

    #[tokio::test]
    async fn test_corrupt_state_is_reported() {
        let tmp = TempDir::new().unwrap();
        let state = tmp.path().join("state.json");
        tokio::fs::write(&state, "not json").await.unwrap();

        let err = Session::open(&CliConfig::default(), state).await.err().unwrap();
        assert!(err.to_string().contains("not a valid Casebook state"));
    }
}
