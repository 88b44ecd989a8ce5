//! Dynamic fields engine
//!
//! Ties the store, the mode controller, the expression registry and the
//! import/export codec together behind the operations a host calls from its
//! event handlers. The host owns the entity collection: the engine only
//! reads it, and asks for reordering through [`StoreObserver`].

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::codec::{self, ExportedEntry};
use crate::error::{Error, Result};
use crate::extract;
use crate::faker::{classify, ExpressionKind, FakerRegistry};
use crate::mode::{EditMode, ModeController};
use crate::store::{FieldValueStore, StoreSnapshot};
use crate::substitute::substitute;
use crate::types::Entity;

/// Default cap on completion suggestions
pub const DEFAULT_MAX_SUGGESTIONS: usize = 20;

/// Host callbacks
pub trait StoreObserver {
    /// Fired after any mutation of the store
    fn on_data_change(&mut self, _store: &FieldValueStore) {}

    /// Fired when an import reorders the active entity collection
    fn on_entities_reordered(&mut self, _entities: &[Entity]) {}
}

/// Observer that ignores every callback
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {}

/// What happened to a typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Stored as typed
    Stored { changed: bool },
    /// Evaluated, with the expression kept for export
    Evaluated { value: String, changed: bool },
    /// Still being typed; nothing was stored
    Suggestions(Vec<String>),
}

/// Summary of an applied import
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped_malformed: usize,
    pub merged_duplicates: usize,
    pub dropped_stale: usize,
    /// Values that looked like expressions but failed to evaluate, kept as text
    pub unevaluated: usize,
    pub reordered: Vec<Entity>,
}

pub struct DynamicFields {
    store: FieldValueStore,
    mode: ModeController,
    faker: FakerRegistry,
    observer: Box<dyn StoreObserver>,
    max_suggestions: usize,
}

impl std::fmt::Debug for DynamicFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicFields")
            .field("store", &self.store)
            .field("mode", &self.mode)
            .field("faker", &self.faker)
            .finish()
    }
}

impl Default for DynamicFields {
    fn default() -> Self {
        Self::new(FakerRegistry::new())
    }
}

impl DynamicFields {
    pub fn new(faker: FakerRegistry) -> Self {
        Self {
            store: FieldValueStore::new(),
            mode: ModeController::default(),
            faker,
            observer: Box::new(NoopObserver),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Resume from a persisted snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot, faker: FakerRegistry) -> Self {
        let mut engine = Self::new(faker);
        engine.store = FieldValueStore::from_entries(snapshot.entries, snapshot.version);
        engine.mode = ModeController::new(snapshot.mode);
        engine
    }

    pub fn with_observer(mut self, observer: impl StoreObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn store(&self) -> &FieldValueStore {
        &self.store
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot(self.mode.mode())
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Fields editable in global mode
    pub fn common_fields(&self, entities: &[Entity]) -> BTreeSet<String> {
        extract::common_entity_fields(entities)
    }

    // ========================================================================
    // Values
    // ========================================================================

    pub fn get_value(&self, entity_id: &str, field: &str) -> &str {
        self.store.get_value(entity_id, field)
    }

    /// Record a value for `field` according to the current mode.
    ///
    /// Returns whether the store changed.
    pub fn set_value(
        &mut self,
        entities: &[Entity],
        entity_id: &str,
        field: &str,
        value: &str,
        original_expression: Option<&str>,
    ) -> Result<bool> {
        let targets = self.mode.plan_write(entities, entity_id, field)?;

        let mut changed = false;
        for target in targets {
            changed |= self
                .store
                .upsert(target.entity, target.order, field, value, original_expression);
        }

        if changed {
            self.observer.on_data_change(&self.store);
        }
        Ok(changed)
    }

    /// Handle text typed into a field editor.
    ///
    /// Literals are stored as typed; partial expressions yield completion
    /// suggestions; complete expressions are evaluated and stored with the
    /// expression kept. A failed evaluation leaves the field untouched.
    pub fn apply_input(
        &mut self,
        entities: &[Entity],
        entity_id: &str,
        field: &str,
        text: &str,
    ) -> Result<InputOutcome> {
        match classify(text) {
            ExpressionKind::Literal => {
                let changed = self.set_value(entities, entity_id, field, text, None)?;
                Ok(InputOutcome::Stored { changed })
            }
            ExpressionKind::Partial => Ok(InputOutcome::Suggestions(self.suggest(text))),
            ExpressionKind::Complete => {
                let expression = text.trim();
                let value = self.faker.evaluate(expression).inspect_err(|e| {
                    warn!("Field '{}' of {} not updated: {}", field, entity_id, e);
                })?;
                let changed = self.set_value(entities, entity_id, field, &value, Some(expression))?;
                Ok(InputOutcome::Evaluated { value, changed })
            }
        }
    }

    pub fn evaluate(&mut self, expression: &str) -> Result<String> {
        self.faker.evaluate(expression)
    }

    pub fn suggest(&self, partial: &str) -> Vec<String> {
        self.faker.suggest(partial, self.max_suggestions)
    }

    // ========================================================================
    // Mode
    // ========================================================================

    pub fn mode(&self) -> EditMode {
        self.mode.mode()
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode.set(mode);
    }

    pub fn toggle_mode(&mut self) -> EditMode {
        self.mode.toggle()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Empty the store and return to global mode.
    pub fn clear(&mut self) {
        self.mode.on_clear();
        if self.store.clear() {
            info!("Cleared dynamic field values");
            self.observer.on_data_change(&self.store);
        }
    }

    /// Remove entries whose entity left the collection.
    pub fn prune_stale(&mut self, entities: &[Entity]) -> usize {
        let removed = self.store.retain_entities(entities);
        if removed > 0 {
            info!("Pruned {} stale field value entries", removed);
            self.observer.on_data_change(&self.store);
        }
        removed
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    pub fn export(&self) -> Vec<ExportedEntry> {
        codec::export(&self.store)
    }

    pub fn export_json(&self) -> Result<String> {
        codec::export_json(&self.store)
    }

    /// Import document text. Parse failures leave the store untouched.
    pub fn import_text(&mut self, text: &str, entities: &[Entity]) -> Result<ImportOutcome> {
        let elements = codec::parse_document(text)?;
        Ok(self.import_elements(&elements, entities))
    }

    /// Import an already parsed document.
    pub fn import_value(&mut self, document: Value, entities: &[Entity]) -> Result<ImportOutcome> {
        let elements = codec::into_elements(document)?;
        Ok(self.import_elements(&elements, entities))
    }

    fn import_elements(&mut self, elements: &[Value], entities: &[Entity]) -> ImportOutcome {
        let mut plan = codec::plan_import(elements, entities);
        let mut unevaluated = 0;

        // Exported documents carry expressions; evaluate them again so the
        // preview has concrete values and the next export round-trips.
        for entry in &mut plan.entries {
            for (field, value) in entry.input.iter_mut() {
                if classify(value) != ExpressionKind::Complete {
                    continue;
                }
                let expression = value.trim().to_string();
                match self.faker.evaluate(&expression) {
                    Ok(evaluated) => {
                        *value = evaluated;
                        entry.original_expressions.insert(field.clone(), expression);
                    }
                    Err(e) => {
                        warn!("Keeping imported value of {}.{} as text: {}", entry.id, field, e);
                        unevaluated += 1;
                    }
                }
            }
        }

        let imported = plan.entries.len();
        self.store.replace_all(plan.entries);
        self.mode.on_import();
        self.observer.on_data_change(&self.store);
        self.observer.on_entities_reordered(&plan.reordered);

        debug!("Import left store at version {}", self.store.version());

        ImportOutcome {
            imported,
            skipped_malformed: plan.skipped_malformed,
            merged_duplicates: plan.merged_duplicates,
            dropped_stale: plan.dropped_stale,
            unevaluated,
            reordered: plan.reordered,
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Entity payloads with recorded values substituted, in collection order.
    pub fn render(&self, entities: &[Entity]) -> Vec<(String, Value)> {
        entities
            .iter()
            .map(|entity| {
                let payload = match self.store.get(&entity.id) {
                    Some(entry) => substitute(&entity.payload, &entry.input),
                    None => entity.payload.clone(),
                };
                (entity.id.clone(), payload)
            })
            .collect()
    }

    /// Look up one entity or fail with NotFound
    pub fn entity<'a>(&self, entities: &'a [Entity], id: &str) -> Result<&'a Entity> {
        entities
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::entity_not_found(id))
    }
}
