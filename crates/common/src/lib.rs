//! Casebook Common Library
//!
//! The dynamic fields engine behind Casebook's test data editor: placeholder
//! extraction from test case payloads, per-entity value storage with global
//! and individual editing, deferred `faker.*` expressions, and the JSON
//! import/export document.

pub mod codec;
pub mod engine;
pub mod error;
pub mod extract;
pub mod faker;
pub mod mode;
pub mod store;
pub mod substitute;
pub mod types;

// Re-export commonly used types
pub use codec::{ExportedEntry, ImportPlan, EXPORT_FILE_NAME};
pub use engine::{DynamicFields, ImportOutcome, InputOutcome, NoopObserver, StoreObserver};
pub use error::{Error, Result};
pub use extract::{common_fields, extract_fields};
pub use faker::{ExpressionKind, FakerRegistry};
pub use mode::EditMode;
pub use store::{FieldValueStore, StoreSnapshot};
pub use types::*;

/// Casebook version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
