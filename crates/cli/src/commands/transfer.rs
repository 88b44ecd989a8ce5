//! Import and export commands

use anyhow::{Context, Result};
use casebook_common::ImportOutcome;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use super::EntitiesArg;
use crate::config::CliConfig;
use crate::output::{
    print_document, print_item, print_success, print_warning, OutputFormat, TableDisplay,
};
use crate::workspace::Session;

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (defaults to the configured export file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the document instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Previously exported document
    pub file: PathBuf,

    #[command(flatten)]
    pub entities: EntitiesArg,
}

/// Summary of an applied import
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDisplay {
    pub imported: usize,
    pub skipped_malformed: usize,
    pub merged_duplicates: usize,
    pub dropped_stale: usize,
    pub unevaluated: usize,
    pub order: Vec<String>,
}

impl From<&ImportOutcome> for ImportDisplay {
    fn from(outcome: &ImportOutcome) -> Self {
        Self {
            imported: outcome.imported,
            skipped_malformed: outcome.skipped_malformed,
            merged_duplicates: outcome.merged_duplicates,
            dropped_stale: outcome.dropped_stale,
            unevaluated: outcome.unevaluated,
            order: outcome.reordered.iter().map(|e| e.id.clone()).collect(),
        }
    }
}

impl TableDisplay for ImportDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Imported", "Malformed", "Merged", "Stale", "Unevaluated", "Order"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.imported.to_string(),
            self.skipped_malformed.to_string(),
            self.merged_duplicates.to_string(),
            self.dropped_stale.to_string(),
            self.unevaluated.to_string(),
            self.order.join(", "),
        ]
    }
}

pub async fn export(
    args: ExportArgs,
    session: &Session,
    config: &CliConfig,
    format: OutputFormat,
) -> Result<()> {
    if args.stdout {
        print_document(&session.engine.export(), format);
        return Ok(());
    }

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.export_file_name));
    let content = session.engine.export_json()?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    print_success(&format!(
        "Exported {} entries to {}",
        session.engine.store().len(),
        path.display()
    ));
    Ok(())
}

pub async fn import(args: ImportArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let mut file = args.entities.load().await?;
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let outcome = session.engine.import_text(&text, &file.entities)?;

    if let Some(reordered) = session.tracker().take_reordered() {
        debug!("Writing reordered collection to {}", file.path().display());
        file.write_order(&reordered).await?;
    }

    if outcome.dropped_stale > 0 {
        print_warning(&format!(
            "{} entries referenced test cases that no longer exist",
            outcome.dropped_stale
        ));
    }
    if outcome.unevaluated > 0 {
        print_warning(&format!(
            "{} expressions could not be evaluated and were kept as text",
            outcome.unevaluated
        ));
    }

    print_success(&format!(
        "Imported {} entries from {} (now in {} mode)",
        outcome.imported,
        args.file.display(),
        session.engine.mode()
    ));
    print_item(&ImportDisplay::from(&outcome), format);
    Ok(())
}
