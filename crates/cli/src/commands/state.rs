//! Mode and lifecycle commands

use anyhow::Result;
use casebook_common::EditMode;
use clap::{Args, ValueEnum};
use serde::Serialize;

use super::EntitiesArg;
use crate::output::{print_item, print_success, OutputFormat, TableDisplay};
use crate::workspace::Session;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeAction {
    /// Edit common fields for every test case at once
    Global,
    /// Edit each test case separately
    Individual,
    /// Switch to the other mode
    Toggle,
}

#[derive(Args)]
pub struct ModeArgs {
    /// Change the mode; shows the current one when omitted
    pub action: Option<ModeAction>,
}

#[derive(Args)]
pub struct PruneArgs {
    #[command(flatten)]
    pub entities: EntitiesArg,
}

/// Working state summary
#[derive(Serialize)]
pub struct StatusDisplay {
    pub mode: String,
    pub version: u64,
    pub entries: usize,
}

impl StatusDisplay {
    fn of(session: &Session) -> Self {
        Self {
            mode: session.engine.mode().to_string(),
            version: session.engine.version(),
            entries: session.engine.store().len(),
        }
    }
}

impl TableDisplay for StatusDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Mode", "Version", "Entries"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.mode.clone(),
            self.version.to_string(),
            self.entries.to_string(),
        ]
    }
}

pub fn mode(args: ModeArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let Some(action) = args.action else {
        print_item(&StatusDisplay::of(session), format);
        return Ok(());
    };

    let mode = match action {
        ModeAction::Global => {
            session.engine.set_mode(EditMode::Global);
            EditMode::Global
        }
        ModeAction::Individual => {
            session.engine.set_mode(EditMode::Individual);
            EditMode::Individual
        }
        ModeAction::Toggle => session.engine.toggle_mode(),
    };

    print_success(&format!("Edit mode is now {}", mode));
    Ok(())
}

pub async fn prune(args: PruneArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let file = args.entities.load().await?;
    let removed = session.engine.prune_stale(&file.entities);

    print_success(&format!("Removed {} stale entries", removed));
    print_item(&StatusDisplay::of(session), format);
    Ok(())
}

pub fn clear(session: &mut Session) -> Result<()> {
    session.engine.clear();
    print_success("Cleared all field values; edit mode reset to global");
    Ok(())
}
