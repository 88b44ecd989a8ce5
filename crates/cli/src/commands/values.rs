//! Value commands

use anyhow::Result;
use casebook_common::extract::entity_fields;
use casebook_common::{Entity, InputOutcome};
use clap::Args;
use serde::Serialize;

use super::EntitiesArg;
use crate::output::{
    print_list, print_message, print_success, print_warning, OutputFormat, TableDisplay,
};
use crate::workspace::Session;

#[derive(Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub entities: EntitiesArg,

    /// Field name
    #[arg(short, long)]
    pub field: String,

    /// Test case ID (all test cases using the field when omitted)
    #[arg(long)]
    pub entity: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub entities: EntitiesArg,

    /// Test case ID; in global mode `*` writes every test case using the field
    #[arg(long, default_value = "*")]
    pub entity: String,

    /// Field name
    #[arg(short, long)]
    pub field: String,

    /// Value as typed, or a `faker.*` expression
    #[arg(long, allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Partially typed expression, e.g. `faker.person.`
    pub partial: String,
}

#[derive(Args)]
pub struct EvalArgs {
    /// Complete expression, e.g. `faker.number.int({ min: 1, max: 6 })`
    pub expression: String,
}

/// One recorded field value
#[derive(Serialize)]
pub struct ValueDisplay {
    pub entity: String,
    pub field: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl ValueDisplay {
    fn of(session: &Session, entity_id: &str, field: &str) -> Self {
        let store = session.engine.store();
        Self {
            entity: entity_id.to_string(),
            field: field.to_string(),
            value: store.get_value(entity_id, field).to_string(),
            expression: store.original_expression(entity_id, field).map(String::from),
        }
    }
}

impl TableDisplay for ValueDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Entity", "Field", "Value", "Expression"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.entity.clone(),
            self.field.clone(),
            self.value.clone(),
            self.expression.clone().unwrap_or_else(|| "-".to_string()),
        ]
    }
}

#[derive(Serialize)]
pub struct SuggestionDisplay {
    pub path: String,
}

impl TableDisplay for SuggestionDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Suggestion"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.path.clone()]
    }
}

fn values_for(session: &Session, entities: &[Entity], field: &str) -> Vec<ValueDisplay> {
    entities
        .iter()
        .filter(|e| entity_fields(e).contains(field))
        .map(|e| ValueDisplay::of(session, &e.id, field))
        .collect()
}

fn print_suggestions(paths: Vec<String>, format: OutputFormat) {
    let displays: Vec<SuggestionDisplay> = paths
        .into_iter()
        .map(|path| SuggestionDisplay { path })
        .collect();
    print_list(&displays, format);
}

pub async fn get(args: GetArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let file = args.entities.load().await?;

    let displays = match &args.entity {
        Some(id) => {
            let entity = session.engine.entity(&file.entities, id)?;
            vec![ValueDisplay::of(session, &entity.id, &args.field)]
        }
        None => values_for(session, &file.entities, &args.field),
    };

    print_list(&displays, format);
    Ok(())
}

pub async fn set(args: SetArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let file = args.entities.load().await?;
    let outcome = session
        .engine
        .apply_input(&file.entities, &args.entity, &args.field, &args.value)?;
    let mode = session.engine.mode();

    match outcome {
        InputOutcome::Suggestions(paths) => {
            print_warning("Expression is incomplete; nothing was stored");
            print_suggestions(paths, format);
            return Ok(());
        }
        InputOutcome::Stored { changed: false } | InputOutcome::Evaluated { changed: false, .. } => {
            print_message("Value unchanged", format);
        }
        InputOutcome::Stored { changed: true } => {
            print_success(&format!("Set '{}' ({} mode)", args.field, mode));
        }
        InputOutcome::Evaluated { value, changed: true } => {
            print_success(&format!("Set '{}' to {} ({} mode)", args.field, value, mode));
        }
    }

    print_list(&values_for(session, &file.entities, &args.field), format);
    Ok(())
}

pub fn suggest(args: SuggestArgs, session: &Session, format: OutputFormat) -> Result<()> {
    print_suggestions(session.engine.suggest(&args.partial), format);
    Ok(())
}

pub fn eval(args: EvalArgs, session: &mut Session, format: OutputFormat) -> Result<()> {
    let value = session.engine.evaluate(&args.expression)?;
    print_message(&value, format);
    Ok(())
}
