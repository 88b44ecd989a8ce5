//! Field listing and rendering commands

use anyhow::Result;
use casebook_common::extract::fields_by_entity;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use super::EntitiesArg;
use crate::output::{print_document, print_info, print_list, OutputFormat, TableDisplay};
use crate::workspace::Session;

#[derive(Args)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub entities: EntitiesArg,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub entities: EntitiesArg,

    /// Only render this test case
    #[arg(long)]
    pub entity: Option<String>,
}

/// Fields referenced by one test case
#[derive(Serialize)]
pub struct EntityFieldsDisplay {
    pub id: String,
    pub name: String,
    pub fields: Vec<String>,
}

impl TableDisplay for EntityFieldsDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Fields"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.fields.join(", ")]
    }
}

#[derive(Serialize)]
struct FieldsReport<'a> {
    common: Vec<String>,
    entities: &'a [EntityFieldsDisplay],
}

#[derive(Serialize)]
pub struct RenderedDisplay {
    pub id: String,
    pub payload: Value,
}

impl TableDisplay for RenderedDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Payload"]
    }

    fn row(&self) -> Vec<String> {
        let payload = match &self.payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        vec![self.id.clone(), payload]
    }
}

pub async fn list(args: FieldsArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let file = args.entities.load().await?;
    let names: HashMap<&str, &str> = file
        .entities
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    let displays: Vec<EntityFieldsDisplay> = fields_by_entity(&file.entities)
        .into_iter()
        .map(|(id, fields)| EntityFieldsDisplay {
            name: names.get(id.as_str()).copied().unwrap_or_default().to_string(),
            id,
            fields: fields.into_iter().collect(),
        })
        .collect();
    let common: Vec<String> = session.engine.common_fields(&file.entities).into_iter().collect();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            print_document(
                &FieldsReport {
                    common,
                    entities: &displays,
                },
                format,
            );
        }
        _ => {
            print_list(&displays, format);
            if common.is_empty() {
                print_info("No fields are shared by every test case");
            } else {
                print_info(&format!("Common fields: {}", common.join(", ")));
            }
        }
    }
    Ok(())
}

pub async fn render(args: RenderArgs, session: &Session, format: OutputFormat) -> Result<()> {
    let file = args.entities.load().await?;
    let entities = match &args.entity {
        Some(id) => vec![session.engine.entity(&file.entities, id)?.clone()],
        None => file.entities,
    };

    let displays: Vec<RenderedDisplay> = session
        .engine
        .render(&entities)
        .into_iter()
        .map(|(id, payload)| RenderedDisplay { id, payload })
        .collect();

    print_list(&displays, format);
    Ok(())
}
