//! CLI Commands

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::workspace::EntityFile;

pub mod fields;
pub mod state;
pub mod transfer;
pub mod values;

/// Location of the test case collection
#[derive(Args, Debug, Clone)]
pub struct EntitiesArg {
    /// JSON array of test case records
    #[arg(short = 'e', long = "entities", default_value = "cases.json")]
    pub path: PathBuf,
}

impl EntitiesArg {
    pub async fn load(&self) -> Result<EntityFile> {
        EntityFile::load(&self.path).await
    }
}
