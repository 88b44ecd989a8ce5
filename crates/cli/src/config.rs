//! CLI configuration

use casebook_common::engine::DEFAULT_MAX_SUGGESTIONS;
use casebook_common::{FakerRegistry, EXPORT_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration, read from `casebook.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Persisted working state
    pub state_path: PathBuf,

    /// File name used by `export` when no output is given
    pub export_file_name: String,

    /// Seed for reproducible `faker.*` values
    pub faker_seed: Option<u64>,

    /// Cap on completion suggestions
    pub max_suggestions: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".casebook").join("state.json"),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            faker_seed: None,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Expression registry honoring the configured seed
    pub fn faker(&self) -> FakerRegistry {
        match self.faker_seed {
            Some(seed) => FakerRegistry::seeded(seed),
            None => FakerRegistry::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = CliConfig::load(&tmp.path().join("casebook.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.export_file_name, "dynamic-data.json");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("casebook.toml");
        std::fs::write(&path, "faker_seed = 9\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.faker_seed, Some(9));
        assert_eq!(config.max_suggestions, DEFAULT_MAX_SUGGESTIONS);
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("casebook.toml");
        let config = CliConfig {
            faker_seed: Some(1),
            max_suggestions: 5,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(CliConfig::load(&path).unwrap(), config);
    }
}
