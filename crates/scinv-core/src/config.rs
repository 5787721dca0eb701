use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::flatten::{FlattenOptions, DEFAULT_COMMENT_SEPARATOR};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_FILE_NAME: &str = "unified_inventory_analysis.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Report settings, loadable from TOML. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub comment_separator: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_name: DEFAULT_FILE_NAME.to_string(),
            comment_separator: DEFAULT_COMMENT_SEPARATOR.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            comment_separator: self.comment_separator.clone(),
        }
    }
}
