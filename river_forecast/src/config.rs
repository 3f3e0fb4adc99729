//! Application configuration
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration:
//!
//! ```toml
//! [data]
//! path = "dados_nivel_rios_itacoatiara.json"
//! duplicate_policy = "last_wins"
//!
//! [training]
//! test_ratio = 0.2
//! seed = 42
//!
//! [forest]
//! n_trees = 200
//! max_depth = 20
//!
//! [model]
//! path = "modelo_nivel_rio.pkl"
//! ```

use crate::analysis::AnalysisConfig;
use crate::data::DuplicatePolicy;
use crate::error::Result;
use crate::models::ForestConfig;
use crate::training::TrainingConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default historical data file
pub const DEFAULT_DATA_PATH: &str = "dados_nivel_rios_itacoatiara.json";

/// Default model artifact file
pub const DEFAULT_MODEL_PATH: &str = "modelo_nivel_rio.pkl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Artifact location. The content is JSON whatever the extension.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Top-level configuration for the command-line tools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub forest: ForestConfig,
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!("Read configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        self.forest.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}
