//! Top-level configuration file

use crate::openai::ApiConfig;
use crate::output::OutputConfig;
use crate::LlmResult;
use hdocs_core::ExtractionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings read from a config file, all sections optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdocsConfig {
    pub api: ApiConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

impl HdocsConfig {
    /// Defaults, overlaid with `path` when given
    pub fn load(path: Option<&Path>) -> LlmResult<Self> {
        let defaults = Self::default();
        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                Ok(hdocs_utils::config::load_layered(&defaults, path)?)
            }
            None => Ok(defaults),
        }
    }

    pub fn validate(&self) -> LlmResult<()> {
        self.api.validate()?;
        self.output.validate()
    }
}
