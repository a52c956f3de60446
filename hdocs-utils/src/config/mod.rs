//! Configuration file loading and merging
//!
//! Configuration files may be TOML, JSON or YAML; the format is chosen by
//! extension. Partial files are layered over defaults with [`load_layered`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yml" | "yaml" => Ok(Self::Yaml),
            _ => Err(crate::UtilError::Config(format!(
                "Unsupported config format: '{}' ({})",
                extension,
                path.display()
            ))),
        }
    }
}

/// Parse configuration text of a known format into a JSON value
pub fn parse_value(content: &str, format: ConfigFormat) -> crate::Result<serde_json::Value> {
    match format {
        ConfigFormat::Toml => {
            let toml_value: toml::Value = toml::from_str(content)
                .map_err(|e| crate::UtilError::Config(format!("TOML parse error: {}", e)))?;
            serde_json::to_value(toml_value)
                .map_err(|e| crate::UtilError::Config(format!("TOML conversion error: {}", e)))
        }
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| crate::UtilError::Config(format!("JSON parse error: {}", e))),
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| crate::UtilError::Config(format!("YAML parse error: {}", e))),
    }
}

/// Load a possibly partial configuration file on top of `base`
pub fn load_layered<T>(base: &T, path: &Path) -> crate::Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let overrides = parse_value(&content, format)?;

    let mut base_value = serde_json::to_value(base)
        .map_err(|e| crate::UtilError::Serialization(format!("Base serialization error: {}", e)))?;
    merge_json_values(&mut base_value, overrides);

    serde_json::from_value(base_value)
        .map_err(|e| crate::UtilError::Config(format!("{}: {}", path.display(), e)))
}

/// Merge two JSON values (second overrides first)
fn merge_json_values(base: &mut serde_json::Value, override_value: serde_json::Value) {
    match (base, override_value) {
        (serde_json::Value::Object(base_obj), serde_json::Value::Object(override_obj)) => {
            for (key, value) in override_obj {
                match base_obj.get_mut(&key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_obj.insert(key, value);
                    }
                }
            }
        }
        (base_value, override_value) => {
            *base_value = override_value;
        }
    }
}
