//! Builder configuration.
//!
//! A YAML file holds the model parameters, optionally under a `model:` key
//! next to builder settings. `${VAR}` and `${VAR:-default}` are substituted
//! from the environment before parsing; `IONMODEL_*` variables are applied
//! on top of the parsed values.

use anyhow::{Context, Result};
use ionmodel::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Model parameters.
    pub model: ModelConfig,

    /// Directory models are saved into.
    pub output_dir: Option<String>,

    /// Frequencies (MHz) reported after the build.
    pub report_frequencies_mhz: Vec<f64>,
}

impl BuilderConfig {
    /// Parse a YAML document after environment substitution.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: BuilderConfig =
            serde_yaml::from_str(&expanded).with_context(|| "Failed to parse builder config YAML")?;
        Ok(config)
    }

    /// Load a YAML file, then apply `IONMODEL_*` overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read builder config from {:?}", path.as_ref()))?;
        let mut config = Self::from_yaml(&content)?;
        config.model.apply_env();
        Ok(config)
    }

    /// Defaults plus `IONMODEL_*` overrides, used when no file is given.
    pub fn from_env() -> Self {
        Self {
            model: ModelConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in YAML content.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
