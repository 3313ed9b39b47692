use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use code_eval_core::LlmSettings;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Settings layered from an optional config file and `CODE_EVAL_*` variables.
///
/// Nested keys use a double underscore, e.g. `CODE_EVAL_LLM__MODEL=gpt-4o`.
/// `CODE_EVAL_EXCLUDE` takes a comma-separated list of globs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub rubric: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub fail_on_missing_score: bool,
}

pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix("CODE_EVAL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("exclude")
                .try_parsing(true),
        )
        .build()
        .with_context(|| match path {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to load configuration from environment".to_string(),
        })?;
    config
        .try_deserialize()
        .context("invalid configuration values")
}
