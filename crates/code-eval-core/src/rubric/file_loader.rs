use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::{Category, Rubric};

/// Load the rubric at `path`, falling back to [`Rubric::default`] on any failure.
///
/// A missing path selects the default without logging a warning. Read, parse and
/// validation failures are logged and never propagated.
pub fn load_or_default(path: Option<&Path>) -> Rubric {
    let Some(path) = path else {
        return Rubric::default();
    };
    match load_rubric(path) {
        Ok(rubric) => {
            info!(
                path = %path.display(),
                categories = rubric.categories().len(),
                max_score = rubric.max_possible_score(),
                "loaded custom rubric"
            );
            rubric
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %format!("{err:#}"),
                "failed to load custom rubric; using default rubric"
            );
            Rubric::default()
        }
    }
}

/// Strictly load and validate a YAML rubric document.
pub fn load_rubric(path: &Path) -> Result<Rubric> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read rubric file at {}", path.display()))?;
    parse_rubric(&raw).with_context(|| format!("invalid rubric file at {}", path.display()))
}

/// Parse a YAML rubric, keeping categories in document order.
pub fn parse_rubric(raw: &str) -> Result<Rubric> {
    let mapping: serde_yaml::Mapping =
        serde_yaml::from_str(raw).context("rubric must be a YAML mapping of categories")?;
    let mut categories = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = key
            .as_str()
            .map(str::to_string)
            .with_context(|| format!("rubric category key must be a string (got {key:?})"))?;
        let spec: YamlCategory = serde_yaml::from_value(value)
            .with_context(|| format!("invalid definition for rubric category `{name}`"))?;
        categories.push(Category::new(
            name,
            spec.max_score,
            spec.description,
            spec.criteria,
        )?);
    }
    Ok(Rubric::new(categories)?)
}

#[derive(Deserialize)]
struct YamlCategory {
    max_score: u32,
    description: String,
    #[serde(default)]
    criteria: Vec<String>,
}
