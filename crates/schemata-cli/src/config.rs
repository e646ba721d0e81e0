//! Parse option configuration files

use anyhow::{Context, Result};
use schemata_ast::ParseOptions;
use std::path::Path;
use tracing::debug;

/// Load parse options from a YAML (`.yaml`/`.yml`) or JSON file
pub fn load_options(path: &Path) -> Result<ParseOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let options: ParseOptions = if path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml")
    {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?
    };
    debug!("Loaded parse options from {}: {:?}", path.display(), options);
    Ok(options)
}
