use std::fs;
use std::path::{Path, PathBuf};

use revenue_forecast_core::config::ForecastConfig;
use serde::de::DeserializeOwned;

use super::{parse_document, DocumentFormat};

/// Read a JSON or YAML input file, choosing the parser by extension.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let location = locate(path)?;
    let text = fs::read_to_string(&location)
        .map_err(|e| format!("Failed to read '{}': {}", location.display(), e))?;
    log::debug!("input: {} ({} bytes)", location.display(), text.len());
    parse_document(
        &text,
        Some(DocumentFormat::from_path(&location)),
        &format!("'{}'", location.display()),
    )
}

/// Load and validate a `ForecastConfig` from a JSON or YAML file.
///
/// Returns `None` when no path is given so commands fall back to the
/// settings carried in their own input.
pub fn load_config(path: Option<&str>) -> Result<Option<ForecastConfig>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let config: ForecastConfig = read_document(path)?;
    config
        .validate()
        .map_err(|e| format!("Invalid config '{path}': {e}"))?;

    log::info!(
        "loaded config from {path} ({} risk factors)",
        config.risk_factors.len()
    );
    Ok(Some(config))
}

/// Absolute path of an existing regular file.
fn locate(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let location = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !location.is_file() {
        let what = if location.exists() { "Not a file" } else { "File not found" };
        return Err(format!("{what}: {}", location.display()).into());
    }
    Ok(location)
}
