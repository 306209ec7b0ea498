pub mod file;
pub mod stdin;

use std::path::Path;

use serde::de::DeserializeOwned;

/// Text encodings accepted for command input and `--config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` read as YAML, everything else as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse a forecasting document.
///
/// With no declared format the text is tried as JSON, then YAML. `source`
/// names the file or stream in error messages.
pub fn parse_document<T: DeserializeOwned>(
    text: &str,
    format: Option<DocumentFormat>,
    source: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    match format {
        Some(DocumentFormat::Json) => serde_json::from_str(text)
            .map_err(|e| format!("Failed to parse {source} as JSON: {e}").into()),
        Some(DocumentFormat::Yaml) => serde_yaml::from_str(text)
            .map_err(|e| format!("Failed to parse {source} as YAML: {e}").into()),
        None => match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(json_err) => {
                log::debug!("{source} is not JSON ({json_err}); trying YAML");
                serde_yaml::from_str(text).map_err(|yaml_err| {
                    format!("{source} is neither JSON ({json_err}) nor YAML ({yaml_err})").into()
                })
            }
        },
    }
}

/// Command input from `--input <file>` or, failing that, piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_document(path);
    }
    match stdin::read_stdin()? {
        Some(text) => parse_document(&text, None, "stdin"),
        None => Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into()),
    }
}
