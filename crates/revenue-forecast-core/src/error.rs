use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {kind} '{name}'")]
    NotFound { kind: String, name: String },

    #[error("Duplicate {kind}: '{name}' already exists")]
    Duplicate { kind: String, name: String },

    #[error("Protected {kind}: '{name}' cannot be {action}")]
    Protected {
        kind: String,
        name: String,
        action: String,
    },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ForecastError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &str, name: &str) -> Self {
        ForecastError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::SerializationError(e.to_string())
    }
}
