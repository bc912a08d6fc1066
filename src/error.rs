//! Error taxonomy for risk scoring
//!
//! Schema and degenerate-input errors abort the call that raised them; the
//! pipeline never returns partial scores. Unknown categories and missing
//! numeric values are handled by imputation and are not errors.

use thiserror::Error;

/// Errors for risk scoring operations
#[derive(Error, Debug)]
pub enum RiskError {
    /// A record is missing a schema attribute entirely, or carries a value
    /// of the wrong kind for its column
    #[error("Schema error: {0}")]
    Schema(String),

    /// The population source has no identifier column
    #[error("Population source lacks identifier column '{0}'")]
    MissingIdentifier(String),

    /// Nothing to fit on (zero rows, zero columns, zero trees)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Malformed user-supplied scalar
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RiskError {
    pub(crate) fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
