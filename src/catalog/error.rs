//! Catalog error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the tariff dataset
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Dataset file could not be read
    #[error("Failed to read catalog {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    /// Dataset is not valid JSON or has the wrong shape
    #[error("Invalid catalog document: {0}")]
    Parse(String),

    /// The same item code appears more than once
    #[error("Duplicate item code {code} (sections {first} and {second})")]
    DuplicateCode {
        code: String,
        first: String,
        second: String,
    },

    /// An item has an empty code
    #[error("Empty item code in section {0}")]
    EmptyCode(String),

    /// A base price exceeds the representable range
    #[error("Base price for {code} exceeds the maximum amount")]
    AmountTooLarge { code: String },
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::DuplicateCode {
            code: "D0120".to_string(),
            first: "01_diagnostico".to_string(),
            second: "02_prevencion".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate item code D0120 (sections 01_diagnostico and 02_prevencion)"
        );
    }
}
