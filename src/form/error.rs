//! Form error types

use thiserror::Error;

use crate::store::StoreError;

pub const EMPTY_CHANGE_SET_MESSAGE: &str = "No hay cambios para enviar.";

/// A change-set that must not be submitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing to submit
    #[error("change-set is empty")]
    EmptyChangeSet,

    /// A proposed price is beyond the representable range
    #[error("proposed price for {code} exceeds the maximum amount")]
    AmountTooLarge { code: String },
}

impl ValidationError {
    /// Message shown to the visitor
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptyChangeSet => EMPTY_CHANGE_SET_MESSAGE.to_string(),
            ValidationError::AmountTooLarge { code } => {
                format!("El monto para {} es demasiado alto.", code)
            }
        }
    }
}

/// Errors returned by `PriceUpdateForm::submit`
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// Rejected locally, no store call was made
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Another submission from the same form is still pending
    #[error("A submission is already in progress")]
    InFlight,

    /// The store append failed
    #[error("Store error: {0}")]
    Transport(#[from] StoreError),
}
