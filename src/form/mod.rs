//! Price Update Form
//!
//! Collects proposed prices for catalog items, formats them for display,
//! diffs them against the catalog and submits the result as one record.
//!
//! - **input**: digit stripping, display formatting, amount parsing
//! - **changeset**: pending edits -> list of `PriceUpdate`
//! - **state**: the `PriceUpdateForm` and its submission workflow
//! - **registry**: per-visitor form sessions

pub mod changeset;
pub mod error;
pub mod input;
pub mod registry;
pub mod state;

pub use changeset::{compute_change_set, PendingEdits, UNKNOWN_ITEM_NAME};
pub use error::{SubmissionError, ValidationError, EMPTY_CHANGE_SET_MESSAGE};
pub use input::{format_amount, format_for_display, parse_amount, strip_non_digits, NumberLocale};
pub use registry::{FormRegistry, RegistryConfig, RegistryError, SessionId};
pub use state::{
    EditView, FormConfig, FormSnapshot, PriceUpdateForm, SubmissionStatus, FAILURE_MESSAGE,
    SUCCESS_MESSAGE,
};
