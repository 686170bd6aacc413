//! Change-set computation
//!
//! Diffs pending edits against the catalog to produce the list of updates
//! that will be appended as one record.

use indexmap::IndexMap;

use super::error::ValidationError;
use super::input::parse_amount;
use crate::catalog::PriceCatalog;
use crate::store::PriceUpdate;

/// Name recorded when a pending code is missing from the catalog
pub const UNKNOWN_ITEM_NAME: &str = "Desconocido";

/// Pending edits: item code -> cleaned digit string, in first-edit order.
///
/// An empty string means the field was cleared and carries no edit.
pub type PendingEdits = IndexMap<String, String>;

/// Build the updates for every non-empty pending edit, in insertion order.
///
/// Codes are expected to come from the catalog. A missing code is an
/// upstream mismatch: it is logged and recorded under `UNKNOWN_ITEM_NAME`.
pub fn compute_change_set(
    catalog: &PriceCatalog,
    pending: &PendingEdits,
) -> Result<Vec<PriceUpdate>, ValidationError> {
    let mut updates = Vec::new();

    for (code, digits) in pending.iter().filter(|(_, digits)| !digits.is_empty()) {
        let new_price = parse_amount(digits)
            .ok_or_else(|| ValidationError::AmountTooLarge { code: code.clone() })?;

        let name = match catalog.get(code) {
            Some(item) => item.name.clone(),
            None => {
                tracing::error!(
                    code = %code,
                    "Pending edit references a code missing from the catalog"
                );
                UNKNOWN_ITEM_NAME.to_string()
            }
        };

        updates.push(PriceUpdate {
            code: code.clone(),
            name,
            new_price,
        });
    }

    Ok(updates)
}
