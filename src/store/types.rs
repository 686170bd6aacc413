//! Outbound record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Amount;

/// One proposed price change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "servicio")]
    pub name: String,
    #[serde(rename = "monto_nuevo")]
    pub new_price: Amount,
}

impl PriceUpdate {
    pub fn new(code: impl Into<String>, name: impl Into<String>, new_price: Amount) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            new_price,
        }
    }
}

/// A change-set ready to be appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceUpdateRecord {
    pub updates: Vec<PriceUpdate>,
}

impl PriceUpdateRecord {
    pub fn new(updates: Vec<PriceUpdate>) -> Self {
        Self { updates }
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// A record as persisted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Document id assigned at append time
    pub id: String,
    pub updates: Vec<PriceUpdate>,
    /// Store-assigned submission time
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}
