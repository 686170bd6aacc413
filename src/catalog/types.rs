//! Core catalog types
//!
//! - `PricedItem`: one procedure with its baseline price
//! - `PriceCatalog`: items grouped into ordered sections
//! - `Amount`: whole colones

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

use super::error::{CatalogError, CatalogResult};

/// A price in whole colones.
///
/// The dataset quotes every price in whole currency units, which is the
/// smallest unit this system deals with.
pub type Amount = u64;

/// Largest amount accepted anywhere in the system.
///
/// Fits exactly in both `i64` and `f64`, so it survives the store's integer
/// encoding and any JavaScript consumer of the stored documents.
pub const MAX_AMOUNT: Amount = 999_999_999_999;

/// A single procedure in the tariff list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    /// Procedure code, unique across the catalog (e.g. "D0120")
    #[serde(rename = "codigo")]
    pub code: String,
    /// Display name
    #[serde(rename = "servicio")]
    pub name: String,
    /// Baseline price
    #[serde(rename = "monto_crc")]
    pub base_price: Amount,
}

impl PricedItem {
    /// Create a new item
    pub fn new(code: impl Into<String>, name: impl Into<String>, base_price: Amount) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            base_price,
        }
    }
}

/// The baseline price list, grouped into ordered sections.
///
/// Immutable once built; item codes are unique across all sections.
#[derive(Debug, Clone, Default)]
pub struct PriceCatalog {
    sections: IndexMap<String, Vec<PricedItem>>,
    /// code -> (section index, item index)
    index: HashMap<String, (usize, usize)>,
}

impl PriceCatalog {
    /// Build a catalog from ordered sections, validating code uniqueness
    pub fn from_sections(sections: IndexMap<String, Vec<PricedItem>>) -> CatalogResult<Self> {
        let mut index: HashMap<String, (usize, usize)> = HashMap::new();

        for (section_idx, (section, items)) in sections.iter().enumerate() {
            for (item_idx, item) in items.iter().enumerate() {
                if item.code.trim().is_empty() {
                    return Err(CatalogError::EmptyCode(section.clone()));
                }
                if item.base_price > MAX_AMOUNT {
                    return Err(CatalogError::AmountTooLarge {
                        code: item.code.clone(),
                    });
                }
                if let Some(&(first_idx, _)) = index.get(&item.code) {
                    let first = sections
                        .get_index(first_idx)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_default();
                    return Err(CatalogError::DuplicateCode {
                        code: item.code.clone(),
                        first,
                        second: section.clone(),
                    });
                }
                index.insert(item.code.clone(), (section_idx, item_idx));
            }
        }

        Ok(Self { sections, index })
    }

    /// Look up an item by code
    pub fn get(&self, code: &str) -> Option<&PricedItem> {
        let &(section_idx, item_idx) = self.index.get(code)?;
        self.sections
            .get_index(section_idx)
            .and_then(|(_, items)| items.get(item_idx))
    }

    /// Check whether a code belongs to the catalog
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Iterate sections in dataset order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[PricedItem])> {
        self.sections
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// Iterate all items in dataset order
    pub fn items(&self) -> impl Iterator<Item = &PricedItem> {
        self.sections.values().flatten()
    }

    /// Number of items across all sections
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

impl Serialize for PriceCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sections.serialize(serializer)
    }
}

/// Human-readable title for a section key.
///
/// Underscores become spaces and a leading numeric ordering prefix is dropped:
/// `"01_diagnostico"` becomes `"diagnostico"`.
pub fn section_title(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let digits = spaced.chars().take_while(|c| c.is_ascii_digit()).count();

    if digits > 0 && spaced[digits..].starts_with(' ') {
        spaced[digits + 1..].to_string()
    } else {
        spaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sections() -> IndexMap<String, Vec<PricedItem>> {
        let mut sections = IndexMap::new();
        sections.insert(
            "01_diagnostico".to_string(),
            vec![
                PricedItem::new("D0120", "Examen", 15000),
                PricedItem::new("D0220", "Radiografía periapical", 8000),
            ],
        );
        sections.insert(
            "02_prevencion".to_string(),
            vec![PricedItem::new("D1110", "Limpieza dental adulto", 30000)],
        );
        sections
    }

    #[test]
    fn test_lookup_by_code() {
        let catalog = PriceCatalog::from_sections(sample_sections()).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.section_count(), 2);
        assert_eq!(catalog.get("D1110").unwrap().base_price, 30000);
        assert!(catalog.contains("D0220"));
        assert!(!catalog.contains("X9999"));
        assert!(catalog.get("X9999").is_none());
    }

    #[test]
    fn test_items_keep_dataset_order() {
        let catalog = PriceCatalog::from_sections(sample_sections()).unwrap();
        let codes: Vec<&str> = catalog.items().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["D0120", "D0220", "D1110"]);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut sections = sample_sections();
        sections
            .get_mut("02_prevencion")
            .unwrap()
            .push(PricedItem::new("D0120", "Examen repetido", 1));

        let err = PriceCatalog::from_sections(sections).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateCode { ref code, ref first, ref second }
                if code == "D0120" && first == "01_diagnostico" && second == "02_prevencion"
        ));
    }

    #[test]
    fn test_empty_code_rejected() {
        let mut sections = sample_sections();
        sections
            .get_mut("01_diagnostico")
            .unwrap()
            .push(PricedItem::new("  ", "Sin código", 1));

        assert!(matches!(
            PriceCatalog::from_sections(sections),
            Err(CatalogError::EmptyCode(_))
        ));
    }

    #[test]
    fn test_serializes_with_dataset_field_names() {
        let catalog = PriceCatalog::from_sections(sample_sections()).unwrap();
        let json = serde_json::to_value(&catalog).unwrap();

        assert_eq!(json["01_diagnostico"][0]["codigo"], "D0120");
        assert_eq!(json["01_diagnostico"][0]["servicio"], "Examen");
        assert_eq!(json["01_diagnostico"][0]["monto_crc"], 15000);
    }

    #[test]
    fn test_section_title() {
        assert_eq!(section_title("01_diagnostico"), "diagnostico");
        assert_eq!(section_title("3_cirugia_oral"), "cirugia oral");
        assert_eq!(section_title("ortodoncia"), "ortodoncia");
        assert_eq!(section_title("2025"), "2025");
    }
}
