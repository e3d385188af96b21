//! # Packaging Operation
//!
//! Converts raw kilograms into packaged units of a catalog category.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  package(raw = "Highlands", packaged = "Large (500g)", kg = 12.3)       │
//! │       │                                                                 │
//! │       ├── kg > 0, raw item exists, category in catalog?   (batch)       │
//! │       ├── raw stock ≥ kg?                     (InsufficientStock)       │
//! │       ├── unit weight = 0.5 kg                                          │
//! │       ├── units = floor(12.3 / 0.5) = 24      (≥ 1 or rejected)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  raw.debit("Highlands", 12.3)                                           │
//! │  packaged.credit("Large (500g)", 24 units, 24 × 0.5 = 12.0 kg)          │
//! │                                                                         │
//! │  The 0.3 kg remainder is consumed: the raw ledger is debited the full   │
//! │  requested quantity.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Varies` category treats the whole quantity as one unit.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError, ValidationErrors};
use crate::packaged::PackagedInventory;
use crate::raw_inventory::RawInventory;
use crate::validation::validate_positive_number;

/// Packaging form input.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PackagingRequest {
    pub raw_category: String,
    pub packaged_category: String,
    pub quantity_kg: Option<f64>,
}

/// Outcome of a packaging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PackagingReceipt {
    pub raw_category: String,
    pub packaged_category: String,
    /// Kilograms taken from raw stock.
    pub raw_kg_used: f64,
    pub units_produced: i64,
    pub unit_weight_kg: f64,
    /// Kilograms credited to packaged stock (`units × unit weight`).
    pub packaged_kg: f64,
}

/// Runs one packaging conversion.
///
/// Nothing is mutated unless every check passes.
pub fn package(
    raw: &mut RawInventory,
    packaged: &mut PackagedInventory,
    catalog: &Catalog,
    request: &PackagingRequest,
) -> CoreResult<PackagingReceipt> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_positive_number("Quantity", request.quantity_kg));

    if raw.get(&request.raw_category).is_none() {
        errors.push(ValidationError::UnknownCategory {
            field: "Raw category".to_string(),
            category: request.raw_category.clone(),
        });
    }

    let pricing = catalog.get(&request.packaged_category);
    if pricing.is_none() {
        errors.push(ValidationError::UnknownCategory {
            field: "Packaged category".to_string(),
            category: request.packaged_category.clone(),
        });
    }
    errors.into_result()?;

    let quantity_kg = request.quantity_kg.unwrap_or_default();
    let available = raw.quantity(&request.raw_category);
    if available < quantity_kg {
        return Err(CoreError::InsufficientStock {
            category: request.raw_category.clone(),
            available,
            requested: quantity_kg,
        });
    }

    let unit_weight_kg = pricing
        .and_then(|p| p.weight_info.unit_weight_kg())
        .unwrap_or(quantity_kg);

    let units_produced = if unit_weight_kg > 0.0 {
        (quantity_kg / unit_weight_kg).floor() as i64
    } else {
        0
    };
    if units_produced <= 0 {
        return Err(ValidationError::BelowOneUnit {
            category: request.packaged_category.clone(),
            quantity: quantity_kg,
        }
        .into());
    }

    let packaged_kg = units_produced as f64 * unit_weight_kg;
    raw.debit(&request.raw_category, quantity_kg)?;
    packaged.credit(&request.packaged_category, units_produced, packaged_kg)?;

    info!(
        raw_category = %request.raw_category,
        packaged_category = %request.packaged_category,
        quantity_kg,
        units_produced,
        "Packaging run completed"
    );

    Ok(PackagingReceipt {
        raw_category: request.raw_category.clone(),
        packaged_category: request.packaged_category.clone(),
        raw_kg_used: quantity_kg,
        units_produced,
        unit_weight_kg,
        packaged_kg,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(raw_kg: f64) -> (RawInventory, PackagedInventory, Catalog) {
        let catalog = Catalog::seeded();
        let mut packaged = PackagedInventory::default();
        packaged.align(&catalog);
        let mut raw = RawInventory::default();
        raw.credit("Highlands", raw_kg).unwrap();
        (raw, packaged, catalog)
    }

    fn request(packaged: &str, kg: f64) -> PackagingRequest {
        PackagingRequest {
            raw_category: "Highlands".to_string(),
            packaged_category: packaged.to_string(),
            quantity_kg: Some(kg),
        }
    }

    #[test]
    fn test_package_fixed_weight() {
        let (mut raw, mut packaged, catalog) = setup(50.0);

        let receipt = package(&mut raw, &mut packaged, &catalog, &request("Large (500g)", 10.0))
            .unwrap();
        assert_eq!(receipt.units_produced, 20);
        assert_eq!(receipt.packaged_kg, 10.0);
        assert_eq!(raw.quantity("Highlands"), 40.0);
        assert_eq!(packaged.units("Large (500g)"), 20);
    }

    #[test]
    fn test_package_remainder_is_consumed() {
        let (mut raw, mut packaged, catalog) = setup(10.0);

        let receipt = package(&mut raw, &mut packaged, &catalog, &request("Bulk Pack (5kg)", 7.0))
            .unwrap();
        assert_eq!(receipt.units_produced, 1);
        assert_eq!(receipt.packaged_kg, 5.0);
        assert_eq!(raw.quantity("Highlands"), 3.0);
        assert_eq!(packaged.get("Bulk Pack (5kg)").unwrap().total_kg, 5.0);
    }

    #[test]
    fn test_package_varies_makes_one_unit() {
        let (mut raw, mut packaged, catalog) = setup(10.0);

        let receipt = package(&mut raw, &mut packaged, &catalog, &request("Premium (custom)", 3.7))
            .unwrap();
        assert_eq!(receipt.units_produced, 1);
        assert_eq!(receipt.unit_weight_kg, 3.7);
        assert_eq!(packaged.get("Premium (custom)").unwrap().total_kg, 3.7);
    }

    #[test]
    fn test_package_below_one_unit() {
        let (mut raw, mut packaged, catalog) = setup(10.0);

        let err = package(&mut raw, &mut packaged, &catalog, &request("Bulk Pack (5kg)", 4.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(raw.quantity("Highlands"), 10.0);
        assert_eq!(packaged.units("Bulk Pack (5kg)"), 0);
    }

    #[test]
    fn test_package_insufficient_raw() {
        let (mut raw, mut packaged, catalog) = setup(2.0);

        let err = package(&mut raw, &mut packaged, &catalog, &request("Small (100g)", 3.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(raw.quantity("Highlands"), 2.0);
    }

    #[test]
    fn test_package_batches_validation() {
        let (mut raw, mut packaged, catalog) = setup(2.0);
        let bad = PackagingRequest {
            raw_category: "Nowhere".to_string(),
            packaged_category: "Tonne Bag".to_string(),
            quantity_kg: Some(0.0),
        };

        let err = package(&mut raw, &mut packaged, &catalog, &bad).unwrap_err();
        assert_eq!(err.validation_errors().unwrap().len(), 3);
    }
}
