//! # Inventory Commands
//!
//! Raw stock (kilograms per region), packaged stock (units per catalog
//! category) and the packaging run that converts one into the other.
//!
//! ## Packaging Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  package { rawCategory: "North", packagedCategory: "Medium (250g)",     │
//! │            quantityKg: 10 }                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  units = floor(10 / 0.25) = 40          (Varies tier: 1 unit)           │
//! │         │                                                               │
//! │         ├──► raw["North"]          -= 10 kg                             │
//! │         └──► packaged["Medium"]    += 40 units, 10 kg                   │
//! │                                                                         │
//! │  Short raw stock or < 1 unit: nothing changes                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use harvest_core::packaging::{PackagingReceipt, PackagingRequest};
use harvest_core::raw_inventory::RawItemInput;
use harvest_core::{Clock, KeyValueStore, RawInventoryItem, Upsert};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

use super::farmers::UpsertResponse;

/// Packaged stock row with its reorder threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagedStockDto {
    pub category: String,
    pub units: i64,
    pub total_kg: f64,
    pub reorder_level: i64,
    pub low_stock: bool,
}

pub async fn upsert_raw_item<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    input: RawItemInput,
) -> Result<UpsertResponse<RawInventoryItem>, ApiError> {
    debug!(item_id = %input.item_id, category = %input.category, "upsert_raw_item command");

    let mut tracker = state.lock().await;
    let item_id = input.item_id.clone();
    let outcome: Upsert = tracker.upsert_raw_item(input)?;

    let record = tracker
        .snapshot()
        .raw
        .get_by_id(&item_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Inventory item", &item_id))?;

    Ok(UpsertResponse { outcome, record })
}

pub async fn remove_raw_item<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    item_id: String,
) -> Result<RawInventoryItem, ApiError> {
    debug!(item_id = %item_id, "remove_raw_item command");
    let removed = state.with_tracker_mut(|t| t.remove_raw_item(&item_id)).await?;
    Ok(removed)
}

pub async fn list_raw_inventory<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<RawInventoryItem>, ApiError> {
    Ok(state.with_tracker(|t| t.raw_inventory().to_vec()).await)
}

/// Packaged stock in catalog order.
pub async fn list_packaged_inventory<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<PackagedStockDto>, ApiError> {
    let rows = state
        .with_tracker(|t| {
            let packaged = &t.snapshot().packaged;
            packaged
                .records()
                .iter()
                .map(|item| PackagedStockDto {
                    category: item.category.clone(),
                    units: item.units,
                    total_kg: item.total_kg,
                    reorder_level: packaged.reorder_level(&item.category),
                    low_stock: packaged.is_low_stock(&item.category),
                })
                .collect()
        })
        .await;
    Ok(rows)
}

/// `level: None` resets the category to the default reorder level.
pub async fn set_packaged_reorder_level<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    category: String,
    level: Option<i64>,
) -> Result<PackagedStockDto, ApiError> {
    debug!(category = %category, ?level, "set_packaged_reorder_level command");
    state
        .with_tracker_mut(|t| t.set_packaged_reorder_level(&category, level))
        .await?;

    list_packaged_inventory(state)
        .await?
        .into_iter()
        .find(|row| row.category == category)
        .ok_or_else(|| ApiError::not_found("Category", &category))
}

pub async fn package<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    request: PackagingRequest,
) -> Result<PackagingReceipt, ApiError> {
    debug!(
        raw = %request.raw_category,
        packaged = %request.packaged_category,
        kg = ?request.quantity_kg,
        "package command"
    );

    let receipt = state.with_tracker_mut(|t| t.package(request)).await?;

    info!(
        raw = %receipt.raw_category,
        packaged = %receipt.packaged_category,
        units = receipt.units_produced,
        "Packaging run complete"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::farmers::{tests::farmer, upsert_farmer};
    use crate::commands::purchases::{record_purchase, tests::purchase};
    use crate::commands::test_support::{state, today, TestState};
    use crate::error::ErrorCode;

    async fn stocked_state(kg: f64) -> TestState {
        let state = state();
        upsert_farmer(&state, farmer("F1", "Grace", "North")).await.unwrap();
        record_purchase(&state, purchase("P1", "F1", kg, 200)).await.unwrap();
        state
    }

    fn request(raw: &str, packaged: &str, kg: f64) -> PackagingRequest {
        PackagingRequest {
            raw_category: raw.to_string(),
            packaged_category: packaged.to_string(),
            quantity_kg: Some(kg),
        }
    }

    #[tokio::test]
    async fn test_package_moves_stock() {
        let state = stocked_state(30.0).await;

        let receipt = package(&state, request("North", "Medium (250g)", 10.0)).await.unwrap();
        assert_eq!(receipt.units_produced, 40);

        let raw = list_raw_inventory(&state).await.unwrap();
        let north = raw.iter().find(|i| i.category == "North").unwrap();
        assert_eq!(north.quantity, 20.0);

        let packaged = list_packaged_inventory(&state).await.unwrap();
        let medium = packaged.iter().find(|p| p.category == "Medium (250g)").unwrap();
        assert_eq!(medium.units, 40);
        assert!(!medium.low_stock);
    }

    #[tokio::test]
    async fn test_package_short_raw_stock_changes_nothing() {
        let state = stocked_state(5.0).await;

        let err = package(&state, request("North", "Small (100g)", 8.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let raw = list_raw_inventory(&state).await.unwrap();
        assert_eq!(raw.iter().find(|i| i.category == "North").unwrap().quantity, 5.0);
    }

    #[tokio::test]
    async fn test_reorder_level_controls_low_stock_flag() {
        let state = state();

        let row = set_packaged_reorder_level(&state, "Large (500g)".to_string(), Some(0))
            .await;
        // zero is not a positive unit count
        assert!(row.is_err());

        let row = set_packaged_reorder_level(&state, "Large (500g)".to_string(), Some(1))
            .await
            .unwrap();
        assert_eq!(row.reorder_level, 1);
        assert!(row.low_stock);
    }

    #[tokio::test]
    async fn test_raw_item_upsert_and_remove() {
        let state = state();
        let input = RawItemInput {
            item_id: "R1".to_string(),
            category: "Cold Room".to_string(),
            quantity: Some(12.5),
            reorder_level: Some(5.0),
            restock_date: Some(today()),
            storage_location: "Shed B".to_string(),
        };

        let saved = upsert_raw_item(&state, input).await.unwrap();
        assert_eq!(saved.outcome, Upsert::Created);
        assert_eq!(saved.record.quantity, 12.5);

        remove_raw_item(&state, "R1".to_string()).await.unwrap();
        assert!(list_raw_inventory(&state).await.unwrap().is_empty());
    }
}
