//! # Catalog Commands
//!
//! Packaging tiers. Adding or removing a tier keeps the packaged ledger
//! aligned: a new tier starts at zero units, a removed tier's stock row
//! goes with it.

use harvest_core::catalog::CategoryInput;
use harvest_core::{CategoryPricing, Clock, KeyValueStore};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

use super::farmers::UpsertResponse;

pub async fn list_categories<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<CategoryPricing>, ApiError> {
    Ok(state
        .with_tracker(|t| t.snapshot().catalog.records().to_vec())
        .await)
}

/// `weightInfo` is a label such as `"0.25 kg"` or `"Varies"`.
pub async fn upsert_category<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    input: CategoryInput,
) -> Result<UpsertResponse<CategoryPricing>, ApiError> {
    debug!(category = %input.category, weight = %input.weight_info, "upsert_category command");

    let (outcome, record) = state.with_tracker_mut(|t| t.upsert_category(input)).await?;

    info!(category = %record.category, ?outcome, price = %record.price, "Category saved");
    Ok(UpsertResponse { outcome, record })
}

pub async fn remove_category<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    category: String,
) -> Result<CategoryPricing, ApiError> {
    debug!(category = %category, "remove_category command");
    let removed = state
        .with_tracker_mut(|t| t.remove_category(&category))
        .await?;
    Ok(removed)
}
