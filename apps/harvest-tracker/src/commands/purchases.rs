//! # Purchase Commands
//!
//! Every purchase moves raw stock for the farmer's region:
//!
//! ```text
//! record_purchase  ──► raw[region] += quantity
//! update_purchase  ──► raw[old region] -= old, raw[new region] += new
//! remove_purchase  ──► raw[region] -= quantity (floored at zero)
//! ```

use chrono::NaiveDate;
use harvest_core::purchases::PurchaseInput;
use harvest_core::{Clock, KeyValueStore, Money, Purchase};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesResponse {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub total_expenses: Money,
}

pub async fn record_purchase<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    input: PurchaseInput,
) -> Result<Purchase, ApiError> {
    debug!(purchase_id = %input.purchase_id, farmer_id = %input.farmer_id, "record_purchase command");

    let purchase = state.with_tracker_mut(|t| t.record_purchase(input)).await?;

    info!(
        purchase_id = %purchase.purchase_id,
        quantity = purchase.quantity,
        total = %purchase.total_cost,
        "Purchase recorded"
    );
    Ok(purchase)
}

pub async fn update_purchase<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    input: PurchaseInput,
) -> Result<Purchase, ApiError> {
    debug!(purchase_id = %input.purchase_id, "update_purchase command");
    let purchase = state.with_tracker_mut(|t| t.update_purchase(input)).await?;
    Ok(purchase)
}

pub async fn remove_purchase<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    purchase_id: String,
) -> Result<Purchase, ApiError> {
    debug!(purchase_id = %purchase_id, "remove_purchase command");
    let purchase = state
        .with_tracker_mut(|t| t.remove_purchase(&purchase_id))
        .await?;
    Ok(purchase)
}

pub async fn list_purchases<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<Purchase>, ApiError> {
    Ok(state.with_tracker(|t| t.purchases().to_vec()).await)
}

/// Sum of purchase costs dated within `[start, end]`; open bounds allowed.
pub async fn expenses_for_period<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ExpensesResponse, ApiError> {
    let total_expenses = state
        .with_tracker(|t| t.expenses_for_period(start, end))
        .await;
    Ok(ExpensesResponse {
        start,
        end,
        total_expenses,
    })
}
