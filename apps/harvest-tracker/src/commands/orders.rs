//! # Order Commands
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order ──► price = catalog price × units                         │
//! │       │          packaged[category] -= units                            │
//! │       ▼                                                                 │
//! │   Pending ──► Processed ──► Shipped ──► Delivered                       │
//! │       (update_order_status accepts any of the four, any order)          │
//! │                                                                         │
//! │  remove_order ──► record gone, packaged units are NOT restored          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::str::FromStr;

use harvest_core::orders::{OrderInput, RevenueSummary};
use harvest_core::{Clock, CoreError, KeyValueStore, Order, OrderStatus};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

pub async fn place_order<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    input: OrderInput,
) -> Result<Order, ApiError> {
    debug!(
        order_id = %input.order_id,
        category = %input.category,
        quantity = ?input.quantity,
        "place_order command"
    );

    let order = state.with_tracker_mut(|t| t.place_order(input)).await?;

    info!(
        order_id = %order.order_id,
        units = order.quantity,
        total = %order.total_price,
        "Order placed"
    );
    Ok(order)
}

pub async fn update_order_status<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    order_id: String,
    status: String,
) -> Result<Order, ApiError> {
    debug!(order_id = %order_id, status = %status, "update_order_status command");
    let order = state
        .with_tracker_mut(|t| t.update_order_status(&order_id, &status))
        .await?;
    Ok(order)
}

/// Deletes an order without returning its units to packaged stock.
pub async fn remove_order<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    order_id: String,
) -> Result<Order, ApiError> {
    debug!(order_id = %order_id, "remove_order command");
    let order = state.with_tracker_mut(|t| t.remove_order(&order_id)).await?;
    Ok(order)
}

/// Orders in ledger order, optionally filtered by status name.
pub async fn list_orders<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    status: Option<String>,
) -> Result<Vec<Order>, ApiError> {
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(|s| OrderStatus::from_str(&s))
        .transpose()
        .map_err(CoreError::from)?;

    let orders = state
        .with_tracker(|t| t.orders_by_status(status).into_iter().cloned().collect())
        .await;
    Ok(orders)
}

pub async fn revenue_summary<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<RevenueSummary, ApiError> {
    Ok(state.with_tracker(|t| t.revenue_summary()).await)
}
