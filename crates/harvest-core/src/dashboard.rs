//! # Dashboard
//!
//! Headline numbers and the recent-activity feed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::store::Snapshot;
use crate::types::{Order, OrderStatus};

/// Number of orders shown in the activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_revenue: Money,
    /// Orders still `Pending`.
    pub active_orders: usize,
    /// Raw items below their reorder level.
    pub low_stock_items: usize,
    pub suppliers: usize,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let orders = snapshot.orders.records();
        DashboardStats {
            total_revenue: orders.iter().map(|o| o.total_price).sum(),
            active_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
            low_stock_items: snapshot.raw.low_stock_items().len(),
            suppliers: snapshot.farmers.len(),
        }
    }
}

/// The last orders in the ledger, newest first.
pub fn recent_activity(orders: &[Order]) -> Vec<&Order> {
    orders.iter().rev().take(RECENT_ACTIVITY_LIMIT).collect()
}
