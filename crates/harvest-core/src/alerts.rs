//! # Alert Evaluator
//!
//! Scans the ledgers for conditions that need attention.
//!
//! | Condition                                   | Kind      | Severity |
//! |---------------------------------------------|-----------|----------|
//! | raw item `quantity < reorderLevel`          | Inventory | High     |
//! | packaged category `units < reorder level`   | Inventory | High     |
//! | current-month revenue `<` monthly minimum   | Financial | Medium   |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::finance::current_month_revenue;
use crate::money::Money;
use crate::packaged::PackagedInventory;
use crate::raw_inventory::RawInventory;
use crate::types::Order;

/// Monthly revenue below which a financial alert fires (10,000.00).
pub const DEFAULT_MINIMUM_MONTHLY_REVENUE: Money = Money::from_cents(1_000_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AlertKind {
    Inventory,
    Financial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

pub fn evaluate(
    raw: &RawInventory,
    packaged: &PackagedInventory,
    orders: &[Order],
    today: NaiveDate,
    minimum_monthly_revenue: Money,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = raw
        .low_stock_items()
        .into_iter()
        .map(|item| Alert {
            kind: AlertKind::Inventory,
            severity: Severity::High,
            message: format!(
                "Low stock alert: {} ({} kg remaining)",
                item.category, item.quantity
            ),
        })
        .collect();

    alerts.extend(packaged.low_stock().into_iter().map(|item| Alert {
        kind: AlertKind::Inventory,
        severity: Severity::High,
        message: format!(
            "Low packaged stock: {} ({} of {} units)",
            item.category,
            item.units,
            packaged.reorder_level(&item.category)
        ),
    }));

    if current_month_revenue(orders, today) < minimum_monthly_revenue {
        alerts.push(Alert {
            kind: AlertKind::Financial,
            severity: Severity::Medium,
            message: "Revenue below expected threshold for current period".to_string(),
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::OrderStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn stocked_packaged() -> PackagedInventory {
        let catalog = Catalog::seeded();
        let mut packaged = PackagedInventory::default();
        packaged.align(&catalog);
        for category in catalog.names() {
            packaged.credit(category, 50, 10.0).unwrap();
        }
        packaged
    }

    fn big_order() -> Order {
        Order {
            order_id: "O1".to_string(),
            customer_name: "Jane".to_string(),
            customer_contact: "0722000111".to_string(),
            category: "Bulk Pack (5kg)".to_string(),
            quantity: 100,
            total_price: Money::from_cents(1_200_000),
            status: OrderStatus::Pending,
            date: today(),
        }
    }

    #[test]
    fn test_quiet_when_healthy() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 500.0).unwrap();

        let alerts = evaluate(
            &raw,
            &stocked_packaged(),
            &[big_order()],
            today(),
            DEFAULT_MINIMUM_MONTHLY_REVENUE,
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_raw_and_packaged_low_stock() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 4.0).unwrap();
        let catalog = Catalog::seeded();
        let mut packaged = PackagedInventory::default();
        packaged.align(&catalog);

        let alerts = evaluate(&raw, &packaged, &[big_order()], today(), DEFAULT_MINIMUM_MONTHLY_REVENUE);
        assert_eq!(alerts.len(), 8);
        assert_eq!(alerts[0].message, "Low stock alert: Highlands (4 kg remaining)");
        assert!(alerts
            .iter()
            .all(|a| a.kind == AlertKind::Inventory && a.severity == Severity::High));
    }

    #[test]
    fn test_revenue_below_minimum() {
        let alerts = evaluate(
            &RawInventory::default(),
            &stocked_packaged(),
            &[],
            today(),
            DEFAULT_MINIMUM_MONTHLY_REVENUE,
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Financial);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }
}
