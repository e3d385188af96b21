//! # Order Ledger
//!
//! Customer orders for packaged units. Placing an order prices it from the
//! catalog and debits packaged stock. Deleting an order does NOT return the
//! units to stock: a deleted order is treated as a record correction, not a
//! cancellation.
//!
//! ## Order Lifecycle
//! ```text
//! place() ──► Pending ──► Processed ──► Shipped ──► Delivered
//!                  (update_status may jump to any value)
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::money::Money;
use crate::packaged::PackagedInventory;
use crate::types::{Order, OrderStatus};
use crate::validation::{
    validate_alphanumeric_id, validate_letters_and_spaces, validate_not_future, validate_phone,
    validate_positive_units, validate_required,
};

/// Order form input.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderInput {
    pub order_id: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub category: String,
    pub quantity: Option<i64>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
}

/// Revenue totals over every order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevenueSummary {
    pub total_revenue: Money,
    pub revenue_by_category: BTreeMap<String, Money>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
}

impl OrderLedger {
    pub fn from_records(orders: Vec<Order>) -> Self {
        OrderLedger { orders }
    }

    pub fn records(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Validates, prices and records an order, debiting packaged stock.
    ///
    /// ## Check Order
    /// 1. field batch (ids, name, contact, category, quantity, date)
    /// 2. duplicate order id, category present in the catalog
    /// 3. enough packaged units
    pub fn place(
        &mut self,
        input: OrderInput,
        catalog: &Catalog,
        packaged: &mut PackagedInventory,
        today: NaiveDate,
    ) -> CoreResult<Order> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_alphanumeric_id("Order ID", &input.order_id));
        errors.check(validate_letters_and_spaces("Customer name", &input.customer_name));
        errors.check(validate_phone("Customer contact", &input.customer_contact));
        errors.check(validate_required("Category", &input.category));
        errors.check(validate_positive_units("Quantity", input.quantity));
        errors.check(validate_not_future("Date", input.date, today));
        errors.into_result()?;

        if self.get(&input.order_id).is_some() {
            return Err(CoreError::duplicate("Order", &input.order_id));
        }
        let pricing = catalog
            .get(&input.category)
            .ok_or_else(|| CoreError::not_found("Category", &input.category))?;

        let quantity = input.quantity.unwrap_or_default();
        let available = packaged.units(&input.category);
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                category: input.category.clone(),
                available: available as f64,
                requested: quantity as f64,
            });
        }

        let order = Order {
            total_price: pricing.price.multiply_quantity(quantity),
            order_id: input.order_id,
            customer_name: input.customer_name.trim().to_string(),
            customer_contact: input.customer_contact,
            category: input.category,
            quantity,
            status: OrderStatus::Pending,
            date: input.date.unwrap_or_default(),
        };

        packaged.debit(&order.category, quantity, catalog)?;
        self.orders.push(order.clone());

        debug!(
            order_id = %order.order_id,
            category = %order.category,
            units = quantity,
            total = %order.total_price,
            "Order placed"
        );
        Ok(order)
    }

    /// Changes only the status of an order.
    pub fn update_status(&mut self, order_id: &str, status: &str) -> CoreResult<Order> {
        let status: OrderStatus = status.parse()?;
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        order.status = status;
        debug!(order_id = %order_id, status = %status, "Order status updated");
        Ok(order.clone())
    }

    /// Deletes an order. Packaged stock is not restored.
    pub fn remove(&mut self, order_id: &str) -> CoreResult<Order> {
        let index = self
            .orders
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        debug!(order_id = %order_id, "Order removed");
        Ok(self.orders.remove(index))
    }

    /// Orders with the given status, or all orders for `None`.
    pub fn filter_by_status(&self, status: Option<OrderStatus>) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .collect()
    }

    pub fn revenue_summary(&self) -> RevenueSummary {
        let mut summary = RevenueSummary::default();
        for order in &self.orders {
            summary.total_revenue += order.total_price;
            *summary
                .revenue_by_category
                .entry(order.category.clone())
                .or_default() += order.total_price;
        }
        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn stocked() -> (Catalog, PackagedInventory) {
        let catalog = Catalog::seeded();
        let mut packaged = PackagedInventory::default();
        packaged.align(&catalog);
        packaged.credit("Large (500g)", 10, 5.0).unwrap();
        (catalog, packaged)
    }

    fn input(id: &str, category: &str, quantity: i64) -> OrderInput {
        OrderInput {
            order_id: id.to_string(),
            customer_name: "Jane Doe".to_string(),
            customer_contact: "0722000111".to_string(),
            category: category.to_string(),
            quantity: Some(quantity),
            date: Some(today()),
        }
    }

    #[test]
    fn test_place_prices_and_debits() {
        let (catalog, mut packaged) = stocked();
        let mut ledger = OrderLedger::default();

        let order = ledger
            .place(input("O1", "Large (500g)", 4), &catalog, &mut packaged, today())
            .unwrap();

        assert_eq!(order.total_price.cents(), 7_200);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(packaged.units("Large (500g)"), 6);
    }

    #[test]
    fn test_place_insufficient_stock() {
        let (catalog, mut packaged) = stocked();
        let mut ledger = OrderLedger::default();

        let err = ledger
            .place(input("O1", "Large (500g)", 11), &catalog, &mut packaged, today())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(packaged.units("Large (500g)"), 10);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_place_rejects_duplicates_and_unknown_category() {
        let (catalog, mut packaged) = stocked();
        let mut ledger = OrderLedger::default();
        ledger
            .place(input("O1", "Large (500g)", 1), &catalog, &mut packaged, today())
            .unwrap();

        assert!(matches!(
            ledger.place(input("O1", "Large (500g)", 1), &catalog, &mut packaged, today()),
            Err(CoreError::DuplicateKey { .. })
        ));
        assert!(matches!(
            ledger.place(input("O2", "Tonne Bag", 1), &catalog, &mut packaged, today()),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_place_batches_field_errors() {
        let (catalog, mut packaged) = stocked();
        let mut ledger = OrderLedger::default();
        let bad = OrderInput {
            order_id: String::new(),
            customer_name: "R2D2".to_string(),
            customer_contact: "call me".to_string(),
            category: String::new(),
            quantity: Some(0),
            date: None,
        };

        let err = ledger.place(bad, &catalog, &mut packaged, today()).unwrap_err();
        assert_eq!(err.validation_errors().unwrap().len(), 6);
    }

    #[test]
    fn test_status_and_removal() {
        let (catalog, mut packaged) = stocked();
        let mut ledger = OrderLedger::default();
        ledger
            .place(input("O1", "Large (500g)", 2), &catalog, &mut packaged, today())
            .unwrap();

        let order = ledger.update_status("O1", "Shipped").unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(matches!(
            ledger.update_status("O1", "Lost"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            ledger.update_status("O9", "Pending"),
            Err(CoreError::NotFound { .. })
        ));

        assert_eq!(ledger.filter_by_status(Some(OrderStatus::Shipped)).len(), 1);
        assert!(ledger.filter_by_status(Some(OrderStatus::Pending)).is_empty());

        ledger.remove("O1").unwrap();
        assert_eq!(packaged.units("Large (500g)"), 8);
    }

    #[test]
    fn test_revenue_summary() {
        let (catalog, mut packaged) = stocked();
        packaged.credit("Small (100g)", 10, 1.0).unwrap();
        let mut ledger = OrderLedger::default();
        ledger
            .place(input("O1", "Large (500g)", 2), &catalog, &mut packaged, today())
            .unwrap();
        ledger
            .place(input("O2", "Small (100g)", 3), &catalog, &mut packaged, today())
            .unwrap();
        ledger
            .place(input("O3", "Large (500g)", 1), &catalog, &mut packaged, today())
            .unwrap();

        let summary = ledger.revenue_summary();
        assert_eq!(summary.total_revenue.cents(), 3 * 1_800 + 3 * 500);
        assert_eq!(summary.revenue_by_category["Large (500g)"].cents(), 5_400);
        assert_eq!(summary.revenue_by_category["Small (100g)"].cents(), 1_500);
    }
}
