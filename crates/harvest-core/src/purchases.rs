//! # Purchase Ledger
//!
//! Raw produce bought from farmers. Every change to a purchase moves raw
//! inventory for the farmer's region by the same amount, so over a
//! purchase's whole life (create, edits, delete) the net raw change is zero
//! unless clamping at zero intervened.
//!
//! ## Edit Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored:  P1  farmer F1 (Highlands)  40 kg                             │
//! │  edit:    P1  farmer F2 (Valley)     25 kg                             │
//! │                                                                         │
//! │  raw.adjust("Highlands", −40)   ◄── reverse the old effect             │
//! │  raw.adjust("Valley",    +25)   ◄── apply the new one                  │
//! │  total_cost recomputed from the new price and quantity                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::farmers::FarmerRegistry;
use crate::finance::in_period;
use crate::money::Money;
use crate::raw_inventory::RawInventory;
use crate::types::Purchase;
use crate::validation::{
    validate_alphanumeric_id, validate_not_future, validate_positive_number, validate_price,
    validate_required,
};

/// Purchase form input.
///
/// Optional fields model form values that were empty or did not parse.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseInput {
    pub purchase_id: String,
    pub farmer_id: String,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub quantity: Option<f64>,
    pub price_per_kg: Option<Money>,
}

impl PurchaseInput {
    fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_alphanumeric_id("Purchase ID", &self.purchase_id));
        errors.check(validate_required("Farmer ID", &self.farmer_id));
        errors.check(validate_not_future("Date", self.date, today));
        errors.check(validate_positive_number("Quantity", self.quantity));
        errors.check(validate_price("Price per kg", self.price_per_kg));
        errors.into_result()
    }

    /// Builds the record once validation has passed.
    fn into_purchase(self) -> Purchase {
        let quantity = self.quantity.unwrap_or_default();
        let price_per_kg = self.price_per_kg.unwrap_or_default();
        Purchase {
            purchase_id: self.purchase_id,
            farmer_id: self.farmer_id,
            date: self.date.unwrap_or_default(),
            quantity,
            price_per_kg,
            total_cost: price_per_kg.multiply_fractional(quantity),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseLedger {
    purchases: Vec<Purchase>,
}

impl PurchaseLedger {
    pub fn from_records(purchases: Vec<Purchase>) -> Self {
        PurchaseLedger { purchases }
    }

    pub fn records(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    pub fn get(&self, purchase_id: &str) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.purchase_id == purchase_id)
    }

    /// Records a new purchase and credits the farmer's region.
    pub fn record(
        &mut self,
        input: PurchaseInput,
        farmers: &FarmerRegistry,
        raw: &mut RawInventory,
        today: NaiveDate,
    ) -> CoreResult<Purchase> {
        input.validate(today)?;

        if self.get(&input.purchase_id).is_some() {
            return Err(CoreError::duplicate("Purchase", &input.purchase_id));
        }
        let region = farmers
            .get(&input.farmer_id)
            .map(|f| f.region.clone())
            .ok_or_else(|| CoreError::not_found("Farmer", &input.farmer_id))?;

        let purchase = input.into_purchase();
        raw.credit(&region, purchase.quantity)?;
        self.purchases.push(purchase.clone());

        debug!(
            purchase_id = %purchase.purchase_id,
            region = %region,
            kg = purchase.quantity,
            total = %purchase.total_cost,
            "Purchase recorded"
        );
        Ok(purchase)
    }

    /// Replaces a stored purchase, moving raw stock from the old region
    /// to the new one.
    pub fn update(
        &mut self,
        input: PurchaseInput,
        farmers: &FarmerRegistry,
        raw: &mut RawInventory,
        today: NaiveDate,
    ) -> CoreResult<Purchase> {
        input.validate(today)?;
        let index = self
            .purchases
            .iter()
            .position(|p| p.purchase_id == input.purchase_id)
            .ok_or_else(|| CoreError::not_found("Purchase", &input.purchase_id))?;

        let old = &self.purchases[index];
        let old_region = farmers
            .get(&old.farmer_id)
            .map(|f| f.region.clone())
            .ok_or_else(|| CoreError::not_found("Farmer", &old.farmer_id))?;
        let new_region = farmers
            .get(&input.farmer_id)
            .map(|f| f.region.clone())
            .ok_or_else(|| CoreError::not_found("Farmer", &input.farmer_id))?;

        let old_quantity = old.quantity;
        let updated = input.into_purchase();

        raw.adjust(&old_region, -old_quantity);
        raw.adjust(&new_region, updated.quantity);
        self.purchases[index] = updated.clone();

        debug!(
            purchase_id = %updated.purchase_id,
            old_region = %old_region,
            new_region = %new_region,
            old_kg = old_quantity,
            new_kg = updated.quantity,
            "Purchase updated"
        );
        Ok(updated)
    }

    /// Deletes a purchase and takes its kilograms back out of raw stock.
    ///
    /// If the farmer has since been deleted the stock cannot be located and
    /// only the record is removed.
    pub fn remove(
        &mut self,
        purchase_id: &str,
        farmers: &FarmerRegistry,
        raw: &mut RawInventory,
    ) -> CoreResult<Purchase> {
        let index = self
            .purchases
            .iter()
            .position(|p| p.purchase_id == purchase_id)
            .ok_or_else(|| CoreError::not_found("Purchase", purchase_id))?;

        let purchase = self.purchases.remove(index);
        match farmers.get(&purchase.farmer_id) {
            Some(farmer) => raw.adjust(&farmer.region, -purchase.quantity),
            None => warn!(
                purchase_id = %purchase_id,
                farmer_id = %purchase.farmer_id,
                "Deleted purchase references an unknown farmer; raw stock left unchanged"
            ),
        }

        debug!(purchase_id = %purchase_id, "Purchase removed");
        Ok(purchase)
    }

    /// Sum of `total_cost` with date inside the inclusive bounds.
    pub fn expenses_for_period(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Money {
        self.purchases
            .iter()
            .filter(|p| in_period(p.date, start, end))
            .map(|p| p.total_cost)
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Farmer;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn registry() -> FarmerRegistry {
        let mut farmers = FarmerRegistry::default();
        for (id, region) in [("F1", "Highlands"), ("F2", "Valley")] {
            farmers
                .upsert(Farmer {
                    farmer_id: id.to_string(),
                    name: "Grower".to_string(),
                    phone: "0712345678".to_string(),
                    email: "grower@farm.co".to_string(),
                    address: "Box 1".to_string(),
                    region: region.to_string(),
                    gps: "0,0".to_string(),
                })
                .unwrap();
        }
        farmers
    }

    fn input(id: &str, farmer: &str, kg: f64, cents: i64, date: NaiveDate) -> PurchaseInput {
        PurchaseInput {
            purchase_id: id.to_string(),
            farmer_id: farmer.to_string(),
            date: Some(date),
            quantity: Some(kg),
            price_per_kg: Some(Money::from_cents(cents)),
        }
    }

    #[test]
    fn test_record_credits_region() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();

        let p = ledger
            .record(input("P1", "F1", 100.0, 200, day(10)), &farmers, &mut raw, day(15))
            .unwrap();
        assert_eq!(p.total_cost.cents(), 20_000);
        assert_eq!(raw.quantity("Highlands"), 100.0);
    }

    #[test]
    fn test_record_check_order() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();

        // field errors first, all of them
        let bad = PurchaseInput {
            purchase_id: "P 1".to_string(),
            farmer_id: String::new(),
            date: Some(day(20)),
            quantity: Some(0.0),
            price_per_kg: None,
        };
        let err = ledger.record(bad, &farmers, &mut raw, day(15)).unwrap_err();
        assert_eq!(err.validation_errors().unwrap().len(), 5);

        // then keys
        let err = ledger
            .record(input("P1", "F9", 1.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref entity, .. } if entity == "Farmer"));

        ledger
            .record(input("P1", "F1", 1.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();
        let err = ledger
            .record(input("P1", "F1", 1.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
        assert_eq!(raw.quantity("Highlands"), 1.0);
    }

    #[test]
    fn test_update_moves_stock_between_regions() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();
        ledger
            .record(input("P1", "F1", 40.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();

        let updated = ledger
            .update(input("P1", "F2", 25.0, 300, day(2)), &farmers, &mut raw, day(15))
            .unwrap();

        assert_eq!(updated.total_cost.cents(), 7_500);
        assert_eq!(raw.quantity("Highlands"), 0.0);
        assert_eq!(raw.quantity("Valley"), 25.0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_update_missing_purchase() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();

        let err = ledger
            .update(input("P9", "F1", 1.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));

        // field batch comes before the lookup
        let err = ledger
            .update(input("P9", "F1", 0.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert_eq!(err.validation_errors().unwrap().len(), 1);
    }

    #[test]
    fn test_update_to_unknown_farmer_changes_nothing() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();
        let original = ledger
            .record(input("P1", "F1", 40.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();

        let err = ledger
            .update(input("P1", "F9", 25.0, 300, day(2)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref entity, ref id } if entity == "Farmer" && id == "F9"));

        assert_eq!(ledger.get("P1"), Some(&original));
        assert_eq!(raw.quantity("Highlands"), 40.0);
        assert_eq!(raw.quantity("Valley"), 0.0);
    }

    #[test]
    fn test_update_after_original_farmer_removed_changes_nothing() {
        let mut farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();
        let original = ledger
            .record(input("P1", "F1", 40.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();
        farmers.remove("F1").unwrap();

        let err = ledger
            .update(input("P1", "F2", 25.0, 300, day(2)), &farmers, &mut raw, day(15))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref entity, ref id } if entity == "Farmer" && id == "F1"));

        assert_eq!(ledger.get("P1"), Some(&original));
        assert_eq!(raw.quantity("Highlands"), 40.0);
        assert_eq!(raw.quantity("Valley"), 0.0);
    }

    #[test]
    fn test_remove_clamps_raw_at_zero() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();
        ledger
            .record(input("P1", "F1", 40.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();
        raw.debit("Highlands", 30.0).unwrap();

        ledger.remove("P1", &farmers, &mut raw).unwrap();
        assert_eq!(raw.quantity("Highlands"), 0.0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_expenses_for_period() {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let mut ledger = PurchaseLedger::default();
        ledger
            .record(input("P1", "F1", 10.0, 100, day(1)), &farmers, &mut raw, day(15))
            .unwrap();
        ledger
            .record(input("P2", "F1", 10.0, 200, day(10)), &farmers, &mut raw, day(15))
            .unwrap();

        assert_eq!(ledger.expenses_for_period(None, None).cents(), 3_000);
        assert_eq!(ledger.expenses_for_period(Some(day(2)), None).cents(), 2_000);
        assert_eq!(ledger.expenses_for_period(None, Some(day(1))).cents(), 1_000);
        assert_eq!(
            ledger.expenses_for_period(Some(day(11)), Some(day(12))).cents(),
            0
        );
    }
}
