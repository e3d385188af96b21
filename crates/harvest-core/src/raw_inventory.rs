//! # Raw Inventory Ledger
//!
//! Unpackaged stock in kilograms, one item per category. Categories are
//! usually farmer regions: every purchase credits the region of its farmer.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record purchase ──► credit(region, kg)          strictly positive     │
//! │  edit purchase   ──► adjust(old, −old kg)                              │
//! │                      adjust(new, +new kg)        clamped at 0          │
//! │  delete purchase ──► adjust(region, −kg)         clamped at 0          │
//! │  packaging run   ──► debit(category, kg)         fails if short        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items created implicitly get a generated `RAW…` id, the default reorder
//! level and the main warehouse as location.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::types::{RawInventoryItem, Upsert};
use crate::validation::{
    validate_alphanumeric_id, validate_letters_and_spaces, validate_min_length,
    validate_non_negative_number, validate_not_past, validate_positive_number,
};
use crate::DEFAULT_STORAGE_LOCATION;

/// Length of the random suffix in generated item ids.
const GENERATED_ID_SUFFIX_LEN: usize = 9;

/// Manual inventory form input.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RawItemInput {
    pub item_id: String,
    pub category: String,
    pub quantity: Option<f64>,
    pub reorder_level: Option<f64>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub restock_date: Option<NaiveDate>,
    pub storage_location: String,
}

/// Raw stock ledger.
#[derive(Debug, Clone)]
pub struct RawInventory {
    items: Vec<RawInventoryItem>,
    default_reorder_level: f64,
}

impl RawInventory {
    pub fn new(default_reorder_level: f64) -> Self {
        RawInventory {
            items: Vec::new(),
            default_reorder_level,
        }
    }

    pub fn from_records(items: Vec<RawInventoryItem>, default_reorder_level: f64) -> Self {
        RawInventory {
            items,
            default_reorder_level,
        }
    }

    pub fn records(&self) -> &[RawInventoryItem] {
        &self.items
    }

    pub fn get(&self, category: &str) -> Option<&RawInventoryItem> {
        self.items.iter().find(|i| i.category == category)
    }

    pub fn get_by_id(&self, item_id: &str) -> Option<&RawInventoryItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Kilograms on hand for a category, 0 when it has no item.
    pub fn quantity(&self, category: &str) -> f64 {
        self.get(category).map_or(0.0, |i| i.quantity)
    }

    /// Distinct categories in ledger order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.category.as_str()) {
                seen.push(&item.category);
            }
        }
        seen
    }

    /// Items below their reorder level.
    pub fn low_stock_items(&self) -> Vec<&RawInventoryItem> {
        self.items.iter().filter(|i| i.is_low_stock()).collect()
    }

    pub fn total_quantity(&self) -> f64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    // =========================================================================
    // Stock Movements
    // =========================================================================

    /// Adds `kg` to a category, creating its item when missing.
    pub fn credit(&mut self, category: &str, kg: f64) -> CoreResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_positive_number("Quantity", Some(kg)));
        errors.into_result()?;

        match self.get_mut(category) {
            Some(item) => item.quantity += kg,
            None => {
                let item = self.new_item(category, kg);
                self.items.push(item);
            }
        }

        debug!(category = %category, kg, "Raw inventory credited");
        Ok(())
    }

    /// Removes `kg` from a category.
    ///
    /// Fails with `InsufficientStock` when the category is missing or holds
    /// less than `kg`; the ledger is unchanged in that case.
    pub fn debit(&mut self, category: &str, kg: f64) -> CoreResult<()> {
        let available = self.quantity(category);
        let item = match self.get_mut(category) {
            Some(item) if item.quantity >= kg => item,
            _ => {
                return Err(CoreError::InsufficientStock {
                    category: category.to_string(),
                    available,
                    requested: kg,
                })
            }
        };

        item.quantity -= kg;
        debug!(category = %category, kg, remaining = item.quantity, "Raw inventory debited");
        Ok(())
    }

    /// Applies a signed change, clamping the result at zero.
    ///
    /// A positive delta on a missing category creates the item; a
    /// non-positive one is ignored.
    pub fn adjust(&mut self, category: &str, delta: f64) {
        match self.get_mut(category) {
            Some(item) => item.quantity = (item.quantity + delta).max(0.0),
            None if delta > 0.0 => {
                let item = self.new_item(category, delta);
                self.items.push(item);
            }
            None => return,
        }
        debug!(category = %category, delta, "Raw inventory adjusted");
    }

    // =========================================================================
    // Item Management
    // =========================================================================

    /// Creates or updates an item from the manual inventory form.
    ///
    /// An existing `item_id` keeps its stored quantity: stock only moves
    /// through purchases and packaging.
    pub fn upsert_item(&mut self, input: RawItemInput, today: NaiveDate) -> CoreResult<Upsert> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_alphanumeric_id("Item ID", &input.item_id));
        errors.check(validate_letters_and_spaces("Category", &input.category));
        errors.check(validate_non_negative_number("Quantity", input.quantity));
        errors.check(validate_non_negative_number("Reorder level", input.reorder_level));
        errors.check(validate_not_past("Restock date", input.restock_date, today));
        errors.check(validate_min_length("Storage location", &input.storage_location, 3));
        errors.into_result()?;

        let category = input.category.trim().to_string();
        let reorder_level = input.reorder_level.unwrap_or(self.default_reorder_level);
        let storage_location = input.storage_location.trim().to_string();

        if let Some(existing) = self.items.iter_mut().find(|i| i.item_id == input.item_id) {
            existing.category = category;
            existing.reorder_level = reorder_level;
            existing.restock_date = input.restock_date;
            existing.storage_location = storage_location;
            debug!(item_id = %input.item_id, "Raw inventory item updated");
            return Ok(Upsert::Updated);
        }

        debug!(item_id = %input.item_id, category = %category, "Raw inventory item created");
        self.items.push(RawInventoryItem {
            item_id: input.item_id,
            category,
            quantity: input.quantity.unwrap_or_default(),
            reorder_level,
            restock_date: input.restock_date,
            storage_location,
        });
        Ok(Upsert::Created)
    }

    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<RawInventoryItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.item_id == item_id)
            .ok_or_else(|| CoreError::not_found("Inventory item", item_id))?;
        Ok(self.items.remove(index))
    }

    /// Adds an empty item for every category that has none.
    ///
    /// Returns how many items were created.
    pub fn ensure_categories<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for category in categories {
            if category.trim().is_empty() || self.get(category).is_some() {
                continue;
            }
            let item = self.new_item(category, 0.0);
            self.items.push(item);
            added += 1;
        }
        added
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn get_mut(&mut self, category: &str) -> Option<&mut RawInventoryItem> {
        self.items.iter_mut().find(|i| i.category == category)
    }

    fn new_item(&self, category: &str, quantity: f64) -> RawInventoryItem {
        RawInventoryItem {
            item_id: self.generate_item_id(),
            category: category.to_string(),
            quantity,
            reorder_level: self.default_reorder_level,
            restock_date: None,
            storage_location: DEFAULT_STORAGE_LOCATION.to_string(),
        }
    }

    /// `RAW` followed by nine uppercase alphanumerics, unique in the ledger.
    fn generate_item_id(&self) -> String {
        loop {
            let suffix: String = uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .to_uppercase()
                .chars()
                .take(GENERATED_ID_SUFFIX_LEN)
                .collect();
            let id = format!("RAW{}", suffix);
            if self.get_by_id(&id).is_none() {
                return id;
            }
        }
    }
}

impl Default for RawInventory {
    fn default() -> Self {
        RawInventory::new(crate::DEFAULT_REORDER_LEVEL as f64)
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

    fn form(item_id: &str, category: &str, quantity: f64) -> RawItemInput {
        RawItemInput {
            item_id: item_id.to_string(),
            category: category.to_string(),
            quantity: Some(quantity),
            reorder_level: Some(20.0),
            restock_date: None,
            storage_location: "Cold Room".to_string(),
        }
    }

    #[test]
    fn test_credit_creates_item_with_defaults() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 40.0).unwrap();

        let item = raw.get("Highlands").unwrap();
        assert_eq!(item.quantity, 40.0);
        assert_eq!(item.reorder_level, 10.0);
        assert_eq!(item.storage_location, "Main Warehouse");
        assert!(item.item_id.starts_with("RAW"));
        assert_eq!(item.item_id.len(), 12);
        assert!(item.item_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!item.item_id.chars().any(|c| c.is_ascii_lowercase()));

        raw.credit("Highlands", 2.5).unwrap();
        assert_eq!(raw.quantity("Highlands"), 42.5);
        assert_eq!(raw.records().len(), 1);
    }

    #[test]
    fn test_credit_rejects_non_positive() {
        let mut raw = RawInventory::default();
        assert!(matches!(raw.credit("Highlands", 0.0), Err(CoreError::Validation(_))));
        assert!(raw.credit("Highlands", -3.0).is_err());
        assert!(raw.records().is_empty());
    }

    #[test]
    fn test_debit() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 10.0).unwrap();

        raw.debit("Highlands", 4.0).unwrap();
        assert_eq!(raw.quantity("Highlands"), 6.0);

        let err = raw.debit("Highlands", 7.0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available, requested, .. }
                if available == 6.0 && requested == 7.0
        ));
        assert_eq!(raw.quantity("Highlands"), 6.0);

        assert!(raw.debit("Lowlands", 1.0).is_err());
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 5.0).unwrap();

        raw.adjust("Highlands", -8.0);
        assert_eq!(raw.quantity("Highlands"), 0.0);

        raw.adjust("Valley", -1.0);
        assert!(raw.get("Valley").is_none());

        raw.adjust("Valley", 3.0);
        assert_eq!(raw.quantity("Valley"), 3.0);
    }

    #[test]
    fn test_upsert_item_preserves_quantity_on_update() {
        let mut raw = RawInventory::default();
        assert_eq!(
            raw.upsert_item(form("INV1", "Highlands", 30.0), today()).unwrap(),
            Upsert::Created
        );

        let mut edit = form("INV1", "Highlands", 999.0);
        edit.storage_location = "Barn".to_string();
        assert_eq!(raw.upsert_item(edit, today()).unwrap(), Upsert::Updated);

        let item = raw.get_by_id("INV1").unwrap();
        assert_eq!(item.quantity, 30.0);
        assert_eq!(item.storage_location, "Barn");
    }

    #[test]
    fn test_upsert_item_batches_errors() {
        let mut raw = RawInventory::default();
        let input = RawItemInput {
            item_id: "INV-1".to_string(),
            category: "Zone 4".to_string(),
            quantity: Some(-1.0),
            reorder_level: None,
            restock_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            storage_location: "A".to_string(),
        };

        let err = raw.upsert_item(input, today()).unwrap_err();
        assert_eq!(err.validation_errors().unwrap().len(), 6);
        assert!(raw.records().is_empty());
    }

    #[test]
    fn test_ensure_categories_and_low_stock() {
        let mut raw = RawInventory::default();
        raw.credit("Highlands", 50.0).unwrap();

        let added = raw.ensure_categories(["Highlands", "Valley", "Coast", "Valley"]);
        assert_eq!(added, 2);
        assert_eq!(raw.categories(), vec!["Highlands", "Valley", "Coast"]);

        let low: Vec<&str> = raw
            .low_stock_items()
            .iter()
            .map(|i| i.category.as_str())
            .collect();
        assert_eq!(low, vec!["Valley", "Coast"]);
    }

    #[test]
    fn test_remove_item() {
        let mut raw = RawInventory::default();
        raw.upsert_item(form("INV1", "Highlands", 1.0), today()).unwrap();
        assert!(raw.remove_item("INV1").is_ok());
        assert!(matches!(raw.remove_item("INV1"), Err(CoreError::NotFound { .. })));
    }
}
