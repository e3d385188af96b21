//! # Packaged Inventory Ledger
//!
//! Whole units ready for sale, tracked per catalog category together with
//! the kilograms they represent.
//!
//! ## Invariants
//! - The ledger holds exactly the catalog's categories ([`PackagedInventory::align`]).
//! - `units ≥ 0` and `total_kg ≥ 0` after every movement.
//! - Each catalog category has a reorder level (default 10 units).
//!
//! ## Debiting a `Varies` Category
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Premium (custom): units = 3, total_kg = 4.5                            │
//! │                                                                         │
//! │  debit(1)                                                               │
//! │    units    = 3 − 1 = 2                                                 │
//! │    weight   = total_kg / units = 4.5 / 2 = 2.25   (after the decrement) │
//! │    total_kg = 4.5 − 1 × 2.25 = 2.25               (clamped at 0)        │
//! │                                                                         │
//! │  Selling the last unit leaves units = 0 and weight 0, so the remaining  │
//! │  kilograms stay on the books until the next packaging run.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError, ValidationErrors};
use crate::types::PackagedInventoryItem;
use crate::validation::validate_positive_units;

/// Packaged stock and reorder thresholds.
#[derive(Debug, Clone)]
pub struct PackagedInventory {
    items: Vec<PackagedInventoryItem>,
    reorder_levels: BTreeMap<String, i64>,
    default_reorder_level: i64,
}

impl PackagedInventory {
    pub fn new(default_reorder_level: i64) -> Self {
        PackagedInventory {
            items: Vec::new(),
            reorder_levels: BTreeMap::new(),
            default_reorder_level,
        }
    }

    pub fn from_records(
        items: Vec<PackagedInventoryItem>,
        reorder_levels: BTreeMap<String, i64>,
        default_reorder_level: i64,
    ) -> Self {
        PackagedInventory {
            items,
            reorder_levels,
            default_reorder_level,
        }
    }

    pub fn records(&self) -> &[PackagedInventoryItem] {
        &self.items
    }

    pub fn reorder_levels(&self) -> &BTreeMap<String, i64> {
        &self.reorder_levels
    }

    pub fn get(&self, category: &str) -> Option<&PackagedInventoryItem> {
        self.items.iter().find(|i| i.category == category)
    }

    /// Units on hand, 0 for unknown categories.
    pub fn units(&self, category: &str) -> i64 {
        self.get(category).map_or(0, |i| i.units)
    }

    /// Makes the ledger's category set equal to the catalog's.
    ///
    /// Missing categories are added with zero stock and the default reorder
    /// level; categories no longer in the catalog are dropped together with
    /// their reorder level. Returns true if anything changed.
    pub fn align(&mut self, catalog: &Catalog) -> bool {
        let before = (self.items.len(), self.reorder_levels.len());

        let orphaned: Vec<String> = self
            .items
            .iter()
            .filter(|i| !catalog.contains(&i.category))
            .map(|i| i.category.clone())
            .collect();
        self.items.retain(|i| catalog.contains(&i.category));
        self.reorder_levels.retain(|category, _| catalog.contains(category));

        let mut added = 0;
        for category in catalog.names() {
            if self.get(category).is_none() {
                self.items.push(PackagedInventoryItem::empty(category));
                added += 1;
            }
            self.reorder_levels
                .entry(category.to_string())
                .or_insert(self.default_reorder_level);
        }

        let changed = !orphaned.is_empty()
            || added > 0
            || before != (self.items.len(), self.reorder_levels.len());
        if changed {
            debug!(added, removed = ?orphaned, "Packaged inventory aligned with catalog");
        }
        changed
    }

    /// Adds units and kilograms to a category.
    pub fn credit(&mut self, category: &str, units: i64, kg: f64) -> CoreResult<()> {
        let item = self
            .get_mut(category)
            .ok_or_else(|| CoreError::not_found("Packaged category", category))?;

        item.units += units;
        item.total_kg += kg;
        debug!(category = %category, units, kg, "Packaged inventory credited");
        Ok(())
    }

    /// Removes units from a category, reducing its kilograms by the unit
    /// weight (see the module docs for `Varies` categories).
    pub fn debit(&mut self, category: &str, units: i64, catalog: &Catalog) -> CoreResult<()> {
        let fixed_weight = catalog
            .get(category)
            .and_then(|c| c.weight_info.unit_weight_kg());

        let item = self
            .get_mut(category)
            .ok_or_else(|| CoreError::not_found("Packaged category", category))?;

        if units > item.units {
            return Err(CoreError::InsufficientStock {
                category: category.to_string(),
                available: item.units as f64,
                requested: units as f64,
            });
        }

        item.units -= units;
        let unit_weight = match fixed_weight {
            Some(kg) => kg,
            None if item.units > 0 => item.total_kg / item.units as f64,
            None => 0.0,
        };
        item.total_kg = (item.total_kg - units as f64 * unit_weight).max(0.0);

        debug!(
            category = %category,
            units,
            remaining = item.units,
            "Packaged inventory debited"
        );
        Ok(())
    }

    /// Reorder threshold for a category (default level when unset).
    pub fn reorder_level(&self, category: &str) -> i64 {
        self.reorder_levels
            .get(category)
            .copied()
            .unwrap_or(self.default_reorder_level)
    }

    pub fn set_reorder_level(
        &mut self,
        category: &str,
        level: Option<i64>,
        catalog: &Catalog,
    ) -> CoreResult<()> {
        let mut errors = ValidationErrors::new();
        if !catalog.contains(category) {
            errors.push(ValidationError::UnknownCategory {
                field: "Category".to_string(),
                category: category.to_string(),
            });
        }
        errors.check(validate_positive_units("Reorder level", level));
        errors.into_result()?;

        let level = level.unwrap_or(self.default_reorder_level);
        self.reorder_levels.insert(category.to_string(), level);
        debug!(category = %category, level, "Packaged reorder level set");
        Ok(())
    }

    pub fn is_low_stock(&self, category: &str) -> bool {
        self.units(category) < self.reorder_level(category)
    }

    /// Categories below their reorder level, in ledger order.
    pub fn low_stock(&self) -> Vec<&PackagedInventoryItem> {
        self.items
            .iter()
            .filter(|i| i.units < self.reorder_level(&i.category))
            .collect()
    }

    fn get_mut(&mut self, category: &str) -> Option<&mut PackagedInventoryItem> {
        self.items.iter_mut().find(|i| i.category == category)
    }
}

impl Default for PackagedInventory {
    fn default() -> Self {
        PackagedInventory::new(crate::DEFAULT_REORDER_LEVEL)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
