//! # Category Catalog
//!
//! The packaging tiers the farm sells: unit weight and unit price.
//!
//! The catalog is the source of truth for which packaged categories exist.
//! After any catalog change the tracker re-aligns the packaged ledger so both
//! hold the same category set.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{CategoryPricing, Upsert, WeightInfo};
use crate::validation::{validate_price, validate_required};

/// Default tiers: (category, weight label, price in cents).
const SEED_CATEGORIES: [(&str, WeightInfo, i64); 7] = [
    ("Small (100g)", WeightInfo::PerUnit(0.1), 500),
    ("Medium (250g)", WeightInfo::PerUnit(0.25), 1_000),
    ("Large (500g)", WeightInfo::PerUnit(0.5), 1_800),
    ("Extra Large (1kg)", WeightInfo::PerUnit(1.0), 3_000),
    ("Family Pack (2kg)", WeightInfo::PerUnit(2.0), 5_500),
    ("Bulk Pack (5kg)", WeightInfo::PerUnit(5.0), 12_000),
    ("Premium (custom)", WeightInfo::Varies, 0),
];

/// Catalog form input.
///
/// `weight_info` is the raw label; it is parsed during validation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryInput {
    pub category: String,
    pub weight_info: String,
    pub price: Option<Money>,
}

/// Ordered list of packaging categories.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<CategoryPricing>,
}

impl Catalog {
    /// The default seven tiers.
    pub fn seeded() -> Self {
        let categories = SEED_CATEGORIES
            .iter()
            .map(|(name, weight, cents)| CategoryPricing {
                category: name.to_string(),
                weight_info: *weight,
                price: Money::from_cents(*cents),
            })
            .collect();
        Catalog { categories }
    }

    pub fn from_records(categories: Vec<CategoryPricing>) -> Self {
        Catalog { categories }
    }

    pub fn records(&self) -> &[CategoryPricing] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryPricing> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Category names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.category.as_str())
    }

    /// Creates or updates a category.
    ///
    /// ## Rules
    /// - category is required
    /// - weight info is `<N> kg` with N > 0, or `Varies`
    /// - price is greater than zero
    ///
    /// Existing packaged stock and past orders are never rewritten.
    pub fn upsert(&mut self, input: CategoryInput) -> CoreResult<(Upsert, CategoryPricing)> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("Category", &input.category));

        let weight_info = match validate_required("Weight info", &input.weight_info) {
            Err(e) => {
                errors.push(e);
                None
            }
            Ok(()) => match input.weight_info.parse::<WeightInfo>() {
                Ok(WeightInfo::PerUnit(kg)) if kg <= 0.0 => {
                    errors.push(ValidationError::MustBePositive {
                        field: "Weight info".to_string(),
                    });
                    None
                }
                Ok(weight) => Some(weight),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        errors.check(validate_price("Price", input.price));
        errors.into_result()?;

        let record = CategoryPricing {
            category: input.category.trim().to_string(),
            weight_info: weight_info.unwrap_or(WeightInfo::Varies),
            price: input.price.unwrap_or_default(),
        };

        let outcome = match self
            .categories
            .iter_mut()
            .find(|c| c.category == record.category)
        {
            Some(existing) => {
                *existing = record.clone();
                Upsert::Updated
            }
            None => {
                self.categories.push(record.clone());
                Upsert::Created
            }
        };

        debug!(category = %record.category, ?outcome, "Category saved");
        Ok((outcome, record))
    }

    /// Deletes a category.
    pub fn remove(&mut self, category: &str) -> CoreResult<CategoryPricing> {
        let index = self
            .categories
            .iter()
            .position(|c| c.category == category)
            .ok_or_else(|| CoreError::not_found("Category", category))?;

        debug!(category = %category, "Category removed");
        Ok(self.categories.remove(index))
    }
}
