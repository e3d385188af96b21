//! # Domain Types
//!
//! Record types shared by every ledger.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │     Farmer      │   │    Purchase     │   │  RawInventoryItem   │   │
//! │  │  farmer_id      │◄──│  farmer_id      │   │  category = region  │   │
//! │  │  region ────────┼───┼─────────────────┼──►│  quantity (kg)      │   │
//! │  └─────────────────┘   │  quantity (kg)  │   │  reorder_level      │   │
//! │                        │  total_cost     │   └──────────┬──────────┘   │
//! │                        └─────────────────┘              │ packaging    │
//! │                                                         ▼              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ CategoryPricing │──►│      Order      │◄──│PackagedInventoryItem│   │
//! │  │  weight_info    │   │  category       │   │  units, total_kg    │   │
//! │  │  price          │   │  total_price    │   └─────────────────────┘   │
//! │  └─────────────────┘   │  status         │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Records serialize with camelCase keys. These are the keys used in the
//! persisted collections and in CSV headers, so renaming a field is a storage
//! format change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(1000)
    }
}

// =============================================================================
// Upsert Outcome
// =============================================================================

/// Whether a create-or-update form inserted a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Upsert {
    Created,
    Updated,
}

// =============================================================================
// Farmer
// =============================================================================

/// A supplier of raw produce.
///
/// `region` doubles as the raw inventory category that this farmer's
/// purchases are credited to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Farmer {
    pub farmer_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub region: String,
    /// Free-form GPS coordinates as entered.
    pub gps: String,
}

// =============================================================================
// Purchase
// =============================================================================

/// Raw produce bought from a farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub purchase_id: String,
    pub farmer_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Kilograms bought.
    pub quantity: f64,
    pub price_per_kg: Money,
    /// `price_per_kg × quantity`, rounded to the cent at creation.
    pub total_cost: Money,
}

// =============================================================================
// Category Pricing
// =============================================================================

/// Weight of one packaged unit.
///
/// Serialized as the label the catalog form accepts: `"0.25 kg"` or
/// `"Varies"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WeightInfo {
    /// Fixed weight in kilograms per unit.
    PerUnit(f64),
    /// Custom weight; every packaging run produces exactly one unit.
    Varies,
}

impl WeightInfo {
    /// Numeric unit weight in kg, `None` for `Varies`.
    pub fn unit_weight_kg(&self) -> Option<f64> {
        match self {
            WeightInfo::PerUnit(kg) => Some(*kg),
            WeightInfo::Varies => None,
        }
    }

    pub fn is_varies(&self) -> bool {
        matches!(self, WeightInfo::Varies)
    }
}

impl fmt::Display for WeightInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{:?}` keeps the trailing ".0" on whole numbers ("1.0 kg")
            WeightInfo::PerUnit(kg) => write!(f, "{:?} kg", kg),
            WeightInfo::Varies => f.write_str("Varies"),
        }
    }
}

impl FromStr for WeightInfo {
    type Err = ValidationError;

    /// Accepts `<digits>[.<digits>][ ]kg` or the literal `Varies`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "Weight info".to_string(),
            reason: "expected a weight like '0.5 kg' or 'Varies'".to_string(),
        };

        let s = s.trim();
        if s == "Varies" {
            return Ok(WeightInfo::Varies);
        }

        let number = s.strip_suffix("kg").ok_or_else(invalid)?;
        let number = number.strip_suffix(char::is_whitespace).unwrap_or(number);

        let (whole, fraction) = match number.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (number, None),
        };
        let all_digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !fraction.map_or(true, all_digits) {
            return Err(invalid());
        }

        number
            .parse::<f64>()
            .map(WeightInfo::PerUnit)
            .map_err(|_| invalid())
    }
}

impl TryFrom<String> for WeightInfo {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeightInfo> for String {
    fn from(value: WeightInfo) -> Self {
        value.to_string()
    }
}

/// A packaging tier: its unit weight and its unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryPricing {
    pub category: String,
    #[ts(as = "String")]
    pub weight_info: WeightInfo,
    /// Price per packaged unit.
    pub price: Money,
}

// =============================================================================
// Inventory
// =============================================================================

/// Raw stock for one category (usually a farmer region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RawInventoryItem {
    pub item_id: String,
    pub category: String,
    /// Kilograms on hand, never negative.
    pub quantity: f64,
    pub reorder_level: f64,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub restock_date: Option<NaiveDate>,
    pub storage_location: String,
}

impl RawInventoryItem {
    /// Below the reorder threshold (strictly).
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.reorder_level
    }
}

/// Packaged stock for one catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PackagedInventoryItem {
    pub category: String,
    pub units: i64,
    pub total_kg: f64,
}

impl PackagedInventoryItem {
    pub fn empty(category: impl Into<String>) -> Self {
        PackagedInventoryItem {
            category: category.into(),
            units: 0,
            total_kg: 0.0,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "Status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

/// A customer order for packaged units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub order_id: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub category: String,
    /// Units ordered.
    pub quantity: i64,
    /// Catalog price × quantity at the time the order was placed.
    pub total_price: Money,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

// =============================================================================
// Unit Tests
// =============================================================================
