//! # Demand Forecaster
//!
//! Two forecasts over the order ledger.
//!
//! ## Trend Forecast (90-day outlook)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders of category C with date ≥ today − 90, in ledger order           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  points (x = 0..n−1, y = quantity) ──► least squares fit                │
//! │       │                              slope, intercept, R²               │
//! │       ▼                                                                 │
//! │  seasonal factor = mean qty/order in the current calendar month         │
//! │                    (all categories, all years; 1 when no data)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  predicted = max(0, round((intercept + slope × 90) × factor))           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Recommendation (30-day average)
//! `recommended = ceil(units sold in the last 30 days / 30 × 60)`, computed
//! in integers so `45 / 30 × 60` is exactly 90.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::types::Order;

/// Look-back window of the trend forecast.
pub const TREND_WINDOW_DAYS: u64 = 90;

/// Projection horizon of the trend forecast.
pub const TREND_HORIZON: f64 = 90.0;

/// Look-back window of the stock recommendation.
pub const DEMAND_WINDOW_DAYS: u64 = 30;

/// Days of stock the recommendation covers.
pub const DEMAND_HORIZON_DAYS: i64 = 60;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Trend::Increasing
        } else if slope < 0.0 {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Increasing => "Increasing",
            Trend::Decreasing => "Decreasing",
            Trend::Stable => "Stable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_r_squared(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceLevel::High
        } else if confidence > 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Least squares fit of `y` against `x = 0..n−1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryForecast {
    pub category: String,
    pub data_points: usize,
    pub slope: f64,
    pub intercept: f64,
    pub seasonal_factor: f64,
    pub predicted_demand: i64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockRecommendation {
    pub category: String,
    pub units_sold: i64,
    pub average_daily_sales: f64,
    pub recommended_stock: i64,
}

// =============================================================================
// Operations
// =============================================================================

/// Fits a line through `(i, values[i])`.
///
/// Fewer than two points yield an all-zero fit.
pub fn linear_regression(values: &[f64]) -> Regression {
    if values.len() < 2 {
        return Regression::default();
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let (mut ss_tot, mut ss_res) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        ss_tot += (y - mean_y).powi(2);
        ss_res += (y - fitted).powi(2);
    }
    let r_squared = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    Regression {
        slope,
        intercept,
        r_squared,
    }
}

/// Mean quantity per order over every order placed in calendar `month`
/// (1-12) of any year. Returns 1 when there are none.
pub fn seasonal_factor(orders: &[Order], month: u32) -> f64 {
    let (total, count) = orders
        .iter()
        .filter(|o| o.date.month() == month)
        .fold((0i64, 0usize), |(total, count), o| (total + o.quantity, count + 1));

    if count == 0 {
        1.0
    } else {
        total as f64 / count as f64
    }
}

/// 90-day trend forecast for one category.
pub fn forecast(category: &str, orders: &[Order], today: NaiveDate) -> CategoryForecast {
    let since = today - Days::new(TREND_WINDOW_DAYS);
    let quantities: Vec<f64> = orders
        .iter()
        .filter(|o| o.category == category && o.date >= since)
        .map(|o| o.quantity as f64)
        .collect();

    let fit = linear_regression(&quantities);
    let factor = seasonal_factor(orders, today.month());
    let baseline = fit.intercept + fit.slope * TREND_HORIZON;
    let predicted_demand = (baseline * factor).round().max(0.0) as i64;

    CategoryForecast {
        category: category.to_string(),
        data_points: quantities.len(),
        slope: fit.slope,
        intercept: fit.intercept,
        seasonal_factor: factor,
        predicted_demand,
        confidence: fit.r_squared,
        confidence_level: ConfidenceLevel::from_r_squared(fit.r_squared),
        trend: Trend::from_slope(fit.slope),
    }
}

/// One trend forecast per catalog category, in catalog order.
pub fn forecast_all(catalog: &Catalog, orders: &[Order], today: NaiveDate) -> Vec<CategoryForecast> {
    catalog
        .names()
        .map(|category| forecast(category, orders, today))
        .collect()
}

/// Stock recommendations for every category sold in `[today − 30, today]`.
pub fn forecast_demand(orders: &[Order], today: NaiveDate) -> Vec<StockRecommendation> {
    let since = today - Days::new(DEMAND_WINDOW_DAYS);
    let mut sold: BTreeMap<&str, i64> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.date >= since && o.date <= today) {
        *sold.entry(order.category.as_str()).or_default() += order.quantity;
    }

    let window = DEMAND_WINDOW_DAYS as i64;
    sold.into_iter()
        .map(|(category, units_sold)| StockRecommendation {
            category: category.to_string(),
            units_sold,
            average_daily_sales: units_sold as f64 / window as f64,
            recommended_stock: (units_sold * DEMAND_HORIZON_DAYS + window - 1).div_euclid(window),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
