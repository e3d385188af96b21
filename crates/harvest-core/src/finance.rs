//! # Financial Analyzer
//!
//! Income, expenses and tax over a date range.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  income   = Σ order.totalPrice    where start ≤ date ≤ end              │
//! │  expense  = Σ purchase.totalCost  where start ≤ date ≤ end              │
//! │  taxable  = income − expense                                            │
//! │                                                                         │
//! │  taxable ≤ threshold ──► tax = 0                                        │
//! │  progressive         ──► bracket table below                            │
//! │  standard            ──► taxable × rate%                                │
//! │                                                                         │
//! │  Progressive brackets (each taxes only the slice inside it):            │
//! │    0      .. 5,000    5%                                                │
//! │    5,000  .. 10,000  10%                                                │
//! │    10,000 .. 20,000  15%                                                │
//! │    20,000 ..         20%                                                │
//! │                                                                         │
//! │  taxable = 12,000 ──► 250 + 500 + 300 = 1,050                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All sums are integer cents; only the effective rate is a float.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::raw_inventory::RawInventory;
use crate::types::{Order, Purchase, TaxRate};
use crate::validation::validate_tax_rate_percent;

/// Upper bound of the operational deduction (50,000.00).
pub const OPERATIONAL_DEDUCTION_CAP: Money = Money::from_cents(5_000_000);

/// Depreciation charged per raw kilogram on hand (0.10).
pub const DEPRECIATION_PER_KG: Money = Money::from_cents(10);

/// Default taxable-income threshold below which no tax applies (1,000.00).
pub const DEFAULT_MINIMUM_THRESHOLD: Money = Money::from_cents(100_000);

/// Default standard tax rate.
pub const DEFAULT_TAX_RATE_PERCENT: f64 = 10.0;

/// `(upper bound in cents, rate)` per bracket; the last bracket is open.
const PROGRESSIVE_BRACKETS: [(i64, TaxRate); 4] = [
    (500_000, TaxRate::from_bps(500)),
    (1_000_000, TaxRate::from_bps(1_000)),
    (2_000_000, TaxRate::from_bps(1_500)),
    (i64::MAX, TaxRate::from_bps(2_000)),
];

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TaxMethod {
    #[default]
    Standard,
    Progressive,
}

impl TaxMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxMethod::Standard => "standard",
            TaxMethod::Progressive => "progressive",
        }
    }
}

impl fmt::Display for TaxMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TaxMethod::Standard),
            "progressive" => Ok(TaxMethod::Progressive),
            _ => Err(ValidationError::NotAllowed {
                field: "Tax method".to_string(),
                allowed: vec!["standard".to_string(), "progressive".to_string()],
            }),
        }
    }
}

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AnalysisRequest {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
    pub tax_method: TaxMethod,
    pub tax_rate_percent: f64,
    pub minimum_threshold: Money,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        AnalysisRequest {
            start: None,
            end: None,
            tax_method: TaxMethod::Standard,
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            minimum_threshold: DEFAULT_MINIMUM_THRESHOLD,
        }
    }
}

// =============================================================================
// Result Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ProfitStatus {
    Loss,
    #[serde(rename = "Break-even")]
    BreakEven,
    Profit,
}

impl ProfitStatus {
    fn of(taxable: Money) -> Self {
        if taxable.is_negative() {
            ProfitStatus::Loss
        } else if taxable.is_zero() {
            ProfitStatus::BreakEven
        } else {
            ProfitStatus::Profit
        }
    }
}

impl fmt::Display for ProfitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfitStatus::Loss => "Loss",
            ProfitStatus::BreakEven => "Break-even",
            ProfitStatus::Profit => "Profit",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Deductions {
    pub operational: Money,
    pub inventory_depreciation: Money,
    /// Reserved; always zero.
    pub capital: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinancialSummary {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub taxable_income: Money,
    pub tax_method: TaxMethod,
    pub tax: Money,
    /// `tax / taxable × 100`, 0 when nothing is taxable.
    pub effective_tax_rate: f64,
    pub status: ProfitStatus,
    pub deductions: Deductions,
}

// =============================================================================
// Operations
// =============================================================================

/// Inclusive calendar-day range check; a missing bound is open.
pub fn in_period(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

pub fn analyze(
    orders: &[Order],
    purchases: &[Purchase],
    raw: &RawInventory,
    request: &AnalysisRequest,
) -> CoreResult<FinancialSummary> {
    validate_tax_rate_percent(request.tax_rate_percent)?;

    let total_income: Money = orders
        .iter()
        .filter(|o| in_period(o.date, request.start, request.end))
        .map(|o| o.total_price)
        .sum();
    let total_expenses: Money = purchases
        .iter()
        .filter(|p| in_period(p.date, request.start, request.end))
        .map(|p| p.total_cost)
        .sum();
    let taxable_income = total_income - total_expenses;

    let tax = if taxable_income <= request.minimum_threshold {
        Money::zero()
    } else {
        match request.tax_method {
            TaxMethod::Progressive => progressive_tax(taxable_income),
            TaxMethod::Standard => {
                taxable_income.calculate_tax(TaxRate::from_percentage(request.tax_rate_percent))
            }
        }
    };

    let effective_tax_rate = if taxable_income.is_positive() {
        tax.cents() as f64 / taxable_income.cents() as f64 * 100.0
    } else {
        0.0
    };

    Ok(FinancialSummary {
        start: request.start,
        end: request.end,
        total_income,
        total_expenses,
        taxable_income,
        tax_method: request.tax_method,
        tax,
        effective_tax_rate,
        status: ProfitStatus::of(taxable_income),
        deductions: deductions(purchases, raw),
    })
}

/// Bracketed tax on a positive taxable amount.
///
/// ```rust
/// use harvest_core::finance::progressive_tax;
/// use harvest_core::money::Money;
///
/// assert_eq!(progressive_tax(Money::from_major(12_000)), Money::from_major(1_050));
/// ```
pub fn progressive_tax(taxable: Money) -> Money {
    let mut tax = Money::zero();
    let mut lower = 0i64;

    for (upper, rate) in PROGRESSIVE_BRACKETS {
        if taxable.cents() <= lower {
            break;
        }
        let slice = taxable.cents().min(upper) - lower;
        tax += Money::from_cents(slice).calculate_tax(rate);
        lower = upper;
    }
    tax
}

/// Deduction breakdown over all purchases and the current raw stock.
pub fn deductions(purchases: &[Purchase], raw: &RawInventory) -> Deductions {
    let spent: Money = purchases.iter().map(|p| p.total_cost).sum();
    let operational = spent.min(OPERATIONAL_DEDUCTION_CAP);
    let inventory_depreciation = DEPRECIATION_PER_KG.multiply_fractional(raw.total_quantity());
    let capital = Money::zero();

    Deductions {
        operational,
        inventory_depreciation,
        capital,
        total: operational + inventory_depreciation + capital,
    }
}

/// Revenue of orders dated in the calendar month (and year) of `today`.
pub fn current_month_revenue(orders: &[Order], today: NaiveDate) -> Money {
    orders
        .iter()
        .filter(|o| o.date.year() == today.year() && o.date.month() == today.month())
        .map(|o| o.total_price)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
