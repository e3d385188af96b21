//! # Comprehensive Report
//!
//! Period summary of sales, purchases and remaining packaged stock.
//!
//! ```text
//! income    = Σ order.totalPrice     (date-filtered)
//! expenses  = Σ purchase.totalCost   (date-filtered)
//! tax       = 10% of income
//! profit    = income − expenses − tax
//! ```
//!
//! Unlike the financial analyzer, the report always applies a flat 10% to
//! gross income.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::finance::in_period;
use crate::money::Money;
use crate::types::{Order, PackagedInventoryItem, Purchase, TaxRate};

/// Flat rate applied to report income.
pub const REPORT_TAX_RATE: TaxRate = TaxRate::from_bps(1_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ComprehensiveReport {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub tax_applied: Money,
    pub net_profit: Money,
    pub units_sold_per_category: BTreeMap<String, i64>,
    pub remaining_packaged_stock: Vec<PackagedInventoryItem>,
}

/// One `parameter,value` line of the report export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportRow {
    pub parameter: String,
    pub value: String,
}

impl ComprehensiveReport {
    pub fn generate(
        orders: &[Order],
        purchases: &[Purchase],
        packaged: &[PackagedInventoryItem],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        let mut total_income = Money::zero();
        let mut units_sold_per_category: BTreeMap<String, i64> = BTreeMap::new();
        for order in orders.iter().filter(|o| in_period(o.date, start, end)) {
            total_income += order.total_price;
            *units_sold_per_category
                .entry(order.category.clone())
                .or_default() += order.quantity;
        }

        let total_expenses: Money = purchases
            .iter()
            .filter(|p| in_period(p.date, start, end))
            .map(|p| p.total_cost)
            .sum();

        let tax_applied = total_income.calculate_tax(REPORT_TAX_RATE);

        ComprehensiveReport {
            start,
            end,
            total_income,
            total_expenses,
            tax_applied,
            net_profit: total_income - total_expenses - tax_applied,
            units_sold_per_category,
            remaining_packaged_stock: packaged.to_vec(),
        }
    }

    /// Rows of the `parameter,value` export. Open bounds are left blank.
    pub fn rows(&self) -> CoreResult<Vec<ReportRow>> {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let json = |value: serde_json::Result<String>| {
            value.map_err(|e| CoreError::Export(format!("report encoding failed: {}", e)))
        };

        let rows = [
            ("Start Date", date(self.start)),
            ("End Date", date(self.end)),
            ("Total Income", self.total_income.to_decimal_string()),
            ("Total Expenses", self.total_expenses.to_decimal_string()),
            ("Tax Applied", self.tax_applied.to_decimal_string()),
            ("Net Profit", self.net_profit.to_decimal_string()),
            (
                "Products Sold (per category)",
                json(serde_json::to_string(&self.units_sold_per_category))?,
            ),
            (
                "Remaining Stock (per category)",
                json(serde_json::to_string(&self.remaining_packaged_stock))?,
            ),
        ];

        Ok(rows
            .into_iter()
            .map(|(parameter, value)| ReportRow {
                parameter: parameter.to_string(),
                value,
            })
            .collect())
    }
}
