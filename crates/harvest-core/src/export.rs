//! # CSV Export
//!
//! Every export is a header line followed by one line per record, each
//! terminated by `\n`. Fields are quoted only when they need it (a comma,
//! a quote or a line break), with embedded quotes doubled. Money is
//! written as a plain decimal (`200.00`).
//!
//! ## Two Entry Points
//! ```text
//! export_records(&farmers)          typed: CsvRecord supplies headers and
//!                                   formatted fields
//!
//! export_csv(&rows, &["a", "b"])    generic: any Serialize record,
//!                                   flattened by field name
//! ```

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::report::ComprehensiveReport;
use crate::types::{Farmer, Order, Purchase, RawInventoryItem};

/// A record with a fixed CSV layout.
pub trait CsvRecord {
    const HEADERS: &'static [&'static str];

    /// Field values in [`Self::HEADERS`] order.
    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for Farmer {
    const HEADERS: &'static [&'static str] =
        &["farmerId", "name", "phone", "email", "address", "region", "gps"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.farmer_id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.address.clone(),
            self.region.clone(),
            self.gps.clone(),
        ]
    }
}

impl CsvRecord for Purchase {
    const HEADERS: &'static [&'static str] = &[
        "purchaseId",
        "farmerId",
        "date",
        "quantity",
        "pricePerKg",
        "totalCost",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.purchase_id.clone(),
            self.farmer_id.clone(),
            self.date.to_string(),
            self.quantity.to_string(),
            self.price_per_kg.to_decimal_string(),
            self.total_cost.to_decimal_string(),
        ]
    }
}

impl CsvRecord for Order {
    const HEADERS: &'static [&'static str] = &[
        "orderId",
        "customerName",
        "customerContact",
        "category",
        "quantity",
        "totalPrice",
        "status",
        "date",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.order_id.clone(),
            self.customer_name.clone(),
            self.customer_contact.clone(),
            self.category.clone(),
            self.quantity.to_string(),
            self.total_price.to_decimal_string(),
            self.status.to_string(),
            self.date.to_string(),
        ]
    }
}

impl CsvRecord for RawInventoryItem {
    const HEADERS: &'static [&'static str] = &[
        "itemId",
        "category",
        "quantity",
        "reorderLevel",
        "restockDate",
        "storageLocation",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.item_id.clone(),
            self.category.clone(),
            self.quantity.to_string(),
            self.reorder_level.to_string(),
            self.restock_date.map(|d| d.to_string()).unwrap_or_default(),
            self.storage_location.clone(),
        ]
    }
}

// =============================================================================
// Writers
// =============================================================================

/// Exports typed records with their fixed layout.
pub fn export_records<T: CsvRecord>(records: &[T]) -> CoreResult<String> {
    write_rows(T::HEADERS, records.iter().map(T::fields))
}

/// Exports any serializable records, picking `headers` by field name.
///
/// Strings are written as-is, `null` and missing fields as empty cells,
/// and nested values as compact JSON.
pub fn export_csv<T: Serialize>(records: &[T], headers: &[&str]) -> CoreResult<String> {
    let rows = records
        .iter()
        .map(|record| {
            let value = serde_json::to_value(record)
                .map_err(|e| CoreError::Export(format!("record encoding failed: {}", e)))?;
            Ok(headers.iter().map(|h| cell(value.get(*h))).collect())
        })
        .collect::<CoreResult<Vec<Vec<String>>>>()?;

    write_rows(headers, rows)
}

/// `parameter,value` export of a generated report.
pub fn export_report(report: &ComprehensiveReport) -> CoreResult<String> {
    let rows = report.rows()?;
    export_csv(&rows, &["parameter", "value"])
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_rows<I>(headers: &[&str], rows: I) -> CoreResult<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);

    wtr.write_record(headers)
        .map_err(|e| CoreError::Export(format!("CSV write error: {}", e)))?;
    for row in rows {
        wtr.write_record(&row)
            .map_err(|e| CoreError::Export(format!("CSV write error: {}", e)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| CoreError::Export(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::Export(format!("UTF-8 conversion error: {}", e)))
}

// =============================================================================
// Unit Tests
// =============================================================================
