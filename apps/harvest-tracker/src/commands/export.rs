//! # Export Commands
//!
//! CSV text for each ledger plus the last generated report. The host
//! decides where the text goes; a suggested file name is returned with it.

use chrono::NaiveDate;
use harvest_core::{Clock, CoreResult, KeyValueStore, Tracker};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    pub file_name: String,
    pub rows: usize,
    pub content: String,
}

impl CsvExport {
    fn new(prefix: &str, today: NaiveDate, content: String) -> Self {
        // header line excluded
        let rows = content.lines().count().saturating_sub(1);
        CsvExport {
            file_name: format!("{}_{}.csv", prefix, today.format("%Y-%m-%d")),
            rows,
            content,
        }
    }
}

async fn export_with<S, C, F>(
    state: &TrackerState<S, C>,
    prefix: &str,
    render: F,
) -> Result<CsvExport, ApiError>
where
    S: KeyValueStore,
    C: Clock,
    F: FnOnce(&Tracker<S, C>) -> CoreResult<String>,
{
    debug!(export = %prefix, "export command");
    let export = state
        .with_tracker(|t| render(t).map(|content| CsvExport::new(prefix, t.today(), content)))
        .await?;

    info!(file = %export.file_name, rows = export.rows, "CSV export ready");
    Ok(export)
}

pub async fn export_farmers<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<CsvExport, ApiError> {
    export_with(state, "farmers", |t| t.export_farmers_csv()).await
}

pub async fn export_purchases<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<CsvExport, ApiError> {
    export_with(state, "purchases", |t| t.export_purchases_csv()).await
}

pub async fn export_orders<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<CsvExport, ApiError> {
    export_with(state, "orders", |t| t.export_orders_csv()).await
}

pub async fn export_inventory<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<CsvExport, ApiError> {
    export_with(state, "inventory", |t| t.export_inventory_csv()).await
}

/// Fails with `BAD_REQUEST` until `generate_report` has run.
pub async fn export_report<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<CsvExport, ApiError> {
    export_with(state, "report", |t| t.export_report_csv()).await
}
