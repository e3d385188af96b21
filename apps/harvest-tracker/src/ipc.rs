//! # JSON-Lines Channel
//!
//! One request per input line, one response per output line.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  → {"id":1,"command":"record_purchase","args":{"input":{               │
//! │       "purchaseId":"P1","farmerId":"F1","quantity":40,                 │
//! │       "pricePerKg":250}}}                                              │
//! │  ← {"id":1,"ok":true,"data":{"purchaseId":"P1",...,"totalCost":10000}} │
//! │                                                                         │
//! │  → {"id":2,"command":"forecast","args":{"category":"Nope"}}            │
//! │  ← {"id":2,"ok":false,"error":{"code":"NOT_FOUND",                     │
//! │       "message":"Category not found: Nope"}}                           │
//! │                                                                         │
//! │  → not json                                                            │
//! │  ← {"id":null,"ok":false,"error":{"code":"BAD_REQUEST",...}}           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money is whole cents, dates are `YYYY-MM-DD`. `id` is echoed back
//! untouched. Blank lines are skipped; EOF ends the session.
//!
//! The store is flushed before each response is written, so a command
//! whose write did not reach SQLite answers `STORAGE_ERROR` itself.

use chrono::NaiveDate;
use harvest_core::catalog::CategoryInput;
use harvest_core::finance::AnalysisRequest;
use harvest_core::orders::OrderInput;
use harvest_core::packaging::PackagingRequest;
use harvest_core::purchases::PurchaseInput;
use harvest_core::raw_inventory::RawItemInput;
use harvest_core::{Clock, Farmer, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::commands::{analytics, catalog, export, farmers, inventory, orders, purchases};
use crate::error::ApiError;
use crate::state::{DurableStore, TrackerState};

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn success(id: Value, data: Value) -> Self {
        Response {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Value, error: ApiError) -> Self {
        Response {
            id,
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

// =============================================================================
// Argument Shapes
// =============================================================================

#[derive(Deserialize)]
struct FarmerArgs {
    farmer: Farmer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FarmerIdArgs {
    farmer_id: String,
}

#[derive(Deserialize)]
struct QueryArgs {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct InputArgs<T> {
    input: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseIdArgs {
    purchase_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemIdArgs {
    item_id: String,
}

#[derive(Deserialize)]
struct CategoryArgs {
    category: String,
}

#[derive(Deserialize)]
struct ReorderLevelArgs {
    category: String,
    #[serde(default)]
    level: Option<i64>,
}

#[derive(Deserialize)]
struct PackagingArgs {
    request: PackagingRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderIdArgs {
    order_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusArgs {
    order_id: String,
    status: String,
}

#[derive(Deserialize)]
struct StatusFilterArgs {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize, Default)]
struct PeriodArgs {
    #[serde(default)]
    start: Option<NaiveDate>,
    #[serde(default)]
    end: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
struct AnalyzeArgs {
    #[serde(default)]
    request: Option<AnalysisRequest>,
}

/// Deserializes command arguments; a missing `args` counts as `{}`.
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ApiError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(args)?)
}

fn to_data<T: Serialize>(result: Result<T, ApiError>) -> Result<Value, ApiError> {
    let value = result?;
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {}", e)))
}

// =============================================================================
// Dispatch
// =============================================================================

/// Routes one command to its handler.
pub async fn dispatch<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    command: &str,
    args: Value,
) -> Result<Value, ApiError> {
    match command {
        // Farmers
        "upsert_farmer" => {
            let a: FarmerArgs = parse_args(args)?;
            to_data(farmers::upsert_farmer(state, a.farmer).await)
        }
        "remove_farmer" => {
            let a: FarmerIdArgs = parse_args(args)?;
            to_data(farmers::remove_farmer(state, a.farmer_id).await)
        }
        "list_farmers" => to_data(farmers::list_farmers(state).await),
        "search_farmers" => {
            let a: QueryArgs = parse_args(args)?;
            to_data(farmers::search_farmers(state, a.query).await)
        }

        // Purchases
        "record_purchase" => {
            let a: InputArgs<PurchaseInput> = parse_args(args)?;
            to_data(purchases::record_purchase(state, a.input).await)
        }
        "update_purchase" => {
            let a: InputArgs<PurchaseInput> = parse_args(args)?;
            to_data(purchases::update_purchase(state, a.input).await)
        }
        "remove_purchase" => {
            let a: PurchaseIdArgs = parse_args(args)?;
            to_data(purchases::remove_purchase(state, a.purchase_id).await)
        }
        "list_purchases" => to_data(purchases::list_purchases(state).await),
        "expenses_for_period" => {
            let a: PeriodArgs = parse_args(args)?;
            to_data(purchases::expenses_for_period(state, a.start, a.end).await)
        }

        // Inventory & packaging
        "upsert_raw_item" => {
            let a: InputArgs<RawItemInput> = parse_args(args)?;
            to_data(inventory::upsert_raw_item(state, a.input).await)
        }
        "remove_raw_item" => {
            let a: ItemIdArgs = parse_args(args)?;
            to_data(inventory::remove_raw_item(state, a.item_id).await)
        }
        "list_raw_inventory" => to_data(inventory::list_raw_inventory(state).await),
        "list_packaged_inventory" => to_data(inventory::list_packaged_inventory(state).await),
        "set_packaged_reorder_level" => {
            let a: ReorderLevelArgs = parse_args(args)?;
            to_data(inventory::set_packaged_reorder_level(state, a.category, a.level).await)
        }
        "package" => {
            let a: PackagingArgs = parse_args(args)?;
            to_data(inventory::package(state, a.request).await)
        }

        // Catalog
        "list_categories" => to_data(catalog::list_categories(state).await),
        "upsert_category" => {
            let a: InputArgs<CategoryInput> = parse_args(args)?;
            to_data(catalog::upsert_category(state, a.input).await)
        }
        "remove_category" => {
            let a: CategoryArgs = parse_args(args)?;
            to_data(catalog::remove_category(state, a.category).await)
        }

        // Orders
        "place_order" => {
            let a: InputArgs<OrderInput> = parse_args(args)?;
            to_data(orders::place_order(state, a.input).await)
        }
        "update_order_status" => {
            let a: OrderStatusArgs = parse_args(args)?;
            to_data(orders::update_order_status(state, a.order_id, a.status).await)
        }
        "remove_order" => {
            let a: OrderIdArgs = parse_args(args)?;
            to_data(orders::remove_order(state, a.order_id).await)
        }
        "list_orders" => {
            let a: StatusFilterArgs = parse_args(args)?;
            to_data(orders::list_orders(state, a.status).await)
        }
        "revenue_summary" => to_data(orders::revenue_summary(state).await),

        // Analytics
        "analyze" => {
            let a: AnalyzeArgs = parse_args(args)?;
            to_data(analytics::analyze(state, a.request).await)
        }
        "current_month_revenue" => to_data(analytics::current_month_revenue(state).await),
        "forecast" => {
            let a: CategoryArgs = parse_args(args)?;
            to_data(analytics::forecast(state, a.category).await)
        }
        "forecast_all" => to_data(analytics::forecast_all(state).await),
        "forecast_demand" => to_data(analytics::forecast_demand(state).await),
        "generate_report" => {
            let a: PeriodArgs = parse_args(args)?;
            to_data(analytics::generate_report(state, a.start, a.end).await)
        }
        "dashboard" => to_data(analytics::dashboard(state).await),
        "recent_activity" => to_data(analytics::recent_activity(state).await),
        "alerts" => to_data(analytics::alerts(state).await),
        "reset" => to_data(analytics::reset(state).await),

        // Exports
        "export_farmers" => to_data(export::export_farmers(state).await),
        "export_purchases" => to_data(export::export_purchases(state).await),
        "export_orders" => to_data(export::export_orders(state).await),
        "export_inventory" => to_data(export::export_inventory(state).await),
        "export_report" => to_data(export::export_report(state).await),

        other => Err(ApiError::bad_request(format!("Unknown command: {}", other))),
    }
}

/// Parses one input line, runs it and waits for its writes.
pub async fn handle_line<S: DurableStore, C: Clock>(
    state: &TrackerState<S, C>,
    line: &str,
) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed request line");
            return Response::failure(
                Value::Null,
                ApiError::bad_request(format!("Malformed request: {}", e)),
            );
        }
    };

    debug!(id = %request.id, command = %request.command, "Request received");
    let result = dispatch(state, &request.command, request.args).await;
    // reads queue nothing, so this only waits on the command's own writes
    let flushed = state.flush().await;

    match (result, flushed) {
        (Ok(data), Ok(())) => Response::success(request.id, data),
        (Ok(_), Err(e)) => {
            warn!(command = %request.command, error = %e, "Command applied but not persisted");
            Response::failure(request.id, ApiError::from(e))
        }
        (Err(error), _) => {
            debug!(command = %request.command, %error, "Command failed");
            Response::failure(request.id, error)
        }
    }
}

/// Serves requests until `reader` reaches EOF.
///
/// Returns the number of requests handled.
pub async fn serve<R, W, S, C>(
    state: &TrackerState<S, C>,
    reader: R,
    mut writer: W,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: DurableStore,
    C: Clock,
{
    info!("Command channel open");
    let mut lines = reader.lines();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(state, &line).await;
        let mut encoded = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled, "Command channel closed");
    Ok(handled)
}
