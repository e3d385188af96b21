//! # Analytics Commands
//!
//! Read-mostly views derived from the ledgers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Derived Views                                        │
//! │                                                                         │
//! │  analyze ────────────► FinancialSummary   (stores the parameters)       │
//! │  current_month_revenue                                                  │
//! │  forecast / forecast_all ──► CategoryForecast (regression × season)     │
//! │  forecast_demand ────► StockRecommendation (30-day window)              │
//! │  generate_report ────► ComprehensiveReport (cached for export_report)   │
//! │  dashboard / recent_activity / alerts                                   │
//! │  reset ──────────────► seeded catalog, everything else empty            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use harvest_core::alerts::Alert;
use harvest_core::dashboard::DashboardStats;
use harvest_core::finance::{AnalysisRequest, FinancialSummary};
use harvest_core::forecast::{CategoryForecast, StockRecommendation};
use harvest_core::report::ComprehensiveReport;
use harvest_core::{Clock, KeyValueStore, Money, Order};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::TrackerState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenueResponse {
    pub month: String,
    pub revenue: Money,
    pub minimum_monthly_revenue: Money,
}

/// Runs the financial analysis. Omitted request fields fall back to the
/// configured defaults.
pub async fn analyze<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    request: Option<AnalysisRequest>,
) -> Result<FinancialSummary, ApiError> {
    let summary = state
        .with_tracker_mut(|t| {
            let request = request.unwrap_or_else(|| t.settings().analysis.clone());
            debug!(
                start = ?request.start,
                end = ?request.end,
                method = %request.tax_method.as_str(),
                "analyze command"
            );
            t.analyze(request)
        })
        .await?;

    info!(
        income = %summary.total_income,
        expenses = %summary.total_expenses,
        tax = %summary.tax,
        "Financial analysis complete"
    );
    Ok(summary)
}

pub async fn current_month_revenue<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<MonthlyRevenueResponse, ApiError> {
    let response = state
        .with_tracker(|t| MonthlyRevenueResponse {
            month: t.today().format("%Y-%m").to_string(),
            revenue: t.current_month_revenue(),
            minimum_monthly_revenue: t.settings().minimum_monthly_revenue,
        })
        .await;
    Ok(response)
}

pub async fn forecast<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    category: String,
) -> Result<CategoryForecast, ApiError> {
    debug!(category = %category, "forecast command");
    let forecast = state.with_tracker(|t| t.forecast(&category)).await?;
    Ok(forecast)
}

/// One forecast per catalog category, in catalog order.
pub async fn forecast_all<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<CategoryForecast>, ApiError> {
    Ok(state.with_tracker(|t| t.forecast_all()).await)
}

pub async fn forecast_demand<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<StockRecommendation>, ApiError> {
    Ok(state.with_tracker(|t| t.forecast_demand()).await)
}

/// Builds the report for `[start, end]` and keeps it for `export_report`.
pub async fn generate_report<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ComprehensiveReport, ApiError> {
    debug!(?start, ?end, "generate_report command");
    let report = state
        .with_tracker_mut(|t| t.generate_report(start, end))
        .await;

    info!(net_profit = %report.net_profit, "Report generated");
    Ok(report)
}

pub async fn dashboard<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<DashboardStats, ApiError> {
    Ok(state.with_tracker(|t| t.dashboard()).await)
}

/// The most recent orders, newest first.
pub async fn recent_activity<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<Order>, ApiError> {
    let orders = state
        .with_tracker(|t| t.recent_activity().into_iter().cloned().collect())
        .await;
    Ok(orders)
}

/// Alerts from the last ledger change.
pub async fn alerts<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<Alert>, ApiError> {
    Ok(state.with_tracker(|t| t.alerts().to_vec()).await)
}

/// Wipes every ledger and re-seeds the catalog.
pub async fn reset<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<DashboardStats, ApiError> {
    warn!("reset command: clearing every ledger");
    let stats = state
        .with_tracker_mut(|t| t.reset().map(|()| t.dashboard()))
        .await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::catalog::list_categories;
    use crate::commands::farmers::list_farmers;
    use crate::commands::orders::place_order;
    use crate::commands::orders::tests::{order, packaged_state};
    use crate::commands::test_support::state;
    use crate::error::ErrorCode;
    use harvest_core::alerts::AlertKind;
    use harvest_core::finance::TaxMethod;

    #[tokio::test]
    async fn test_analyze_uses_configured_defaults() {
        let state = packaged_state().await;
        place_order(&state, order("O1", "Medium (250g)", 10)).await.unwrap();

        let summary = analyze(&state, None).await.unwrap();
        assert_eq!(summary.total_income, Money::from_cents(10_000));
        assert_eq!(summary.total_expenses, Money::from_cents(4_000));
        assert_eq!(summary.tax_method, TaxMethod::Standard);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_rate() {
        let state = state();
        let request = AnalysisRequest {
            tax_rate_percent: 150.0,
            ..AnalysisRequest::default()
        };

        let err = analyze(&state, Some(request)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_monthly_revenue_and_dashboard() {
        let state = packaged_state().await;
        place_order(&state, order("O1", "Medium (250g)", 2)).await.unwrap();

        let monthly = current_month_revenue(&state).await.unwrap();
        assert_eq!(monthly.month, "2024-06");
        assert_eq!(monthly.revenue, Money::from_cents(2_000));

        let stats = dashboard(&state).await.unwrap();
        assert_eq!(stats.active_orders, 1);
        assert_eq!(stats.suppliers, 1);

        let recent = recent_activity(&state).await.unwrap();
        assert_eq!(recent[0].order_id, "O1");
    }

    #[tokio::test]
    async fn test_low_revenue_raises_financial_alert() {
        let state = packaged_state().await;
        place_order(&state, order("O1", "Medium (250g)", 1)).await.unwrap();

        let alerts = alerts(&state).await.unwrap();
        assert!(alerts.iter().any(|a| a.kind == AlertKind::Financial));
    }

    #[tokio::test]
    async fn test_forecast_unknown_category() {
        let state = state();
        let err = forecast(&state, "Crate (9kg)".to_string()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let all = forecast_all(&state).await.unwrap();
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|f| f.predicted_demand == 0));
    }

    #[tokio::test]
    async fn test_report_then_reset() {
        let state = packaged_state().await;
        place_order(&state, order("O1", "Medium (250g)", 5)).await.unwrap();

        let report = generate_report(&state, None, None).await.unwrap();
        assert_eq!(report.units_sold_per_category.get("Medium (250g)"), Some(&5));

        let stats = reset(&state).await.unwrap();
        assert_eq!(stats.suppliers, 0);
        assert!(list_farmers(&state).await.unwrap().is_empty());
        assert_eq!(list_categories(&state).await.unwrap().len(), 7);
    }
}
