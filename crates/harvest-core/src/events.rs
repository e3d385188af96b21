//! # Event Hub
//!
//! Every mutating tracker operation publishes one [`LedgerEvent`]. The event
//! names the derived views that must be recomputed; the tracker computes
//! exactly those into a [`DerivedUpdate`] and hands it to each listener.
//!
//! ## Fan-out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Event      │ LowStock Expenses Revenue Analysis Forecast Report Alerts │
//! │─────────────┼───────────────────────────────────────────────────────────│
//! │  Purchase   │    ✓        ✓                ✓                ✓      ✓    │
//! │  Sale       │    ✓                 ✓                        ✓      ✓    │
//! │  Inventory  │    ✓                                  ✓              ✓    │
//! │  Financial  │                      ✓       ✓                ✓      ✓    │
//! │  Catalog    │    ✓                                  ✓              ✓    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The report is only regenerated when one has been generated before, and
//! then for the same date range.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::alerts::{self, Alert};
use crate::finance::{self, AnalysisRequest, FinancialSummary};
use crate::forecast::{self, CategoryForecast};
use crate::money::Money;
use crate::orders::RevenueSummary;
use crate::report::ComprehensiveReport;
use crate::store::Snapshot;
use crate::types::{PackagedInventoryItem, RawInventoryItem};

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LedgerEvent {
    Purchase,
    Sale,
    Inventory,
    Financial,
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Recompute {
    LowStock,
    Expenses,
    Revenue,
    FinancialAnalysis,
    Forecast,
    Report,
    Alerts,
}

impl LedgerEvent {
    pub const fn recomputations(&self) -> &'static [Recompute] {
        use Recompute::*;
        match self {
            LedgerEvent::Purchase => &[LowStock, Expenses, FinancialAnalysis, Report, Alerts],
            LedgerEvent::Sale => &[Revenue, LowStock, Report, Alerts],
            LedgerEvent::Inventory => &[LowStock, Forecast, Alerts],
            LedgerEvent::Financial => &[Revenue, FinancialAnalysis, Report, Alerts],
            LedgerEvent::Catalog => &[LowStock, Forecast, Alerts],
        }
    }

    pub fn triggers(&self, recompute: Recompute) -> bool {
        self.recomputations().contains(&recompute)
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// Derived Update
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockView {
    pub raw: Vec<RawInventoryItem>,
    pub packaged: Vec<PackagedInventoryItem>,
}

/// Inputs that the derived views depend on besides the ledgers.
#[derive(Debug, Clone)]
pub struct DerivedContext<'a> {
    pub today: NaiveDate,
    pub minimum_monthly_revenue: Money,
    pub analysis: &'a AnalysisRequest,
    /// Range of the last generated report, if any.
    pub report_range: Option<(Option<NaiveDate>, Option<NaiveDate>)>,
}

/// The recomputed views for one event. Parts the event does not name are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DerivedUpdate {
    pub event: LedgerEvent,
    pub low_stock: Option<LowStockView>,
    pub expenses: Option<Money>,
    pub revenue: Option<RevenueSummary>,
    pub financial_analysis: Option<FinancialSummary>,
    pub forecasts: Option<Vec<CategoryForecast>>,
    pub report: Option<ComprehensiveReport>,
    pub alerts: Option<Vec<Alert>>,
}

impl DerivedUpdate {
    pub fn compute(event: LedgerEvent, snapshot: &Snapshot, ctx: &DerivedContext<'_>) -> Self {
        let mut update = DerivedUpdate {
            event,
            low_stock: None,
            expenses: None,
            revenue: None,
            financial_analysis: None,
            forecasts: None,
            report: None,
            alerts: None,
        };

        for recompute in event.recomputations() {
            match recompute {
                Recompute::LowStock => {
                    update.low_stock = Some(LowStockView {
                        raw: snapshot.raw.low_stock_items().into_iter().cloned().collect(),
                        packaged: snapshot.packaged.low_stock().into_iter().cloned().collect(),
                    });
                }
                Recompute::Expenses => {
                    update.expenses = Some(
                        snapshot
                            .purchases
                            .expenses_for_period(ctx.analysis.start, ctx.analysis.end),
                    );
                }
                Recompute::Revenue => {
                    update.revenue = Some(snapshot.orders.revenue_summary());
                }
                Recompute::FinancialAnalysis => {
                    match finance::analyze(
                        snapshot.orders.records(),
                        snapshot.purchases.records(),
                        &snapshot.raw,
                        ctx.analysis,
                    ) {
                        Ok(summary) => update.financial_analysis = Some(summary),
                        Err(e) => warn!(error = %e, "Financial analysis skipped"),
                    }
                }
                Recompute::Forecast => {
                    update.forecasts = Some(forecast::forecast_all(
                        &snapshot.catalog,
                        snapshot.orders.records(),
                        ctx.today,
                    ));
                }
                Recompute::Report => {
                    update.report = ctx.report_range.map(|(start, end)| {
                        ComprehensiveReport::generate(
                            snapshot.orders.records(),
                            snapshot.purchases.records(),
                            snapshot.packaged.records(),
                            start,
                            end,
                        )
                    });
                }
                Recompute::Alerts => {
                    update.alerts = Some(alerts::evaluate(
                        &snapshot.raw,
                        &snapshot.packaged,
                        snapshot.orders.records(),
                        ctx.today,
                        ctx.minimum_monthly_revenue,
                    ));
                }
            }
        }

        update
    }
}

// =============================================================================
// Listeners
// =============================================================================

/// Receiver of derived updates (dashboards, loggers, tests).
pub trait EventListener: Send + Sync {
    fn on_update(&self, update: &DerivedUpdate);
}

/// Listener that ignores everything.
pub struct NoOpListener;

impl EventListener for NoOpListener {
    fn on_update(&self, _update: &DerivedUpdate) {}
}

#[derive(Default, Clone)]
pub struct EventHub {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventHub {
    pub fn new() -> Self {
        EventHub::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn publish(&self, update: &DerivedUpdate) {
        debug!(
            event = %update.event,
            listeners = self.listeners.len(),
            "Publishing ledger event"
        );
        for listener in &self.listeners {
            listener.on_update(update);
        }
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
