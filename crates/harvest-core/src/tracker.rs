//! # Tracker
//!
//! The single owner of every ledger. Each operation follows the same path:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mutating Operation                             │
//! │                                                                         │
//! │  validate ──► key checks ──► stock checks ──► mutate snapshot           │
//! │     │              │               │                │                   │
//! │     └──────────────┴───────────────┘                ▼                   │
//! │        Err: nothing changed           persist touched collections       │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │                                    publish LedgerEvent (always)         │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │                              Ok(result) or Err(Persistence)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A persistence failure does not roll back the in-memory mutation: the
//! ledgers stay authoritative and the caller learns that the store is
//! behind.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::alerts::{Alert, DEFAULT_MINIMUM_MONTHLY_REVENUE};
use crate::catalog::CategoryInput;
use crate::clock::{Clock, SystemClock};
use crate::dashboard::{self, DashboardStats};
use crate::error::{CoreError, CoreResult};
use crate::events::{DerivedContext, DerivedUpdate, EventHub, EventListener, LedgerEvent};
use crate::export;
use crate::finance::{self, AnalysisRequest, FinancialSummary};
use crate::forecast::{self, CategoryForecast, StockRecommendation};
use crate::money::Money;
use crate::orders::{OrderInput, RevenueSummary};
use crate::packaging::{self, PackagingReceipt, PackagingRequest};
use crate::purchases::PurchaseInput;
use crate::raw_inventory::RawItemInput;
use crate::report::ComprehensiveReport;
use crate::store::{Collection, KeyValueStore, Snapshot};
use crate::types::{CategoryPricing, Farmer, Order, OrderStatus, Purchase, RawInventoryItem, Upsert};
use crate::DEFAULT_REORDER_LEVEL;

/// Tunables handed to the tracker by its host.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    pub minimum_monthly_revenue: Money,
    /// Reorder level for new raw items and packaged categories.
    pub default_reorder_level: i64,
    /// Parameters used when events recompute the financial analysis.
    pub analysis: AnalysisRequest,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        TrackerSettings {
            minimum_monthly_revenue: DEFAULT_MINIMUM_MONTHLY_REVENUE,
            default_reorder_level: DEFAULT_REORDER_LEVEL,
            analysis: AnalysisRequest::default(),
        }
    }
}

pub struct Tracker<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    settings: TrackerSettings,
    snapshot: Snapshot,
    hub: EventHub,
    last_report: Option<ComprehensiveReport>,
    alerts: Vec<Alert>,
}

impl<S: KeyValueStore> Tracker<S, SystemClock> {
    /// Loads the tracker from `store` using the local calendar.
    pub fn new(store: S, settings: TrackerSettings) -> CoreResult<Self> {
        Tracker::with_clock(store, SystemClock, settings)
    }
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    pub fn with_clock(store: S, clock: C, settings: TrackerSettings) -> CoreResult<Self> {
        let snapshot = Snapshot::load(&store, settings.default_reorder_level)?;
        let alerts = crate::alerts::evaluate(
            &snapshot.raw,
            &snapshot.packaged,
            snapshot.orders.records(),
            clock.today(),
            settings.minimum_monthly_revenue,
        );

        Ok(Tracker {
            store,
            clock,
            settings,
            snapshot,
            hub: EventHub::new(),
            last_report: None,
            alerts,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.hub.subscribe(listener);
    }

    /// Alerts from the most recent evaluation.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn last_report(&self) -> Option<&ComprehensiveReport> {
        self.last_report.as_ref()
    }

    // =========================================================================
    // Farmers
    // =========================================================================

    /// Saves a farmer and makes sure its region has a raw inventory item.
    pub fn upsert_farmer(&mut self, farmer: Farmer) -> CoreResult<Upsert> {
        let outcome = self.snapshot.farmers.upsert(farmer.clone())?;
        self.snapshot
            .raw
            .ensure_categories(std::iter::once(farmer.region.trim()));

        self.commit(
            LedgerEvent::Inventory,
            &[Collection::Farmers, Collection::RawInventory],
        )?;
        Ok(outcome)
    }

    pub fn remove_farmer(&mut self, farmer_id: &str) -> CoreResult<Farmer> {
        let farmer = self.snapshot.farmers.remove(farmer_id)?;
        self.commit(LedgerEvent::Inventory, &[Collection::Farmers])?;
        Ok(farmer)
    }

    pub fn farmers(&self) -> &[Farmer] {
        self.snapshot.farmers.records()
    }

    pub fn search_farmers(&self, query: &str) -> Vec<&Farmer> {
        self.snapshot.farmers.search(query)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    pub fn record_purchase(&mut self, input: PurchaseInput) -> CoreResult<Purchase> {
        let today = self.today();
        let snapshot = &mut self.snapshot;
        let purchase = snapshot
            .purchases
            .record(input, &snapshot.farmers, &mut snapshot.raw, today)?;

        self.commit(
            LedgerEvent::Purchase,
            &[Collection::Purchases, Collection::RawInventory],
        )?;
        Ok(purchase)
    }

    pub fn update_purchase(&mut self, input: PurchaseInput) -> CoreResult<Purchase> {
        let today = self.today();
        let snapshot = &mut self.snapshot;
        let purchase = snapshot
            .purchases
            .update(input, &snapshot.farmers, &mut snapshot.raw, today)?;

        self.commit(
            LedgerEvent::Purchase,
            &[Collection::Purchases, Collection::RawInventory],
        )?;
        Ok(purchase)
    }

    pub fn remove_purchase(&mut self, purchase_id: &str) -> CoreResult<Purchase> {
        let snapshot = &mut self.snapshot;
        let purchase = snapshot
            .purchases
            .remove(purchase_id, &snapshot.farmers, &mut snapshot.raw)?;

        self.commit(
            LedgerEvent::Purchase,
            &[Collection::Purchases, Collection::RawInventory],
        )?;
        Ok(purchase)
    }

    pub fn purchases(&self) -> &[Purchase] {
        self.snapshot.purchases.records()
    }

    pub fn expenses_for_period(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Money {
        self.snapshot.purchases.expenses_for_period(start, end)
    }

    // =========================================================================
    // Raw Inventory
    // =========================================================================

    pub fn upsert_raw_item(&mut self, input: RawItemInput) -> CoreResult<Upsert> {
        let today = self.today();
        let outcome = self.snapshot.raw.upsert_item(input, today)?;
        self.commit(LedgerEvent::Inventory, &[Collection::RawInventory])?;
        Ok(outcome)
    }

    pub fn remove_raw_item(&mut self, item_id: &str) -> CoreResult<RawInventoryItem> {
        let item = self.snapshot.raw.remove_item(item_id)?;
        self.commit(LedgerEvent::Inventory, &[Collection::RawInventory])?;
        Ok(item)
    }

    pub fn raw_inventory(&self) -> &[RawInventoryItem] {
        self.snapshot.raw.records()
    }

    // =========================================================================
    // Catalog & Packaged Inventory
    // =========================================================================

    /// Saves a category and realigns the packaged ledger.
    pub fn upsert_category(&mut self, input: CategoryInput) -> CoreResult<(Upsert, CategoryPricing)> {
        let saved = self.snapshot.catalog.upsert(input)?;
        self.snapshot.packaged.align(&self.snapshot.catalog);

        self.commit(
            LedgerEvent::Catalog,
            &[
                Collection::Catalog,
                Collection::PackagedInventory,
                Collection::PackagedReorderLevels,
            ],
        )?;
        Ok(saved)
    }

    /// Removes a category together with its packaged stock.
    pub fn remove_category(&mut self, category: &str) -> CoreResult<CategoryPricing> {
        let removed = self.snapshot.catalog.remove(category)?;
        self.snapshot.packaged.align(&self.snapshot.catalog);

        self.commit(
            LedgerEvent::Catalog,
            &[
                Collection::Catalog,
                Collection::PackagedInventory,
                Collection::PackagedReorderLevels,
            ],
        )?;
        Ok(removed)
    }

    pub fn set_packaged_reorder_level(&mut self, category: &str, level: Option<i64>) -> CoreResult<()> {
        let snapshot = &mut self.snapshot;
        snapshot
            .packaged
            .set_reorder_level(category, level, &snapshot.catalog)?;
        self.commit(LedgerEvent::Inventory, &[Collection::PackagedReorderLevels])
    }

    pub fn package(&mut self, request: PackagingRequest) -> CoreResult<PackagingReceipt> {
        let snapshot = &mut self.snapshot;
        let receipt = packaging::package(
            &mut snapshot.raw,
            &mut snapshot.packaged,
            &snapshot.catalog,
            &request,
        )?;

        self.commit(
            LedgerEvent::Inventory,
            &[Collection::RawInventory, Collection::PackagedInventory],
        )?;
        Ok(receipt)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub fn place_order(&mut self, input: OrderInput) -> CoreResult<Order> {
        let today = self.today();
        let snapshot = &mut self.snapshot;
        let order = snapshot.orders.place(
            input,
            &snapshot.catalog,
            &mut snapshot.packaged,
            today,
        )?;

        self.commit(
            LedgerEvent::Sale,
            &[Collection::Orders, Collection::PackagedInventory],
        )?;
        Ok(order)
    }

    pub fn update_order_status(&mut self, order_id: &str, status: &str) -> CoreResult<Order> {
        let order = self.snapshot.orders.update_status(order_id, status)?;
        self.commit(LedgerEvent::Sale, &[Collection::Orders])?;
        Ok(order)
    }

    /// Deletes an order. Packaged units are not returned to stock.
    pub fn remove_order(&mut self, order_id: &str) -> CoreResult<Order> {
        let order = self.snapshot.orders.remove(order_id)?;
        self.commit(LedgerEvent::Sale, &[Collection::Orders])?;
        Ok(order)
    }

    pub fn orders_by_status(&self, status: Option<OrderStatus>) -> Vec<&Order> {
        self.snapshot.orders.filter_by_status(status)
    }

    pub fn revenue_summary(&self) -> RevenueSummary {
        self.snapshot.orders.revenue_summary()
    }

    // =========================================================================
    // Finance, Forecasting & Reports
    // =========================================================================

    /// Runs the financial analysis and keeps `request` as the parameters
    /// for later event-driven recomputation.
    pub fn analyze(&mut self, request: AnalysisRequest) -> CoreResult<FinancialSummary> {
        let summary = finance::analyze(
            self.snapshot.orders.records(),
            self.snapshot.purchases.records(),
            &self.snapshot.raw,
            &request,
        )?;
        self.settings.analysis = request;
        self.publish(LedgerEvent::Financial);
        Ok(summary)
    }

    pub fn current_month_revenue(&self) -> Money {
        finance::current_month_revenue(self.snapshot.orders.records(), self.today())
    }

    pub fn forecast(&self, category: &str) -> CoreResult<CategoryForecast> {
        if !self.snapshot.catalog.contains(category) {
            return Err(CoreError::not_found("Category", category));
        }
        Ok(forecast::forecast(
            category,
            self.snapshot.orders.records(),
            self.today(),
        ))
    }

    pub fn forecast_all(&self) -> Vec<CategoryForecast> {
        forecast::forecast_all(
            &self.snapshot.catalog,
            self.snapshot.orders.records(),
            self.today(),
        )
    }

    pub fn forecast_demand(&self) -> Vec<StockRecommendation> {
        forecast::forecast_demand(self.snapshot.orders.records(), self.today())
    }

    /// Builds the comprehensive report and caches it for export.
    pub fn generate_report(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ComprehensiveReport {
        let report = ComprehensiveReport::generate(
            self.snapshot.orders.records(),
            self.snapshot.purchases.records(),
            self.snapshot.packaged.records(),
            start,
            end,
        );
        self.last_report = Some(report.clone());
        report
    }

    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::from_snapshot(&self.snapshot)
    }

    pub fn recent_activity(&self) -> Vec<&Order> {
        dashboard::recent_activity(self.snapshot.orders.records())
    }

    // =========================================================================
    // CSV Exports
    // =========================================================================

    pub fn export_farmers_csv(&self) -> CoreResult<String> {
        export::export_records(self.snapshot.farmers.records())
    }

    pub fn export_purchases_csv(&self) -> CoreResult<String> {
        export::export_records(self.snapshot.purchases.records())
    }

    pub fn export_orders_csv(&self) -> CoreResult<String> {
        export::export_records(self.snapshot.orders.records())
    }

    pub fn export_inventory_csv(&self) -> CoreResult<String> {
        export::export_records(self.snapshot.raw.records())
    }

    pub fn export_report_csv(&self) -> CoreResult<String> {
        let report = self
            .last_report
            .as_ref()
            .ok_or(CoreError::ReportNotGenerated)?;
        export::export_report(report)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Clears the store and starts over from the seeded defaults.
    pub fn reset(&mut self) -> CoreResult<()> {
        let cleared = self.store.clear();

        self.snapshot = Snapshot::seeded(self.settings.default_reorder_level);
        self.last_report = None;
        info!("Tracker reset to seeded defaults");

        let persisted = self.snapshot.persist(&mut self.store, &Collection::ALL);
        self.publish(LedgerEvent::Catalog);
        cleared?;
        persisted?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Persists the touched collections, then publishes `event` whatever
    /// the outcome.
    fn commit(&mut self, event: LedgerEvent, collections: &[Collection]) -> CoreResult<()> {
        let persisted = self.snapshot.persist(&mut self.store, collections);
        self.publish(event);
        persisted.map_err(CoreError::from)
    }

    fn publish(&mut self, event: LedgerEvent) {
        let ctx = DerivedContext {
            today: self.clock.today(),
            minimum_monthly_revenue: self.settings.minimum_monthly_revenue,
            analysis: &self.settings.analysis,
            report_range: self.last_report.as_ref().map(|r| (r.start, r.end)),
        };
        let update = DerivedUpdate::compute(event, &self.snapshot, &ctx);

        if let Some(report) = &update.report {
            self.last_report = Some(report.clone());
        }
        if let Some(alerts) = &update.alerts {
            for alert in alerts.iter().filter(|a| !self.alerts.contains(a)) {
                warn!(kind = ?alert.kind, severity = ?alert.severity, "{}", alert.message);
            }
            self.alerts = alerts.clone();
        }

        self.hub.publish(&update);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ValidationError;
    use crate::store::{MemoryStore, StorageError};
    use serde_json::Value;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn tracker() -> Tracker<MemoryStore, FixedClock> {
        Tracker::with_clock(MemoryStore::new(), FixedClock(today()), TrackerSettings::default())
            .unwrap()
    }

    fn farmer(id: &str, region: &str) -> Farmer {
        Farmer {
            farmer_id: id.to_string(),
            name: "Amina".to_string(),
            phone: "0712345678".to_string(),
            email: "amina@farm.co".to_string(),
            address: "Box 12".to_string(),
            region: region.to_string(),
            gps: "-0.42,36.95".to_string(),
        }
    }

    fn purchase(id: &str, farmer_id: &str, kg: f64) -> PurchaseInput {
        PurchaseInput {
            purchase_id: id.to_string(),
            farmer_id: farmer_id.to_string(),
            date: Some(today()),
            quantity: Some(kg),
            price_per_kg: Some(Money::from_cents(200)),
        }
    }

    /// Store whose writes fail once `failing` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
            if self.failing {
                return Err(StorageError::Backend("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_farmer_region_gets_raw_item() {
        let mut tracker = tracker();
        tracker.upsert_farmer(farmer("F1", "North")).unwrap();

        let item = tracker.snapshot().raw.get("North").unwrap();
        assert_eq!(item.quantity, 0.0);
        assert!(item.item_id.starts_with("RAW"));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut tracker = tracker();
        tracker.upsert_farmer(farmer("F1", "North")).unwrap();
        tracker.record_purchase(purchase("P1", "F1", 100.0)).unwrap();

        let reloaded =
            Tracker::with_clock(tracker.store().clone(), FixedClock(today()), TrackerSettings::default())
                .unwrap();
        assert_eq!(reloaded.purchases().len(), 1);
        assert_eq!(reloaded.snapshot().raw.quantity("North"), 100.0);
    }

    #[test]
    fn test_failed_validation_leaves_store_untouched() {
        let mut tracker = tracker();
        let err = tracker.upsert_farmer(farmer("", "North")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_persistence_failure_keeps_mutation() {
        let mut tracker =
            Tracker::with_clock(FlakyStore::default(), FixedClock(today()), TrackerSettings::default())
                .unwrap();
        tracker.upsert_farmer(farmer("F1", "North")).unwrap();
        tracker.store_mut().failing = true;

        let err = tracker.record_purchase(purchase("P1", "F1", 40.0)).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(tracker.purchases().len(), 1);
        assert_eq!(tracker.snapshot().raw.quantity("North"), 40.0);
        // the event still ran: North is now above its reorder level
        assert!(!tracker
            .alerts()
            .iter()
            .any(|a| a.message.starts_with("Low stock alert: North")));
    }

    #[test]
    fn test_report_cache_and_export() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.export_report_csv(),
            Err(CoreError::ReportNotGenerated)
        ));

        tracker.generate_report(None, None);
        tracker.upsert_farmer(farmer("F1", "North")).unwrap();
        tracker.record_purchase(purchase("P1", "F1", 10.0)).unwrap();

        // the purchase event regenerated the cached report
        assert_eq!(tracker.last_report().unwrap().total_expenses.cents(), 2_000);
        let csv = tracker.export_report_csv().unwrap();
        assert!(csv.starts_with("parameter,value\n"));
        assert!(csv.contains("Total Expenses,20.00\n"));
    }

    #[test]
    fn test_analyze_keeps_parameters() {
        let mut tracker = tracker();
        let request = AnalysisRequest {
            tax_rate_percent: 15.0,
            ..AnalysisRequest::default()
        };
        tracker.analyze(request.clone()).unwrap();
        assert_eq!(tracker.settings().analysis, request);

        let bad = AnalysisRequest {
            tax_rate_percent: -1.0,
            ..AnalysisRequest::default()
        };
        let err = tracker.analyze(bad).unwrap_err();
        assert!(matches!(
            err.validation_errors().unwrap().iter().next(),
            Some(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(tracker.settings().analysis, request);
    }

    #[test]
    fn test_forecast_unknown_category() {
        let tracker = tracker();
        assert!(matches!(
            tracker.forecast("Tonne Bag"),
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(tracker.forecast_all().len(), 7);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut tracker = tracker();
        tracker.upsert_farmer(farmer("F1", "North")).unwrap();
        tracker.remove_category("Small (100g)").unwrap();
        tracker.generate_report(None, None);

        tracker.reset().unwrap();
        assert!(tracker.farmers().is_empty());
        assert_eq!(tracker.snapshot().catalog.len(), 7);
        assert!(tracker.last_report().is_none());
        assert_eq!(tracker.store().len(), Collection::ALL.len());
    }
}
