//! End-to-end ledger scenario
//!
//! Seeded catalog → purchase → packaging → order → analytics, driven
//! through the `Tracker` the way the adapter drives it.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use harvest_core::catalog::CategoryInput;
use harvest_core::events::{DerivedUpdate, EventListener, LedgerEvent};
use harvest_core::finance::{AnalysisRequest, TaxMethod};
use harvest_core::orders::OrderInput;
use harvest_core::packaging::PackagingRequest;
use harvest_core::purchases::PurchaseInput;
use harvest_core::{
    CoreError, Farmer, FixedClock, MemoryStore, Money, OrderStatus, Tracker, TrackerSettings,
};

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
        name: "Grace Wanjiru".to_string(),
        phone: "+254-700-123456".to_string(),
        email: "grace@berries.co".to_string(),
        address: "Plot 7, Kinangop".to_string(),
        region: region.to_string(),
        gps: "-0.71,36.58".to_string(),
    }
}

fn purchase(id: &str, farmer_id: &str, kg: f64, cents_per_kg: i64) -> PurchaseInput {
    PurchaseInput {
        purchase_id: id.to_string(),
        farmer_id: farmer_id.to_string(),
        date: Some(today()),
        quantity: Some(kg),
        price_per_kg: Some(Money::from_cents(cents_per_kg)),
    }
}

fn order(id: &str, category: &str, units: i64) -> OrderInput {
    OrderInput {
        order_id: id.to_string(),
        customer_name: "Corner Grocer".to_string(),
        customer_contact: "0722000111".to_string(),
        category: category.to_string(),
        quantity: Some(units),
        date: Some(today()),
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<LedgerEvent>>);

impl EventListener for EventLog {
    fn on_update(&self, update: &DerivedUpdate) {
        self.0.lock().unwrap().push(update.event);
    }
}

#[test]
fn test_purchase_package_order_scenario() {
    let mut tracker = tracker();
    let log = Arc::new(EventLog::default());
    tracker.subscribe(log.clone());

    tracker.upsert_farmer(farmer("F1", "North")).unwrap();

    let p1 = tracker.record_purchase(purchase("P1", "F1", 100.0, 200)).unwrap();
    assert_eq!(p1.total_cost, Money::from_major(200));
    assert_eq!(tracker.snapshot().raw.quantity("North"), 100.0);

    let receipt = tracker
        .package(PackagingRequest {
            raw_category: "North".to_string(),
            packaged_category: "Medium (250g)".to_string(),
            quantity_kg: Some(50.0),
        })
        .unwrap();
    assert_eq!(receipt.units_produced, 200);
    let medium = tracker.snapshot().packaged.get("Medium (250g)").unwrap();
    assert_eq!(medium.units, 200);
    assert_eq!(medium.total_kg, 50.0);
    assert_eq!(tracker.snapshot().raw.quantity("North"), 50.0);

    let o1 = tracker.place_order(order("O1", "Medium (250g)", 10)).unwrap();
    assert_eq!(o1.total_price, Money::from_cents(10 * 1_000));
    assert_eq!(o1.status, OrderStatus::Pending);
    assert_eq!(tracker.snapshot().packaged.units("Medium (250g)"), 190);

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            LedgerEvent::Inventory,
            LedgerEvent::Purchase,
            LedgerEvent::Inventory,
            LedgerEvent::Sale,
        ]
    );

    let stats = tracker.dashboard();
    assert_eq!(stats.total_revenue.cents(), 10_000);
    assert_eq!(stats.active_orders, 1);
    assert_eq!(stats.suppliers, 1);
    assert_eq!(tracker.recent_activity()[0].order_id, "O1");
}

#[test]
fn test_purchase_edit_moves_stock_between_regions() {
    let mut tracker = tracker();
    tracker.upsert_farmer(farmer("F1", "North")).unwrap();
    tracker.upsert_farmer(farmer("F2", "South")).unwrap();
    tracker.record_purchase(purchase("P1", "F1", 30.0, 150)).unwrap();

    let edited = tracker.update_purchase(purchase("P1", "F2", 12.5, 150)).unwrap();
    assert_eq!(edited.total_cost.cents(), 1_875);
    assert_eq!(tracker.snapshot().raw.quantity("North"), 0.0);
    assert_eq!(tracker.snapshot().raw.quantity("South"), 12.5);

    tracker.remove_purchase("P1").unwrap();
    assert_eq!(tracker.snapshot().raw.quantity("South"), 0.0);
    assert!(tracker.purchases().is_empty());
}

#[test]
fn test_order_rejections_leave_ledgers_unchanged() {
    let mut tracker = tracker();
    tracker.upsert_farmer(farmer("F1", "North")).unwrap();
    tracker.record_purchase(purchase("P1", "F1", 2.0, 200)).unwrap();
    tracker
        .package(PackagingRequest {
            raw_category: "North".to_string(),
            packaged_category: "Large (500g)".to_string(),
            quantity_kg: Some(2.0),
        })
        .unwrap();

    let err = tracker.place_order(order("O1", "Large (500g)", 5)).unwrap_err();
    assert!(matches!(err, CoreError::InsufficientStock { .. }));
    assert_eq!(tracker.snapshot().packaged.units("Large (500g)"), 4);

    let err = tracker.place_order(order("O-1", "Large (500g)", 1)).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(tracker.snapshot().orders.is_empty());
}

#[test]
fn test_catalog_changes_realign_packaged_stock() {
    let mut tracker = tracker();
    tracker
        .upsert_category(CategoryInput {
            category: "Crate (10kg)".to_string(),
            weight_info: "10 kg".to_string(),
            price: Some(Money::from_major(220)),
        })
        .unwrap();
    tracker.remove_category("Small (100g)").unwrap();

    let snapshot = tracker.snapshot();
    let mut catalog: Vec<&str> = snapshot.catalog.names().collect();
    let mut packaged: Vec<&str> = snapshot
        .packaged
        .records()
        .iter()
        .map(|i| i.category.as_str())
        .collect();
    catalog.sort_unstable();
    packaged.sort_unstable();
    assert_eq!(catalog, packaged);
}

#[test]
fn test_analysis_and_report() {
    let mut tracker = tracker();
    tracker.upsert_farmer(farmer("F1", "North")).unwrap();
    tracker.record_purchase(purchase("P1", "F1", 100.0, 200)).unwrap();
    tracker
        .package(PackagingRequest {
            raw_category: "North".to_string(),
            packaged_category: "Bulk Pack (5kg)".to_string(),
            quantity_kg: Some(100.0),
        })
        .unwrap();
    tracker.place_order(order("O1", "Bulk Pack (5kg)", 20)).unwrap();

    // income 2,400.00 − expense 200.00 = 2,200.00 taxable
    let summary = tracker
        .analyze(AnalysisRequest {
            tax_method: TaxMethod::Progressive,
            ..AnalysisRequest::default()
        })
        .unwrap();
    assert_eq!(summary.taxable_income, Money::from_major(2_200));
    assert_eq!(summary.tax, Money::from_major(110));

    let report = tracker.generate_report(None, None);
    assert_eq!(report.tax_applied, Money::from_major(240));
    assert_eq!(report.net_profit, Money::from_major(1_960));
    assert_eq!(report.units_sold_per_category["Bulk Pack (5kg)"], 20);

    let csv = tracker.export_report_csv().unwrap();
    assert!(csv.contains("Net Profit,1960.00\n"));
}
