//! Ledger property tests
//!
//! - Purchase create → edit → delete nets to zero raw stock
//! - Packaging conserves kilograms and never produces a partial unit
//! - Packaged debits never go negative
//! - Packaged categories always equal catalog categories

use chrono::NaiveDate;
use harvest_core::catalog::{Catalog, CategoryInput};
use harvest_core::farmers::FarmerRegistry;
use harvest_core::finance::progressive_tax;
use harvest_core::packaged::PackagedInventory;
use harvest_core::packaging::{package, PackagingRequest};
use harvest_core::purchases::{PurchaseInput, PurchaseLedger};
use harvest_core::raw_inventory::RawInventory;
use harvest_core::{CoreError, Farmer, Money};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn registry() -> FarmerRegistry {
    let mut registry = FarmerRegistry::default();
    registry
        .upsert(Farmer {
            farmer_id: "F1".to_string(),
            name: "Amina".to_string(),
            phone: "0712345678".to_string(),
            email: "amina@farm.co".to_string(),
            address: "Box 12".to_string(),
            region: "North".to_string(),
            gps: "-0.42,36.95".to_string(),
        })
        .unwrap();
    registry
}

fn purchase_input(kg: f64) -> PurchaseInput {
    PurchaseInput {
        purchase_id: "P1".to_string(),
        farmer_id: "F1".to_string(),
        date: Some(today()),
        quantity: Some(kg),
        price_per_kg: Some(Money::from_cents(250)),
    }
}

fn aligned() -> (Catalog, PackagedInventory) {
    let catalog = Catalog::seeded();
    let mut packaged = PackagedInventory::default();
    packaged.align(&catalog);
    (catalog, packaged)
}

// Quarter-kilogram steps keep the float sums exact.
fn kg_strategy() -> impl Strategy<Value = f64> {
    (1u32..4_000).prop_map(|q| q as f64 / 4.0)
}

fn fixed_category_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Small (100g)"),
        Just("Medium (250g)"),
        Just("Large (500g)"),
        Just("Extra Large (1kg)"),
        Just("Family Pack (2kg)"),
        Just("Bulk Pack (5kg)"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_purchase_lifecycle_nets_to_zero(
        start in 0u32..400,
        q1 in kg_strategy(),
        q2 in kg_strategy(),
    ) {
        let farmers = registry();
        let mut raw = RawInventory::default();
        let initial = start as f64;
        if start > 0 {
            raw.credit("North", initial).unwrap();
        }
        let mut ledger = PurchaseLedger::default();

        ledger.record(purchase_input(q1), &farmers, &mut raw, today()).unwrap();
        prop_assert_eq!(raw.quantity("North"), initial + q1);

        ledger.update(purchase_input(q2), &farmers, &mut raw, today()).unwrap();
        prop_assert_eq!(raw.quantity("North"), initial + q2);

        ledger.remove("P1", &farmers, &mut raw).unwrap();
        prop_assert_eq!(raw.quantity("North"), initial);
        prop_assert!(raw.quantity("North") >= 0.0);
    }

    #[test]
    fn prop_packaging_conserves_weight(
        category in fixed_category_strategy(),
        stock in kg_strategy(),
        requested in kg_strategy(),
    ) {
        let (catalog, mut packaged) = aligned();
        let mut raw = RawInventory::default();
        raw.credit("North", stock).unwrap();
        let request = PackagingRequest {
            raw_category: "North".to_string(),
            packaged_category: category.to_string(),
            quantity_kg: Some(requested),
        };

        match package(&mut raw, &mut packaged, &catalog, &request) {
            Ok(receipt) => {
                prop_assert!(receipt.units_produced >= 1);
                prop_assert!(receipt.packaged_kg <= requested + 1e-9);
                prop_assert_eq!(raw.quantity("North"), stock - requested);
                prop_assert_eq!(packaged.units(category), receipt.units_produced);
                let item = packaged.get(category).unwrap();
                prop_assert!((item.total_kg - receipt.packaged_kg).abs() < 1e-9);
            }
            Err(CoreError::InsufficientStock { .. }) => {
                prop_assert!(requested > stock);
                prop_assert_eq!(raw.quantity("North"), stock);
            }
            Err(CoreError::Validation(_)) => {
                prop_assert_eq!(raw.quantity("North"), stock);
                prop_assert_eq!(packaged.units(category), 0);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn prop_packaged_debit_never_negative(
        category in fixed_category_strategy(),
        stocked in 0i64..50,
        debits in prop::collection::vec(1i64..20, 1..10),
    ) {
        let (catalog, mut packaged) = aligned();
        if stocked > 0 {
            packaged.credit(category, stocked, stocked as f64).unwrap();
        }

        for units in debits {
            let before = packaged.units(category);
            match packaged.debit(category, units, &catalog) {
                Ok(()) => prop_assert_eq!(packaged.units(category), before - units),
                Err(_) => prop_assert_eq!(packaged.units(category), before),
            }
            prop_assert!(packaged.units(category) >= 0);
            prop_assert!(packaged.get(category).unwrap().total_kg >= 0.0);
        }
    }

    #[test]
    fn prop_alignment_matches_catalog(
        removals in prop::collection::vec(0usize..7, 0..4),
        additions in prop::collection::vec("[A-Z][a-z]{2,8}", 0..4),
    ) {
        let (mut catalog, mut packaged) = aligned();
        let seeded: Vec<String> = catalog.names().map(str::to_string).collect();

        for index in removals {
            let _ = catalog.remove(&seeded[index]);
            packaged.align(&catalog);
        }
        for name in additions {
            catalog
                .upsert(CategoryInput {
                    category: name,
                    weight_info: "1.5 kg".to_string(),
                    price: Some(Money::from_cents(999)),
                })
                .unwrap();
            packaged.align(&catalog);
        }

        let mut expected: Vec<&str> = catalog.names().collect();
        let mut actual: Vec<&str> = packaged.records().iter().map(|i| i.category.as_str()).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn prop_progressive_tax_is_monotonic(a in 0i64..10_000_000, b in 0i64..10_000_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let tax_low = progressive_tax(Money::from_cents(low));
        let tax_high = progressive_tax(Money::from_cents(high));
        prop_assert!(tax_low <= tax_high);
        // never more than the top marginal rate
        prop_assert!(tax_high.cents() <= high / 5 + 4);
    }
}
