//! # harvest-core: Ledger Logic for Harvest Ledger
//!
//! Farmers, purchases, raw and packaged stock, orders and the analytics
//! derived from them. Everything here is synchronous and free of I/O apart
//! from the [`store::KeyValueStore`] seam.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Harvest Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               harvest-tracker (JSON-lines adapter)              │   │
//! │  │    record_purchase, package, place_order, analyze, export ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ harvest-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ farmers  │ │ purchases│ │  orders  │ │ finance/forecast │  │   │
//! │  │   │ catalog  │ │   raw    │ │ packaged │ │ alerts/report    │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                 Tracker ──► EventHub ──► listeners              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ KeyValueStore                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                harvest-db (SQLite mirror)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Farmer, Purchase, Order, inventory items)
//! - [`money`] - Integer-cent Money
//! - [`error`] - `CoreError` and batched validation errors
//! - [`validation`] - Field validators
//! - [`catalog`], [`raw_inventory`], [`packaged`], [`packaging`] - Stock
//! - [`farmers`], [`purchases`], [`orders`] - Ledgers
//! - [`finance`], [`forecast`], [`alerts`], [`report`], [`dashboard`] - Analytics
//! - [`export`] - CSV
//! - [`events`], [`store`], [`tracker`] - Orchestration and persistence
//!
//! ## Example Usage
//!
//! ```rust
//! use harvest_core::store::MemoryStore;
//! use harvest_core::{Tracker, TrackerSettings};
//!
//! let tracker = Tracker::new(MemoryStore::new(), TrackerSettings::default()).unwrap();
//! assert_eq!(tracker.snapshot().catalog.len(), 7);
//! assert!(tracker.purchases().is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod catalog;
pub mod clock;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod export;
pub mod farmers;
pub mod finance;
pub mod forecast;
pub mod money;
pub mod orders;
pub mod packaged;
pub mod packaging;
pub mod purchases;
pub mod raw_inventory;
pub mod report;
pub mod store;
pub mod tracker;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use events::{DerivedUpdate, EventListener, LedgerEvent};
pub use money::Money;
pub use store::{KeyValueStore, MemoryStore, Snapshot, StorageError};
pub use tracker::{Tracker, TrackerSettings};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reorder level for raw items and packaged categories when none is set.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Storage location of raw items created by purchases.
pub const DEFAULT_STORAGE_LOCATION: &str = "Main Warehouse";
