//! # Store
//!
//! The persistence seam of the tracker and the typed snapshot it mirrors.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KeyValueStore contents                               │
//! │                                                                         │
//! │  key                      value (JSON)                                 │
//! │  ─────────────────────    ───────────────────────────────────────       │
//! │  farmers                  [Farmer, ...]                                 │
//! │  purchases                [Purchase, ...]                               │
//! │  orders                   [Order, ...]                                  │
//! │  inventoryItems           [RawInventoryItem, ...]                       │
//! │  categoryPricing          [CategoryPricing, ...]                        │
//! │  packagedInventory        [PackagedInventoryItem, ...]                  │
//! │  packagedReorderLevels    { "<category>": units, ... }                  │
//! │                                                                         │
//! │  Missing key  ──► seeded default (catalog, packaged) or empty list      │
//! │  Corrupt JSON ──► StorageError::Decode (never silently reset)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is a mirror, not a transaction log: after every mutation the
//! tracker rewrites the whole collections it touched.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::farmers::FarmerRegistry;
use crate::orders::OrderLedger;
use crate::packaged::PackagedInventory;
use crate::purchases::PurchaseLedger;
use crate::raw_inventory::RawInventory;

// =============================================================================
// Storage Error
// =============================================================================

/// Failures reported by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// A collection could not be turned into JSON.
    #[error("Failed to encode '{key}': {reason}")]
    Encode { key: String, reason: String },

    /// A stored value is not valid for its collection.
    #[error("Failed to decode '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// The backing store itself failed (disk, database, channel).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

// =============================================================================
// KeyValueStore
// =============================================================================

/// Synchronous key/value persistence collaborator.
///
/// Implementations must return what they were last given for a key.
/// `harvest-db` provides a SQLite-backed implementation; [`MemoryStore`]
/// serves tests and ephemeral sessions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Removes every key.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// In-process store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

// =============================================================================
// Collections
// =============================================================================

/// One persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Farmers,
    Purchases,
    Orders,
    RawInventory,
    Catalog,
    PackagedInventory,
    PackagedReorderLevels,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Farmers,
        Collection::Purchases,
        Collection::Orders,
        Collection::RawInventory,
        Collection::Catalog,
        Collection::PackagedInventory,
        Collection::PackagedReorderLevels,
    ];

    /// Storage key for this collection.
    pub const fn key(&self) -> &'static str {
        match self {
            Collection::Farmers => "farmers",
            Collection::Purchases => "purchases",
            Collection::Orders => "orders",
            Collection::RawInventory => "inventoryItems",
            Collection::Catalog => "categoryPricing",
            Collection::PackagedInventory => "packagedInventory",
            Collection::PackagedReorderLevels => "packagedReorderLevels",
        }
    }
}

fn load_key<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Decode {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Value, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Snapshot
// =============================================================================

/// Every ledger, owned together.
///
/// Cross-ledger invariants (packaged categories match the catalog, every
/// farmer region has a raw item) are re-established by [`Snapshot::load`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub farmers: FarmerRegistry,
    pub purchases: PurchaseLedger,
    pub orders: OrderLedger,
    pub raw: RawInventory,
    pub catalog: Catalog,
    pub packaged: PackagedInventory,
}

impl Snapshot {
    /// Fresh state: seeded catalog, zeroed packaged ledger, nothing else.
    pub fn seeded(default_reorder_level: i64) -> Self {
        let catalog = Catalog::seeded();
        let mut packaged = PackagedInventory::new(default_reorder_level);
        packaged.align(&catalog);

        Snapshot {
            farmers: FarmerRegistry::default(),
            purchases: PurchaseLedger::default(),
            orders: OrderLedger::default(),
            raw: RawInventory::new(default_reorder_level as f64),
            catalog,
            packaged,
        }
    }

    /// Reads every collection, seeding the ones that are missing.
    pub fn load<S: KeyValueStore + ?Sized>(
        store: &S,
        default_reorder_level: i64,
    ) -> Result<Self, StorageError> {
        let mut snapshot = Snapshot::seeded(default_reorder_level);

        if let Some(farmers) = load_key(store, Collection::Farmers.key())? {
            snapshot.farmers = FarmerRegistry::from_records(farmers);
        }
        if let Some(purchases) = load_key(store, Collection::Purchases.key())? {
            snapshot.purchases = PurchaseLedger::from_records(purchases);
        }
        if let Some(orders) = load_key(store, Collection::Orders.key())? {
            snapshot.orders = OrderLedger::from_records(orders);
        }
        if let Some(items) = load_key(store, Collection::RawInventory.key())? {
            snapshot.raw = RawInventory::from_records(items, default_reorder_level as f64);
        }
        if let Some(categories) = load_key(store, Collection::Catalog.key())? {
            snapshot.catalog = Catalog::from_records(categories);
        }

        let items = load_key(store, Collection::PackagedInventory.key())?;
        let levels: Option<BTreeMap<String, i64>> =
            load_key(store, Collection::PackagedReorderLevels.key())?;
        if items.is_some() || levels.is_some() {
            snapshot.packaged = PackagedInventory::from_records(
                items.unwrap_or_default(),
                levels.unwrap_or_default(),
                default_reorder_level,
            );
        }

        snapshot.packaged.align(&snapshot.catalog);
        let added = snapshot.raw.ensure_categories(snapshot.farmers.regions());

        info!(
            farmers = snapshot.farmers.len(),
            purchases = snapshot.purchases.len(),
            orders = snapshot.orders.len(),
            categories = snapshot.catalog.len(),
            raw_items_added = added,
            "Tracker state loaded"
        );

        Ok(snapshot)
    }

    /// Encodes one collection as its stored JSON value.
    pub fn encode(&self, collection: Collection) -> Result<Value, StorageError> {
        let key = collection.key();
        match collection {
            Collection::Farmers => encode(key, self.farmers.records()),
            Collection::Purchases => encode(key, self.purchases.records()),
            Collection::Orders => encode(key, self.orders.records()),
            Collection::RawInventory => encode(key, self.raw.records()),
            Collection::Catalog => encode(key, self.catalog.records()),
            Collection::PackagedInventory => encode(key, self.packaged.records()),
            Collection::PackagedReorderLevels => encode(key, self.packaged.reorder_levels()),
        }
    }

    /// Writes the given collections, attempting all of them.
    ///
    /// Returns the first failure after every write has been tried.
    pub fn persist<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        collections: &[Collection],
    ) -> Result<(), StorageError> {
        let mut first_error = None;

        for collection in collections {
            let result = self
                .encode(*collection)
                .and_then(|value| store.set(collection.key(), value));

            match result {
                Ok(()) => debug!(key = collection.key(), "Collection persisted"),
                Err(e) => {
                    tracing::warn!(key = collection.key(), error = %e, "Failed to persist collection");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
