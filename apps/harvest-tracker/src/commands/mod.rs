//! # Commands Module
//!
//! Every operation reachable over the JSON-lines channel.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── farmers.rs    ◄─── Farmer registry
//! ├── purchases.rs  ◄─── Purchase ledger, expenses
//! ├── inventory.rs  ◄─── Raw/packaged stock, packaging runs
//! ├── catalog.rs    ◄─── Category pricing
//! ├── orders.rs     ◄─── Order ledger, revenue
//! ├── analytics.rs  ◄─── Finance, forecasts, report, dashboard, alerts
//! └── export.rs     ◄─── CSV exports
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  stdin                                                                  │
//! │  {"id":1,"command":"place_order","args":{"input":{...}}}                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ipc::dispatch ── deserialize args ──► commands::orders::place_order(   │
//! │                                            state: &TrackerState<S>,     │
//! │                                            input: OrderInput,           │
//! │                                        ) -> Result<Order, ApiError>     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stdout                                                                 │
//! │  {"id":1,"ok":true,"data":{"orderId":"O1",...}}                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are generic over the store so tests run them against
//! `MemoryStore`. Borrowed results are cloned before the tracker lock is
//! released.

pub mod analytics;
pub mod catalog;
pub mod export;
pub mod farmers;
pub mod inventory;
pub mod orders;
pub mod purchases;
