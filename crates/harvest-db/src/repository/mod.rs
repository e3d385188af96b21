//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SqliteStore writer / dashboard task                                   │
//! │       │                                                                 │
//! │       │  db.records().put("orders", json)                              │
//! │       ▼                                                                 │
//! │  RecordRepository                                                      │
//! │  ├── get(&self, key)                                                   │
//! │  ├── put(&self, key, value)                                            │
//! │  ├── delete(&self, key)                                                │
//! │  ├── list(&self) / load_all(&self)                                     │
//! │  └── clear(&self)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  records(key, value, updated_at)                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`records::RecordRepository`] - Collection documents keyed by name

pub mod records;
