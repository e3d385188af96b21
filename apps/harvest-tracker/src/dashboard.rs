//! # Dashboard Refresher
//!
//! Periodically rebuilds the dashboard figures straight from SQLite and
//! logs them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dashboard Refresh Loop                               │
//! │                                                                         │
//! │   every refresh_interval_secs                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │   records().mirror() ──► MemoryStore ──► Snapshot::load                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │   DashboardStats ──► info!(revenue, active_orders, low_stock, ...)     │
//! │                                                                         │
//! │   Never touches the live tracker: it reads what has been flushed,      │
//! │   so it can lag the ledgers by the writer queue.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use harvest_core::dashboard::DashboardStats;
use harvest_core::Snapshot;
use harvest_db::Database;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::ApiError;

/// Rebuilds the dashboard figures from the stored documents.
pub async fn refresh(db: &Database, default_reorder_level: i64) -> Result<DashboardStats, ApiError> {
    let mirror = db.records().mirror().await?;
    let snapshot = Snapshot::load(&mirror, default_reorder_level)?;
    let stats = DashboardStats::from_snapshot(&snapshot);

    info!(
        revenue = %stats.total_revenue,
        active_orders = stats.active_orders,
        low_stock_items = stats.low_stock_items,
        suppliers = stats.suppliers,
        "Dashboard refreshed"
    );
    Ok(stats)
}

/// Background refresher.
pub struct DashboardRefresher {
    db: Database,
    interval: Duration,
    default_reorder_level: i64,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the refresher.
pub struct DashboardHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl DashboardHandle {
    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) {
        // loop may already be gone
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!(?e, "Dashboard refresher panicked");
        }
    }
}

impl DashboardRefresher {
    pub fn new(db: Database, interval: Duration, default_reorder_level: i64) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let refresher = DashboardRefresher {
            db,
            interval,
            default_reorder_level,
            shutdown_rx,
        };
        (refresher, shutdown_tx)
    }

    /// Spawns the loop on the current runtime.
    pub fn spawn(db: Database, interval: Duration, default_reorder_level: i64) -> DashboardHandle {
        let (refresher, shutdown_tx) = DashboardRefresher::new(db, interval, default_reorder_level);
        let task = tokio::spawn(refresher.run());
        DashboardHandle { shutdown_tx, task }
    }

    /// Runs until a shutdown signal arrives or every sender is dropped.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Dashboard refresher starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = refresh(&self.db, self.default_reorder_level).await {
                        error!(error = %e, "Dashboard refresh failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    debug!("Dashboard refresher received shutdown");
                    break;
                }
            }
        }

        info!("Dashboard refresher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{Farmer, Tracker, TrackerSettings};
    use harvest_db::{DbConfig, SqliteStore};

    #[tokio::test]
    async fn test_refresh_reads_flushed_documents() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let empty = refresh(&db, 10).await.unwrap();
        assert_eq!(empty, DashboardStats::default());

        let store = SqliteStore::open(&db).await.unwrap();
        let mut tracker = Tracker::new(store, TrackerSettings::default()).unwrap();
        tracker
            .upsert_farmer(Farmer {
                farmer_id: "F1".to_string(),
                name: "Grace".to_string(),
                phone: "0712345678".to_string(),
                email: "grace@farm.example".to_string(),
                address: "Gate 4".to_string(),
                region: "North".to_string(),
                gps: "-0.42,36.95".to_string(),
            })
            .unwrap();
        tracker.store().flush().await.unwrap();

        let stats = refresh(&db, 10).await.unwrap();
        assert_eq!(stats.suppliers, 1);
        // empty "North" raw item sits below the reorder level
        assert_eq!(stats.low_stock_items, 1);
    }

    #[tokio::test]
    async fn test_refresher_stops_on_shutdown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let handle = DashboardRefresher::spawn(db, Duration::from_millis(10), 10);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .unwrap();
    }
}
