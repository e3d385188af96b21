//! # Farmer Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert_farmer ──► FarmerRegistry::upsert ──► raw category for region   │
//! │  remove_farmer ──► no cascade: purchases keep the dangling farmer id    │
//! │  list_farmers / search_farmers ──► read only                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use harvest_core::{Clock, Farmer, KeyValueStore, Upsert};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::TrackerState;

/// Result of a create-or-update command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse<T> {
    pub outcome: Upsert,
    pub record: T,
}

/// Creates or updates a farmer keyed by `farmerId`.
pub async fn upsert_farmer<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    farmer: Farmer,
) -> Result<UpsertResponse<Farmer>, ApiError> {
    debug!(farmer_id = %farmer.farmer_id, "upsert_farmer command");

    let mut tracker = state.lock().await;
    let farmer_id = farmer.farmer_id.trim().to_string();
    let outcome = tracker.upsert_farmer(farmer)?;

    let record = tracker
        .farmers()
        .iter()
        .find(|f| f.farmer_id == farmer_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Farmer", &farmer_id))?;

    info!(farmer_id = %farmer_id, ?outcome, "Farmer saved");
    Ok(UpsertResponse { outcome, record })
}

pub async fn remove_farmer<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    farmer_id: String,
) -> Result<Farmer, ApiError> {
    debug!(farmer_id = %farmer_id, "remove_farmer command");
    let removed = state.with_tracker_mut(|t| t.remove_farmer(&farmer_id)).await?;
    Ok(removed)
}

pub async fn list_farmers<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
) -> Result<Vec<Farmer>, ApiError> {
    Ok(state.with_tracker(|t| t.farmers().to_vec()).await)
}

/// Case-insensitive match on id, name or region.
pub async fn search_farmers<S: KeyValueStore, C: Clock>(
    state: &TrackerState<S, C>,
    query: String,
) -> Result<Vec<Farmer>, ApiError> {
    debug!(query = %query, "search_farmers command");
    let found = state
        .with_tracker(|t| t.search_farmers(&query).into_iter().cloned().collect())
        .await;
    Ok(found)
}
