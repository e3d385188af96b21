//! Harvest Ledger tracker entry point.
//!
//! All setup lives in [`harvest_tracker::run`].

use harvest_tracker::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    harvest_tracker::run(CliArgs::parse(std::env::args())).await
}
