//! Load the demo catalog into the database.
//!
//! Same operation as `POST /admin/seed`. Safe to run repeatedly.

use std::sync::Arc;

use darkroom_server::db::{Clock, Repositories, SystemClock};
use darkroom_server::services::seed_catalog;

use super::{CommandError, connect};

/// Upsert the demo products and reset pricing to the defaults.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repos = Repositories::postgres(&pool, &clock);

    let count = seed_catalog(&repos, clock.as_ref()).await?;

    tracing::info!(products = count, "Demo catalog seeded");
    Ok(())
}
