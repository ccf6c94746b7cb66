//! Database migrations.
//!
//! ```bash
//! darkroom migrate
//! ```
//!
//! Migration files live in `crates/server/migrations/` and are embedded in
//! the binary at build time.

use darkroom_server::db::MIGRATOR;

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
