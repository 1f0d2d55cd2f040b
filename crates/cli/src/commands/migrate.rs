//! Database migration command.

use groenmarkt_api::db;

/// Run all pending API migrations.
///
/// # Errors
///
/// Returns an error when the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("running API migrations");
    sqlx::migrate!("../api/migrations").run(&pool).await?;
    tracing::info!("migrations complete");

    Ok(())
}
