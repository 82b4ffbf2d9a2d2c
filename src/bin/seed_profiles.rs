//! Insert demo profiles around an existing user.
//!
//! Usage: `seed_profiles <telegram_id>`

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::env;
use tracing::info;

use mama_match::db::init_database_schema;
use mama_match::logging::init_tracing;
use mama_match::seed::seed_test_profiles;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let telegram_id: i64 = env::args()
        .nth(1)
        .context("Usage: seed_profiles <telegram_id>")?
        .parse()
        .context("telegram_id must be an integer")?;

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    init_database_schema(&pool).await?;

    let inserted = seed_test_profiles(&pool, telegram_id).await?;
    info!(telegram_id, inserted, "Done");
    Ok(())
}
