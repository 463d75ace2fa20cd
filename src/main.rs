use dotenvy::dotenv;
use stockroom::{
    config::{database, settings},
    core::{report::DashboardSummary, user},
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml, or run with defaults
    let app_config = settings::load_default_config().unwrap_or_else(|e| {
        warn!("Using default configuration: {}", e);
        settings::AppConfig::default()
    });

    // 4. Open the store and ensure the schema
    let database_url = database::get_database_url(app_config.database_url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Bootstrap accounts
    let seeded = user::seed_users(
        &db,
        &app_config.seed_users,
        Some(app_config.security.bcrypt_cost),
    )
    .await
    .inspect_err(|e| error!("Failed to seed users: {}", e))?;
    info!("Seeded {} user account(s)", seeded);

    // 6. Report the current state of the shop
    let summary = DashboardSummary::load_or_default(&db, &app_config.dashboard).await;
    info!(
        products = summary.product_count,
        stock_value = summary.stock_value,
        total_revenue = summary.total_revenue,
        sales_today = summary.sales_today,
        daily_average = summary.daily_average,
        "Stockroom ready"
    );
    for top in &summary.top_sellers {
        info!("Top seller: {} ({} sold)", top.product_name, top.total_quantity);
    }

    Ok(())
}
