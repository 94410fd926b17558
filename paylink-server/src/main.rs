//! Paylink Server
//!
//! Serves the contact form, payment registration, client payment links and
//! the admin panel API.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paylink_server::{routes, AppState, Config, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paylink_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    // Open the store and bring the schema up to date before accepting requests
    let store = SqliteStore::open(config.database_path())?;
    store.migrate(&config.legacy_link_token)?;
    tracing::info!(path = config.database_path(), "Database ready");

    let state = Arc::new(AppState::new(
        store,
        config.public_base_url.clone(),
        config.payment_defaults(),
    ));

    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
