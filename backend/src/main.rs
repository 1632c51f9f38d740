//! Cropwise advisory platform - backend server

use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cropwise_backend::{
    create_app,
    external::{GenerativeClient, WeatherClient},
    pipeline::PipelineRegistry,
    services::{PgLocationStore, SoilAdvisoryService},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cropwise_server=debug,cropwise_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Cropwise Advisory Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Outbound providers
    let weather = WeatherClient::new(&config.weather)?;
    let generative = GenerativeClient::new(&config.generative)?;
    let advisor = SoilAdvisoryService::new(generative, &config.generative);
    let locations = PgLocationStore::new(db_pool.clone());

    let pipelines = PipelineRegistry::new(Arc::new(weather), Arc::new(advisor), Arc::new(locations));

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        pipelines: Arc::new(pipelines),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
