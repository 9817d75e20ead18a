use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use todo_manager::api::auth::SessionKeys;
use todo_manager::app_env::AppConfig;
use todo_manager::{api, logging, persistence, SharedData};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    let config = AppConfig::from_env().context("reading configuration")?;

    let telemetry = match &config.otel_export_urls {
        Some((span_url, metric_url)) => Some(logging::Telemetry::export_to(span_url, metric_url)?),
        None => None,
    };
    logging::install_subscriber(logging::log_filter()?, telemetry);

    let pool = persistence::connect_sqlx(&config.db_url)
        .await
        .context("connecting to the database")?;
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(pool),
        session_keys: SessionKeys::new(&config.jwt_secret, config.session_ttl),
    });

    let router = logging::trace_requests(api::build_router(shared_data));
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding to {}", config.bind_address))?;

    info!("Starting server on {}", config.bind_address);
    axum::serve(listener, router).await.context("running the server")?;

    Ok(())
}
