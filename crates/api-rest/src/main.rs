//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development against the HTTP surface only. The workspace's main `agapay-run`
//! binary serves the same router and additionally reports the resolved configuration at startup.

use agapay_core::config::{barangay_from_env_value, data_dir_from_env_value};
use agapay_core::history::PatientHistory;
use agapay_core::store::FileStore;
use agapay_core::CoreConfig;
use agapay_gateway::{
    temperature_from_env_value, timeout_from_env_value, AgapayAssistant, GatewayConfig,
    OpenAiGateway, DEFAULT_API_URL, DEFAULT_MODEL,
};
use api_rest::{router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Agapay REST API server
///
/// # Environment Variables
/// - `AGAPAY_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `AGAPAY_DATA_DIR`, `AGAPAY_BARANGAY`: storage location and assigned barangay
/// - `API_KEY`, `AGAPAY_LLM_URL`, `AGAPAY_LLM_MODEL`, `AGAPAY_LLM_TEMPERATURE`,
///   `AGAPAY_LLM_TIMEOUT_SECS`: model gateway
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid or the data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("AGAPAY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("AGAPAY_DATA_DIR").ok()),
        &barangay_from_env_value(std::env::var("AGAPAY_BARANGAY").ok()),
    )?);

    let gateway_cfg = GatewayConfig::new(std::env::var("API_KEY").ok())
        .with_api_url(std::env::var("AGAPAY_LLM_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()))
        .with_model(std::env::var("AGAPAY_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()))
        .with_temperature(temperature_from_env_value(
            std::env::var("AGAPAY_LLM_TEMPERATURE").ok(),
        )?)
        .with_timeout(timeout_from_env_value(
            std::env::var("AGAPAY_LLM_TIMEOUT_SECS").ok(),
        )?);
    let assistant = AgapayAssistant::new(Arc::new(OpenAiGateway::new(gateway_cfg)?));

    let history = PatientHistory::new(Arc::new(FileStore::open(cfg.store_dir())?));
    let app = router(AppState::new(cfg, assistant, history)?);

    tracing::info!("-- Starting Agapay REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
