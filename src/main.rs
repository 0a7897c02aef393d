use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agapay_core::CoreConfig;
use agapay_core::config::{barangay_from_env_value, data_dir_from_env_value};
use agapay_core::history::PatientHistory;
use agapay_core::store::FileStore;
use agapay_gateway::{
    AgapayAssistant, DEFAULT_API_URL, DEFAULT_MODEL, GatewayConfig, OpenAiGateway,
    temperature_from_env_value, timeout_from_env_value,
};
use api_rest::{AppState, router};

/// Main entry point for the Agapay application
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`) until Ctrl-C.
///
/// A missing `API_KEY` is not a startup error: every model-backed screen keeps working with its
/// fallback output, and the missing credential is logged on each call.
///
/// # Environment Variables
/// - `AGAPAY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `AGAPAY_DATA_DIR`: Directory for local patient storage (default: "agapay_data")
/// - `AGAPAY_BARANGAY`: Barangay stamped onto new records (default: "San Jose")
/// - `API_KEY`: Credential for the model provider
/// - `AGAPAY_LLM_URL`, `AGAPAY_LLM_MODEL`, `AGAPAY_LLM_TEMPERATURE`, `AGAPAY_LLM_TIMEOUT_SECS`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agapay=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("AGAPAY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

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

    tracing::info!("++ Data directory: {}", cfg.data_dir().display());
    tracing::info!("++ Barangay: {}", cfg.barangay());
    tracing::info!("++ Model gateway: {:?}", gateway_cfg);
    if gateway_cfg.api_key().is_none() {
        tracing::warn!("API_KEY is not set; model-backed screens will use fallback output");
    }

    let assistant = AgapayAssistant::new(Arc::new(OpenAiGateway::new(gateway_cfg)?));
    let history = PatientHistory::new(Arc::new(FileStore::open(cfg.store_dir())?));
    let app = router(AppState::new(cfg, assistant, history)?);

    tracing::info!("++ Starting Agapay REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("-- Agapay stopped");
    Ok(())
}
