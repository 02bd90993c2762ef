use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use docvoice_server::{create_router, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    // A missing .env file is the normal case outside local development.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let config = ServerConfig::parse();

    if config.speech_api_key().is_none() {
        warn!("GOOGLE_SPEECH_API_KEY is not set; /api/transcribe reports a configuration error");
    }

    let service = config.build_service();
    let router = create_router(AppState::new(service), &config.router_config());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        version = app_version,
        bind = %config.bind,
        model = %config.openai_model,
        workers = config.worker_limit,
        started_at = %Utc::now().to_rfc3339(),
        "docvoice-server boot"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server stopped with an error")?;

    info!("docvoice-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "unable to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
