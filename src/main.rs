use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use clap::Parser;
use katalog::client::ReqwestClient;
use katalog::config::{Cli, Command, Config, default_config_path};
use katalog::handler::{fallback, healthcheck};
use katalog::proxy::{self, ProxyState};
use katalog::cli;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let loaded = match &args.config_path {
        Some(path) => Config::new(path),
        None => Config::load_or_default(&default_config_path()),
    };
    let cfg = loaded.unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?args.config_path, "failed to load config file");
        std::process::exit(1);
    });

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(cfg).await;
            Ok(())
        }
        Command::Books { action } => cli::run_books(&cfg, action).await,
        Command::Stats { action } => cli::run_stats(&cfg, action).await,
        Command::Users { search } => cli::run_users(&cfg, search).await,
        Command::Destinations { city, search } => cli::run_destinations(&cfg, city, search).await,
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e:#}");
        std::process::exit(1);
    }
}

async fn serve(cfg: Config) {
    tracing::info!("katalog.svc starting");

    let upstream = Arc::new(ReqwestClient::new(cfg.app.backend_url.clone()));
    let state = ProxyState::new(
        upstream,
        cfg.proxy.resources.clone(),
        cfg.fetch.read.policy(),
        cfg.fetch.write.policy(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(healthcheck))
        .nest("/api", proxy::routes::<ReqwestClient>())
        .fallback(fallback)
        .layer(cors)
        .with_state(state);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let cancellation_token = CancellationToken::new();
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
        shutdown_token.cancel();
    });

    tracing::info!(backend = %cfg.app.backend_url, "katalog.svc running on {}", &address);
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await
    {
        tracing::error!(error = %err, "server stopped unexpectedly");
        std::process::exit(1);
    }

    tracing::info!("katalog.svc going off, graceful shutdown complete");
}
