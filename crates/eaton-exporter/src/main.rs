mod cli;
mod error;
mod server;
mod telemetry;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use eaton_config::ConfigStore;
use eaton_core::Scraper;

use crate::cli::{Cli, LogFormat};
use crate::error::ExporterError;
use crate::server::AppState;
use crate::telemetry::Telemetry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.filter_directives()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    let store = ConfigStore::load(&cli.config_file).map_err(|source| ExporterError::Config {
        path: cli.config_file.display().to_string(),
        source,
    })?;

    for section in store.unknown_sections() {
        warn!(section, "ignoring config section without the connection: prefix");
    }
    info!(
        path = %cli.config_file.display(),
        targets = store.targets().count(),
        "configuration loaded"
    );

    let state = AppState {
        scraper: Scraper::new(Arc::new(store)),
        telemetry: Arc::new(Telemetry::new()?),
    };

    let addr = cli.listen_address;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Bind { addr, source })?;
    info!(%addr, "listening");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ExporterError::Serve)?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
