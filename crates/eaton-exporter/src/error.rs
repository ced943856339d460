//! Startup errors with miette diagnostics.
//!
//! Scrape failures never end up here; they become HTTP responses.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use eaton_config::ConfigError;

#[derive(Debug, Error, Diagnostic)]
pub enum ExporterError {
    #[error("Could not load configuration from {path}")]
    #[diagnostic(
        code(eaton_exporter::config),
        help(
            "Check that the file exists and is valid TOML.\n\
             Targets live in tables named [\"connection:<name>\"] with host, username and password.\n\
             Use --config.file to point at another file."
        )
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(eaton_exporter::bind),
        help("Another process may already be using this address. Pick one with --web.listen-address.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server stopped unexpectedly")]
    #[diagnostic(code(eaton_exporter::serve))]
    Serve(#[source] std::io::Error),

    #[error("Could not register exporter self-metrics")]
    #[diagnostic(code(eaton_exporter::metrics))]
    Metrics(#[from] prometheus::Error),
}
