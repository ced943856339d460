//! Clap derive structures for the `eaton-exporter` binary.
//!
//! Flag names follow the Prometheus exporter convention (`--web.*`, `--log.*`).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_CONFIG_FILE: &str = "/etc/prometheus/eaton.toml";
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9795";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// eaton-exporter -- Prometheus metrics for Eaton PDUs
#[derive(Debug, Parser)]
#[command(
    name = "eaton-exporter",
    version,
    about = "Export Eaton PDU measurements as Prometheus metrics",
    long_about = "Serves /eaton?target=<name>&module=<list>. Each request logs in to the\n\
        configured PDU, walks its REST resources, and answers in the Prometheus\n\
        text format."
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long = "config.file", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Address to listen on for scrapes and self-metrics
    #[arg(
        long = "web.listen-address",
        default_value = DEFAULT_LISTEN_ADDRESS,
        value_parser = parse_listen_address
    )]
    pub listen_address: SocketAddr,

    /// Base log level
    #[arg(long = "log.level", default_value = "info", value_parser = LOG_LEVELS)]
    pub log_level: String,

    /// Log level for probe and device request logs
    #[arg(long = "log.prober", default_value = "info", value_parser = LOG_LEVELS)]
    pub log_prober: String,

    /// Log output format
    #[arg(long = "log.format", default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl Cli {
    /// `EnvFilter` directives built from `--log.level` and `--log.prober`.
    pub fn filter_directives(&self) -> String {
        let prober = &self.log_prober;
        format!("{},eaton_core={prober},eaton_api={prober}", self.log_level)
    }
}

/// Accepts `host:port`, or `:port` for every interface.
fn parse_listen_address(raw: &str) -> Result<SocketAddr, String> {
    let raw = raw.trim();
    let candidate = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_owned()
    };
    candidate
        .parse()
        .map_err(|_| format!("expected host:port or :port, got {raw:?}"))
}
