// Exporter self-metrics
//
// A process-wide registry served on `/metrics`, separate from the
// per-scrape registries that hold device measurements.

use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

use eaton_core::ScrapeError;

pub struct Telemetry {
    registry: Registry,
    scrapes: IntCounterVec,
    duration: Histogram,
}

impl Telemetry {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let scrapes = IntCounterVec::new(
            Opts::new(
                "eaton_exporter_scrapes_total",
                "Scrape requests handled, by result",
            ),
            &["result"],
        )?;
        let duration = Histogram::with_opts(HistogramOpts::new(
            "eaton_exporter_scrape_duration_seconds",
            "Time spent answering scrape requests",
        ))?;
        registry.register(Box::new(scrapes.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        Ok(Self {
            registry,
            scrapes,
            duration,
        })
    }

    pub fn observe<T>(&self, result: &Result<T, ScrapeError>, elapsed: Duration) {
        let label = match result {
            Ok(_) => "success",
            Err(err) if err.is_client_error() => "client_error",
            Err(_) => "error",
        };
        self.scrapes.with_label_values(&[label]).inc();
        self.duration.observe(elapsed.as_secs_f64());
    }

    pub fn render(&self) -> Result<String, ScrapeError> {
        eaton_core::render(&self.registry)
    }
}
