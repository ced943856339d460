// ── Scrape orchestration ──
//
// One scrape: validate the request, resolve the target, register every
// requested probe on a fresh registry, populate them all, then emit and
// render. A failure anywhere returns before anything is rendered.

use std::sync::Arc;

use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use tracing::{debug, info};

use eaton_api::{DeviceClient, TransportConfig};
use eaton_config::ConfigStore;

use crate::error::ScrapeError;
use crate::module::Module;
use crate::probe::Probe;

/// Query parameters of the scrape endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScrapeParams {
    pub target: Option<String>,
    pub module: Option<String>,
}

impl ScrapeParams {
    pub fn new(target: impl Into<String>, module: Option<&str>) -> Self {
        Self {
            target: Some(target.into()),
            module: module.map(str::to_owned),
        }
    }
}

/// Runs scrapes against targets from a shared, read-only config store.
#[derive(Clone)]
pub struct Scraper {
    store: Arc<ConfigStore>,
    transport: TransportConfig,
}

impl Scraper {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let transport = TransportConfig::default().with_timeout(store.exporter().timeout());
        Self { store, transport }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Run one scrape and return the rendered text exposition.
    pub async fn scrape(&self, params: &ScrapeParams) -> Result<String, ScrapeError> {
        let target_name = params
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ScrapeError::MissingTarget)?;

        let modules = Module::parse_list(params.module.as_deref())?;

        let target = self
            .store
            .resolve(target_name)
            .map_err(|source| ScrapeError::Target {
                target: target_name.into(),
                source,
            })?;

        let exporter = self.store.exporter();
        let client = DeviceClient::new(
            target.base_url.clone(),
            &exporter.base_path,
            target.credentials.clone(),
            &self.transport,
        )?;

        let mut probes: Vec<Probe> = modules
            .iter()
            .map(|&module| Probe::new(module, &exporter.base_path, self.store.probes()))
            .collect();

        let registry = Registry::new();
        for probe in &mut probes {
            probe.register_metrics(&registry)?;
        }

        for probe in &mut probes {
            debug!(
                pdu = %target.name,
                module = %probe.module(),
                path = probe.endpoint_path(),
                "populating probe"
            );
            probe.populate(&client).await?;
        }

        for probe in &probes {
            probe.emit();
        }

        let body = render(&registry)?;
        info!(pdu = %target.name, modules = ?modules, "scrape complete");
        Ok(body)
    }
}

/// Render `registry` in the Prometheus text exposition format.
pub fn render(registry: &Registry) -> Result<String, ScrapeError> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| ScrapeError::Metrics(prometheus::Error::Msg(e.to_string())))
}
