// ── Measurement probes ──
//
// One probe per device resource type. A probe lives for a single scrape:
// registered against that scrape's registry, populated from the device,
// emitted, dropped. New resource types are new variants of `Probe`.

mod branch;
mod input;

use prometheus::{Gauge, GaugeVec, Opts, Registry};
use serde::Deserialize;
use serde_json::Value;

use eaton_api::DeviceClient;
use eaton_config::ProbeSettings;

use crate::module::Module;

pub use branch::{BranchProbe, BranchReading};
pub use input::{InputProbe, InputReading, PhaseReading};

/// A probe of one device resource type.
pub enum Probe {
    Input(InputProbe),
    Branch(BranchProbe),
}

impl Probe {
    /// Build the probe for `module`. `base_path` is the device's REST root.
    pub fn new(module: Module, base_path: &str, settings: &ProbeSettings) -> Self {
        match module {
            Module::Input => Self::Input(InputProbe::new(base_path, &settings.input)),
            Module::Branch => Self::Branch(BranchProbe::new(base_path, &settings.branch)),
        }
    }

    pub fn module(&self) -> Module {
        match self {
            Self::Input(_) => Module::Input,
            Self::Branch(_) => Module::Branch,
        }
    }

    /// The resource this probe starts from.
    pub fn endpoint_path(&self) -> &str {
        match self {
            Self::Input(p) => p.endpoint_path(),
            Self::Branch(p) => p.endpoint_path(),
        }
    }

    /// Create this probe's gauges and register them with `registry`.
    pub fn register_metrics(&mut self, registry: &Registry) -> prometheus::Result<()> {
        match self {
            Self::Input(p) => p.register_metrics(registry),
            Self::Branch(p) => p.register_metrics(registry),
        }
    }

    /// Fetch and decode everything this probe reports.
    pub async fn populate(&mut self, client: &DeviceClient) -> Result<(), eaton_api::Error> {
        match self {
            Self::Input(p) => p.populate(client).await,
            Self::Branch(p) => p.populate(client).await,
        }
    }

    /// Write the populated readings into the registered gauges.
    pub fn emit(&self) {
        match self {
            Self::Input(p) => p.emit(),
            Self::Branch(p) => p.emit(),
        }
    }
}

// ── Shared document shapes ───────────────────────────────────────────

/// A resource's `measures` object. Kept loose because key names differ
/// between firmware revisions; values are looked up by configured key.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Measures(serde_json::Map<String, Value>);

impl Measures {
    /// Numeric value of `key`; missing or non-numeric values read as 0.
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or_default()
    }
}

/// `{"operating": "on", "health": "ok"}`
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub operating: String,
    #[serde(default)]
    pub health: String,
}

impl Status {
    pub fn health_value(&self) -> f64 {
        health_value(&self.health)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    #[serde(default)]
    pub physical_name: String,
}

// ── Gauge helpers ────────────────────────────────────────────────────

/// `"ok"` is healthy; everything else, including an empty string, is not.
pub fn health_value(health: &str) -> f64 {
    if health == "ok" { 1.0 } else { 0.0 }
}

pub fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

fn register_gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<Gauge> {
    let gauge = Gauge::new(name, help)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn register_gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> prometheus::Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]

    use super::*;

    #[test]
    fn health_is_binary() {
        assert_eq!(health_value("ok"), 1.0);
        for other in ["", "warning", "critical", "OK", "ok "] {
            assert_eq!(health_value(other), 0.0, "{other:?}");
        }
    }

    #[test]
    fn measures_read_configured_keys() {
        let measures: Measures = serde_json::from_str(
            r#"{"current": 3.25, "voltageLL": 208.1, "percentLoad": 12, "label": "x"}"#,
        )
        .unwrap();

        assert_eq!(measures.get("current"), 3.25);
        assert_eq!(measures.get("voltageLL"), 208.1);
        assert_eq!(measures.get("percentLoad"), 12.0);
        assert_eq!(measures.get("voltage"), 0.0);
        assert_eq!(measures.get("label"), 0.0);
    }

    #[test]
    fn registering_twice_on_one_registry_fails() {
        let registry = Registry::new();
        let settings = ProbeSettings::default();

        let mut first = Probe::new(Module::Input, "/rest", &settings);
        let mut second = Probe::new(Module::Input, "/rest", &settings);

        first.register_metrics(&registry).unwrap();
        assert!(second.register_metrics(&registry).is_err());
        assert!(
            Probe::new(Module::Input, "/rest", &settings)
                .register_metrics(&Registry::new())
                .is_ok()
        );
    }
}
