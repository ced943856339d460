// Power input probe
//
// `{base}/powerDistributions/1/inputs/1` carries the input's active power
// and status plus a link to its phase collection. Each phase reports
// line-to-line voltage, current, and load.

use prometheus::{Gauge, GaugeVec, Registry};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::debug;

use eaton_api::DeviceClient;
use eaton_config::InputProbeSettings;

use super::{Identification, Measures, Status, register_gauge, register_gauge_vec};

const INPUT_PATH: &str = "/powerDistributions/1/inputs/1";

/// `inputs/1` as the device returns it.
#[derive(Debug, Deserialize)]
struct InputDocument {
    measures: Measures,
    status: Status,
    #[serde(default)]
    phases: PhasesLink,
}

/// `{"@id": ...}` pointing at the phase collection. An empty or missing
/// id means the input has no phases.
#[derive(Debug, Default, Deserialize)]
struct PhasesLink {
    #[serde(default, rename = "@id")]
    id: String,
}

/// One element of the phase collection.
#[derive(Debug, Deserialize)]
struct PhaseDocument {
    #[serde(default)]
    measures: Measures,
    #[serde(default, alias = "Identification")]
    identification: Identification,
    /// Present only when an empty collection came back as its own leaf.
    #[serde(default)]
    members: Option<IgnoredAny>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputReading {
    pub active_power: f64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReading {
    pub name: String,
    pub voltage_ll: f64,
    pub current: f64,
    pub percent_load: f64,
}

struct InputGauges {
    active_power: Gauge,
    status: GaugeVec,
    phase_voltage: GaugeVec,
    phase_current: GaugeVec,
    phase_load: GaugeVec,
}

pub struct InputProbe {
    path: String,
    voltage_field: String,
    input: Option<InputReading>,
    phases: Vec<PhaseReading>,
    gauges: Option<InputGauges>,
}

impl InputProbe {
    pub fn new(base_path: &str, settings: &InputProbeSettings) -> Self {
        Self {
            path: format!("{}{INPUT_PATH}", base_path.trim_end_matches('/')),
            voltage_field: settings.phase_voltage_field.clone(),
            input: None,
            phases: Vec::new(),
            gauges: None,
        }
    }

    pub fn endpoint_path(&self) -> &str {
        &self.path
    }

    pub fn input(&self) -> Option<&InputReading> {
        self.input.as_ref()
    }

    pub fn phases(&self) -> &[PhaseReading] {
        &self.phases
    }

    pub fn register_metrics(&mut self, registry: &Registry) -> prometheus::Result<()> {
        self.gauges = Some(InputGauges {
            active_power: register_gauge(
                registry,
                "eaton_pdu_active_power",
                "PDU active power (W)",
            )?,
            status: register_gauge_vec(
                registry,
                "eaton_pdu_input_status",
                "PDU input status",
                &["operating"],
            )?,
            phase_load: register_gauge_vec(
                registry,
                "eaton_pdu_phase_percent_load",
                "PDU phase percent load (%)",
                &["phase"],
            )?,
            phase_voltage: register_gauge_vec(
                registry,
                "eaton_pdu_phase_voltage_ll",
                "PDU phase voltageLL (V)",
                &["phase"],
            )?,
            phase_current: register_gauge_vec(
                registry,
                "eaton_pdu_phase_current",
                "PDU phase current (A)",
                &["phase"],
            )?,
        });
        Ok(())
    }

    /// Fetch the input, then expand its phase collection if it links one.
    pub async fn populate(&mut self, client: &DeviceClient) -> Result<(), eaton_api::Error> {
        let doc: InputDocument = client.fetch_as(&self.path).await?;

        self.input = Some(InputReading {
            active_power: doc.measures.get("activePower"),
            status: doc.status,
        });

        self.phases.clear();
        if doc.phases.id.is_empty() {
            debug!(path = %self.path, "input has no phase collection");
            return Ok(());
        }

        let phases: Vec<PhaseDocument> = client.expand_as(&doc.phases.id).await?;
        self.phases = phases
            .into_iter()
            .filter(|phase| phase.members.is_none())
            .map(|phase| PhaseReading {
                name: phase.identification.physical_name,
                voltage_ll: phase.measures.get(&self.voltage_field),
                current: phase.measures.get("current"),
                percent_load: phase.measures.get("percentLoad"),
            })
            .collect();

        debug!(path = %self.path, phases = self.phases.len(), "input populated");
        Ok(())
    }

    pub fn emit(&self) {
        let Some(gauges) = &self.gauges else {
            return;
        };

        if let Some(input) = &self.input {
            gauges.active_power.set(input.active_power);
            gauges
                .status
                .with_label_values(&[input.status.operating.as_str()])
                .set(input.status.health_value());
        }

        for phase in &self.phases {
            let labels = [phase.name.as_str()];
            gauges.phase_voltage.with_label_values(&labels).set(phase.voltage_ll);
            gauges.phase_current.with_label_values(&labels).set(phase.current);
            gauges.phase_load.with_label_values(&labels).set(phase.percent_load);
        }
    }
}
