// Branch circuit probe
//
// `{base}/powerDistributions/1/branches` is a collection; every member is
// one branch circuit with its measures, status, and breaker state.

use prometheus::{GaugeVec, Registry};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::debug;

use eaton_api::DeviceClient;
use eaton_config::BranchProbeSettings;

use super::{Identification, Measures, Status, flag_value, register_gauge_vec};

const BRANCHES_PATH: &str = "/powerDistributions/1/branches";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchStatus {
    #[serde(flatten)]
    status: Status,
    #[serde(default)]
    breaker_tripped: bool,
}

/// One member of the branch collection.
#[derive(Debug, Deserialize)]
struct BranchDocument {
    #[serde(default)]
    measures: Measures,
    #[serde(default, alias = "Identification")]
    identification: Identification,
    #[serde(default)]
    status: BranchStatus,
    /// Present only when an empty collection came back as its own leaf.
    #[serde(default)]
    members: Option<IgnoredAny>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchReading {
    pub name: String,
    pub current: f64,
    pub percent_load: f64,
    pub voltage: f64,
    pub status: Status,
    pub breaker_tripped: bool,
}

struct BranchGauges {
    status: GaugeVec,
    breaker: GaugeVec,
    voltage: GaugeVec,
    current: GaugeVec,
    load: GaugeVec,
}

pub struct BranchProbe {
    path: String,
    voltage_field: String,
    branches: Vec<BranchReading>,
    gauges: Option<BranchGauges>,
}

impl BranchProbe {
    pub fn new(base_path: &str, settings: &BranchProbeSettings) -> Self {
        Self {
            path: format!("{}{BRANCHES_PATH}", base_path.trim_end_matches('/')),
            voltage_field: settings.voltage_field.clone(),
            branches: Vec::new(),
            gauges: None,
        }
    }

    pub fn endpoint_path(&self) -> &str {
        &self.path
    }

    pub fn branches(&self) -> &[BranchReading] {
        &self.branches
    }

    pub fn register_metrics(&mut self, registry: &Registry) -> prometheus::Result<()> {
        self.gauges = Some(BranchGauges {
            status: register_gauge_vec(
                registry,
                "eaton_pdu_branch_status",
                "PDU branch status",
                &["branch", "operating"],
            )?,
            load: register_gauge_vec(
                registry,
                "eaton_pdu_branch_percent_load",
                "PDU branch percent load (%)",
                &["branch"],
            )?,
            voltage: register_gauge_vec(
                registry,
                "eaton_pdu_branch_voltage",
                "PDU branch voltage (V)",
                &["branch"],
            )?,
            current: register_gauge_vec(
                registry,
                "eaton_pdu_branch_current",
                "PDU branch current (A)",
                &["branch"],
            )?,
            breaker: register_gauge_vec(
                registry,
                "eaton_pdu_branch_breaker_tripped",
                "PDU branch breaker tripped",
                &["branch"],
            )?,
        });
        Ok(())
    }

    pub async fn populate(&mut self, client: &DeviceClient) -> Result<(), eaton_api::Error> {
        let branches: Vec<BranchDocument> = client.expand_as(&self.path).await?;

        self.branches = branches
            .into_iter()
            .filter(|branch| branch.members.is_none())
            .map(|branch| BranchReading {
                name: branch.identification.physical_name,
                current: branch.measures.get("current"),
                percent_load: branch.measures.get("percentLoad"),
                voltage: branch.measures.get(&self.voltage_field),
                status: branch.status.status,
                breaker_tripped: branch.status.breaker_tripped,
            })
            .collect();

        debug!(path = %self.path, branches = self.branches.len(), "branches populated");
        Ok(())
    }

    pub fn emit(&self) {
        let Some(gauges) = &self.gauges else {
            return;
        };

        for branch in &self.branches {
            let name = branch.name.as_str();
            gauges.load.with_label_values(&[name]).set(branch.percent_load);
            gauges.voltage.with_label_values(&[name]).set(branch.voltage);
            gauges.current.with_label_values(&[name]).set(branch.current);
            gauges
                .status
                .with_label_values(&[name, branch.status.operating.as_str()])
                .set(branch.status.health_value());
            gauges
                .breaker
                .with_label_values(&[name])
                .set(flag_value(branch.breaker_tripped));
        }
    }
}
