use serde::{Deserialize, Serialize};

use crate::{Job, Neutralization};

/// Truncation sent with every simulation.
pub const DEFAULT_TRUNCATION: f64 = 0.08;

/// Settings block of a simulation request, in the platform's wire layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSettings {
    pub instrument_type: String,
    pub region: String,
    pub universe: String,
    pub delay: u32,
    pub decay: u32,
    pub neutralization: Neutralization,
    pub truncation: f64,
    pub pasteurization: String,
    pub unit_handling: String,
    pub nan_handling: String,
    pub language: String,
    pub visualization: bool,
}

impl SimulationSettings {
    pub fn for_job(job: &Job) -> Self {
        Self {
            instrument_type: "EQUITY".into(),
            region: job.region().to_string(),
            universe: job.universe().to_string(),
            delay: job.delay(),
            decay: job.decay(),
            neutralization: job.neutralization(),
            truncation: DEFAULT_TRUNCATION,
            pasteurization: "ON".into(),
            unit_handling: "VERIFY".into(),
            nan_handling: "OFF".into(),
            language: "FASTEXPR".into(),
            visualization: false,
        }
    }
}

/// Body of `POST /simulations` for a single regular alpha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: SimulationSettings,
    pub regular: String,
}

impl From<&Job> for SimulationRequest {
    fn from(job: &Job) -> Self {
        Self {
            kind: "REGULAR".into(),
            settings: SimulationSettings::for_job(job),
            regular: job.expression().to_string(),
        }
    }
}
