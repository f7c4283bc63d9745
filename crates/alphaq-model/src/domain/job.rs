use serde::{Deserialize, Serialize};

use crate::{JobId, Neutralization, Tags};

/// One unit of remote work: a factor expression plus its simulation settings.
///
/// Jobs are immutable once built; the `with_*` methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    id: JobId,
    region: String,
    universe: String,
    decay: u32,
    delay: u32,
    neutralization: Neutralization,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Tags,
}

impl Job {
    /// Create a job for `expression` with USA/TOP3000, decay 6, delay 1, subindustry neutralization.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            id: JobId::from(expression.into()),
            region: "USA".to_string(),
            universe: "TOP3000".to_string(),
            decay: 6,
            delay: 1,
            neutralization: Neutralization::Subindustry,
            tags: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>, universe: impl Into<String>) -> Self {
        self.region = region.into();
        self.universe = universe.into();
        self
    }

    pub fn with_decay(mut self, decay: u32) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_neutralization(mut self, neutralization: Neutralization) -> Self {
        self.neutralization = neutralization;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Ledger identity; equal to the expression.
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn expression(&self) -> &str {
        self.id.as_str()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn universe(&self) -> &str {
        &self.universe
    }

    pub fn decay(&self) -> u32 {
        self.decay
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn neutralization(&self) -> Neutralization {
        self.neutralization
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}
