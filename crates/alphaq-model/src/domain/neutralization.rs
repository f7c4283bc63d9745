use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Risk neutralization applied by the remote simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Neutralization {
    None,
    Market,
    Sector,
    Industry,
    #[default]
    Subindustry,
}

impl Neutralization {
    /// Wire spelling expected by the simulation API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Neutralization::None => "NONE",
            Neutralization::Market => "MARKET",
            Neutralization::Sector => "SECTOR",
            Neutralization::Industry => "INDUSTRY",
            Neutralization::Subindustry => "SUBINDUSTRY",
        }
    }
}

impl FromStr for Neutralization {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Neutralization::None),
            "MARKET" => Ok(Neutralization::Market),
            "SECTOR" => Ok(Neutralization::Sector),
            "INDUSTRY" => Ok(Neutralization::Industry),
            "SUBINDUSTRY" => Ok(Neutralization::Subindustry),
            _ => Err(ModelError::UnknownNeutralization(s.to_string())),
        }
    }
}

impl fmt::Display for Neutralization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
