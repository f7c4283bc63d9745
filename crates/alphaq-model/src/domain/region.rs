use std::{fmt, str::FromStr};

use crate::ModelError;

/// Named region/universe pairs used for simulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionPreset {
    #[default]
    Usa,
    Asi,
    Eur,
    Glb,
    Hkg,
    Twn,
    Jpn,
    Kor,
    Chn,
    Amr,
}

impl RegionPreset {
    pub const ALL: [RegionPreset; 10] = [
        RegionPreset::Usa,
        RegionPreset::Asi,
        RegionPreset::Eur,
        RegionPreset::Glb,
        RegionPreset::Hkg,
        RegionPreset::Twn,
        RegionPreset::Jpn,
        RegionPreset::Kor,
        RegionPreset::Chn,
        RegionPreset::Amr,
    ];

    /// Short lowercase key accepted on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            RegionPreset::Usa => "usa",
            RegionPreset::Asi => "asi",
            RegionPreset::Eur => "eur",
            RegionPreset::Glb => "glb",
            RegionPreset::Hkg => "hkg",
            RegionPreset::Twn => "twn",
            RegionPreset::Jpn => "jpn",
            RegionPreset::Kor => "kor",
            RegionPreset::Chn => "chn",
            RegionPreset::Amr => "amr",
        }
    }

    pub fn region(&self) -> &'static str {
        match self {
            RegionPreset::Usa => "USA",
            RegionPreset::Asi => "ASI",
            RegionPreset::Eur => "EUR",
            RegionPreset::Glb => "GLB",
            RegionPreset::Hkg => "HKG",
            RegionPreset::Twn => "TWN",
            RegionPreset::Jpn => "JPN",
            RegionPreset::Kor => "KOR",
            RegionPreset::Chn => "CHN",
            RegionPreset::Amr => "AMR",
        }
    }

    /// Default universe simulated for the region.
    pub fn universe(&self) -> &'static str {
        match self {
            RegionPreset::Usa => "TOP3000",
            RegionPreset::Asi => "MINVOL1M",
            RegionPreset::Eur => "TOP1200",
            RegionPreset::Glb => "TOP3000",
            RegionPreset::Hkg => "TOP800",
            RegionPreset::Twn => "TOP500",
            RegionPreset::Jpn => "TOP1600",
            RegionPreset::Kor => "TOP600",
            RegionPreset::Chn => "TOP2000U",
            RegionPreset::Amr => "TOP600",
        }
    }
}

impl FromStr for RegionPreset {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        RegionPreset::ALL
            .into_iter()
            .find(|p| p.key() == norm)
            .ok_or_else(|| ModelError::UnknownRegion(s.to_string()))
    }
}

impl fmt::Display for RegionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region(), self.universe())
    }
}
