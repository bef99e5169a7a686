use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Water,
    Fire,
    Smoke,
    Mold,
    Wind,
    Hail,
    Impact,
    Other,
}

impl DamageType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Fire => "fire",
            Self::Smoke => "smoke",
            Self::Mold => "mold",
            Self::Wind => "wind",
            Self::Hail => "hail",
            Self::Impact => "impact",
            Self::Other => "other",
        }
    }
}

/// Ordered so that `Severe > Moderate > Minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    Interior,
    Exterior,
}

impl Zone {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Interior => "interior",
            Self::Exterior => "exterior",
        }
    }
}

/// Damage logged by the inspector against one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageObservation {
    pub damage_type: DamageType,
    pub severity: Severity,
    #[serde(default)]
    pub zone: Zone,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DamageObservation {
    pub fn new(damage_type: DamageType, severity: Severity) -> Self {
        Self {
            damage_type,
            severity,
            zone: Zone::Interior,
            notes: None,
        }
    }

    pub fn exterior(mut self) -> Self {
        self.zone = Zone::Exterior;
        self
    }
}
