use serde::{Deserialize, Serialize};

const OTHER_STRUCTURE_KEYWORDS: &[&str] = &[
    "detached",
    "shed",
    "fence",
    "pool",
    "barn",
    "gazebo",
    "outbuilding",
    "carport",
    "pergola",
];
const CONTENTS_KEYWORDS: &[&str] = &["contents", "personal property"];

/// Policy coverage bucket a line item is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoverageType {
    #[serde(rename = "A")]
    Dwelling,
    #[serde(rename = "B")]
    OtherStructures,
    #[serde(rename = "C")]
    Contents,
    #[serde(rename = "D")]
    LossOfUse,
}

impl CoverageType {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Dwelling => "A",
            Self::OtherStructures => "B",
            Self::Contents => "C",
            Self::LossOfUse => "D",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dwelling => "Coverage A - Dwelling",
            Self::OtherStructures => "Coverage B - Other Structures",
            Self::Contents => "Coverage C - Contents",
            Self::LossOfUse => "Coverage D - Loss of Use",
        }
    }
}

/// Explicit coverage wins; otherwise infer from the structure name, defaulting to the dwelling.
pub fn infer_coverage(explicit: Option<CoverageType>, structure: Option<&str>) -> CoverageType {
    if let Some(coverage) = explicit {
        return coverage;
    }

    let Some(structure) = structure.map(str::to_ascii_lowercase) else {
        return CoverageType::Dwelling;
    };
    if OTHER_STRUCTURE_KEYWORDS
        .iter()
        .any(|keyword| structure.contains(keyword))
    {
        CoverageType::OtherStructures
    } else if CONTENTS_KEYWORDS
        .iter()
        .any(|keyword| structure.contains(keyword))
    {
        CoverageType::Contents
    } else {
        CoverageType::Dwelling
    }
}
