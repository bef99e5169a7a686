use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::estimation::diagnostics::{EstimateWarning, WarningCode};
use crate::estimation::money::round2;

const OVERSIZED_DIMENSION_FT: f64 = 15.0;
const OVERSIZED_AREA_SF: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    Door,
    DoubleDoor,
    SlidingDoor,
    GarageDoor,
    Window,
    Archway,
    MissingWall,
    Other,
}

impl OpeningType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Door => "Door",
            Self::DoubleDoor => "Double Door",
            Self::SlidingDoor => "Sliding Door",
            Self::GarageDoor => "Garage Door",
            Self::Window => "Window",
            Self::Archway => "Archway",
            Self::MissingWall => "Missing Wall",
            Self::Other => "Opening",
        }
    }

    /// Default `(width, height)` in feet. Missing walls span the full room height.
    pub fn default_dimensions(self, room_height: f64) -> (f64, f64) {
        match self {
            Self::Door => (2.67, 6.67),
            Self::DoubleDoor => (5.33, 6.67),
            Self::SlidingDoor => (6.0, 6.67),
            Self::GarageDoor => (9.0, 7.0),
            Self::Window => (3.0, 4.0),
            Self::Archway => (3.0, 6.67),
            Self::MissingWall => (4.0, room_height.max(0.0)),
            Self::Other => (3.0, 6.67),
        }
    }
}

fn one() -> u32 {
    1
}

/// Door, window, or other gap in a room's walls as captured in the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub opening_type: OpeningType,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub wall: Option<String>,
    #[serde(default)]
    pub goes_to_floor: bool,
    #[serde(default)]
    pub goes_to_ceiling: bool,
}

impl Opening {
    pub fn new(opening_type: OpeningType, width: Option<f64>, height: Option<f64>) -> Self {
        Self {
            opening_type,
            width,
            height,
            quantity: 1,
            wall: None,
            goes_to_floor: false,
            goes_to_ceiling: false,
        }
    }

    pub fn to_floor(mut self) -> Self {
        self.goes_to_floor = true;
        self
    }

    pub fn to_ceiling(mut self) -> Self {
        self.goes_to_ceiling = true;
        self
    }

    pub fn times(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Opening with both dimensions settled, ready to deduct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOpening {
    pub opening_type: OpeningType,
    pub width: f64,
    pub height: f64,
    pub quantity: u32,
    /// Area of a single opening, rounded.
    pub area: f64,
    pub wall: Option<String>,
    pub goes_to_floor: bool,
    pub goes_to_ceiling: bool,
    pub defaulted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeDeduction {
    pub count: u32,
    pub area: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpeningDeductions {
    pub openings: Vec<ResolvedOpening>,
    pub total_area: f64,
    /// Summed width of openings that reach the floor.
    pub floor_width: f64,
    /// Summed width of openings that reach the ceiling.
    pub ceiling_width: f64,
    pub by_type: BTreeMap<OpeningType, TypeDeduction>,
    pub warnings: Vec<EstimateWarning>,
}

fn explicit(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Resolve every opening's dimensions and accumulate the deduction totals.
pub fn resolve_openings(openings: &[Opening], room_height: f64) -> OpeningDeductions {
    let mut deductions = OpeningDeductions::default();
    let mut total_area = 0.0;
    let mut floor_width = 0.0;
    let mut ceiling_width = 0.0;

    for (index, opening) in openings.iter().enumerate() {
        let subject = format!("opening {} ({})", index + 1, opening.opening_type.label());
        let (default_width, default_height) =
            opening.opening_type.default_dimensions(room_height);

        let width = explicit(opening.width);
        let height = explicit(opening.height);
        let defaulted = width.is_none() || height.is_none();
        let width = width.unwrap_or(default_width);
        let height = height.unwrap_or(default_height);

        if defaulted {
            deductions.warnings.push(EstimateWarning::new(
                WarningCode::DefaultedOpeningDimensions,
                subject.clone(),
                format!("dimensions defaulted to {:.2} x {:.2} ft", width, height),
            ));
        }
        if width > OVERSIZED_DIMENSION_FT || height > OVERSIZED_DIMENSION_FT {
            deductions.warnings.push(EstimateWarning::new(
                WarningCode::OversizedOpening,
                subject.clone(),
                format!(
                    "{:.2} x {:.2} ft exceeds {:.0} ft; verify measurement",
                    width, height, OVERSIZED_DIMENSION_FT
                ),
            ));
        }
        let single_area = width * height;
        if single_area > OVERSIZED_AREA_SF {
            deductions.warnings.push(EstimateWarning::new(
                WarningCode::OversizedOpeningArea,
                subject,
                format!(
                    "{:.2} SF exceeds {:.0} SF for a single opening",
                    single_area, OVERSIZED_AREA_SF
                ),
            ));
        }

        let quantity = f64::from(opening.quantity);
        total_area += single_area * quantity;
        if opening.goes_to_floor {
            floor_width += width * quantity;
        }
        if opening.goes_to_ceiling {
            ceiling_width += width * quantity;
        }

        let entry = deductions.by_type.entry(opening.opening_type).or_default();
        entry.count += opening.quantity;
        entry.area = round2(entry.area + single_area * quantity);

        deductions.openings.push(ResolvedOpening {
            opening_type: opening.opening_type,
            width,
            height,
            quantity: opening.quantity,
            area: round2(single_area),
            wall: opening.wall.clone(),
            goes_to_floor: opening.goes_to_floor,
            goes_to_ceiling: opening.goes_to_ceiling,
            defaulted,
        });
    }

    deductions.total_area = round2(total_area);
    deductions.floor_width = round2(floor_width);
    deductions.ceiling_width = round2(ceiling_width);
    deductions
}
