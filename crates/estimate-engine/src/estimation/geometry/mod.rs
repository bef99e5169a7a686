//! Room geometry: derives the dimension variables every quantity formula reads.
//!
//! Two snapshots are produced per room. `before_mw` is the raw box (or facade);
//! `after_mw` has every opening deducted from the wall variables and the widths
//! of floor/ceiling-reaching openings deducted from the perimeters.

pub mod openings;

use serde::{Deserialize, Serialize};

use crate::estimation::diagnostics::{EstimateWarning, WarningCode};
use crate::estimation::money::{non_negative, round2};

pub use openings::{
    resolve_openings, Opening, OpeningDeductions, OpeningType, ResolvedOpening, TypeDeduction,
};

const CATHEDRAL_VOLUME_FACTOR: f64 = 1.25;
const EXCESSIVE_DEDUCTION_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeilingType {
    #[default]
    Flat,
    Cathedral,
    Vaulted,
    Tray,
}

/// Whether the measurement describes an enclosed room or a single exterior facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureMode {
    #[default]
    Box,
    Elevation,
}

/// Field measurements for one room, in feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Wall thickness in inches, carried through to the export.
    #[serde(default)]
    pub wall_thickness: Option<f64>,
    /// Compass orientation of the long wall, degrees.
    #[serde(default)]
    pub orientation: Option<f64>,
    #[serde(default)]
    pub ceiling_type: CeilingType,
    #[serde(default)]
    pub mode: MeasureMode,
    /// Roof pitch as rise per 12 of run.
    #[serde(default)]
    pub roof_pitch: Option<f64>,
}

impl RoomDimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
            wall_thickness: None,
            orientation: None,
            ceiling_type: CeilingType::Flat,
            mode: MeasureMode::Box,
            roof_pitch: None,
        }
    }

    pub fn elevation(length: f64, height: f64) -> Self {
        Self {
            mode: MeasureMode::Elevation,
            ..Self::new(length, 0.0, height)
        }
    }

    pub fn with_ceiling(mut self, ceiling_type: CeilingType) -> Self {
        self.ceiling_type = ceiling_type;
        self
    }

    pub fn with_roof_pitch(mut self, pitch: f64) -> Self {
        self.roof_pitch = Some(pitch);
        self
    }
}

/// The thirteen derived dimension variables of one room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimVars {
    /// `HH`
    pub ceiling_height: f64,
    /// `SH`
    pub short_wall_height: f64,
    /// `W`
    pub wall_area: f64,
    /// `LW`
    pub long_wall_area: f64,
    /// `SW`
    pub short_wall_area: f64,
    /// `PF`
    pub floor_perimeter: f64,
    /// `PC`
    pub ceiling_perimeter: f64,
    /// `C`
    pub ceiling_area: f64,
    /// `F`
    pub floor_area: f64,
    /// `LL`
    pub long_wall_length: f64,
    /// `R`
    pub roof_area: f64,
    /// `SQ`
    pub roof_squares: f64,
    /// `V`
    pub volume: f64,
}

impl DimVars {
    /// Attribute name/value pairs in the interchange format's fixed order.
    pub fn attributes(&self) -> [(&'static str, f64); 13] {
        [
            ("HH", self.ceiling_height),
            ("SH", self.short_wall_height),
            ("W", self.wall_area),
            ("LW", self.long_wall_area),
            ("SW", self.short_wall_area),
            ("PF", self.floor_perimeter),
            ("PC", self.ceiling_perimeter),
            ("C", self.ceiling_area),
            ("F", self.floor_area),
            ("LL", self.long_wall_length),
            ("R", self.roof_area),
            ("SQ", self.roof_squares),
            ("V", self.volume),
        ]
    }

    fn rounded(self) -> Self {
        Self {
            ceiling_height: round2(non_negative(self.ceiling_height)),
            short_wall_height: round2(non_negative(self.short_wall_height)),
            wall_area: round2(non_negative(self.wall_area)),
            long_wall_area: round2(non_negative(self.long_wall_area)),
            short_wall_area: round2(non_negative(self.short_wall_area)),
            floor_perimeter: round2(non_negative(self.floor_perimeter)),
            ceiling_perimeter: round2(non_negative(self.ceiling_perimeter)),
            ceiling_area: round2(non_negative(self.ceiling_area)),
            floor_area: round2(non_negative(self.floor_area)),
            long_wall_length: round2(non_negative(self.long_wall_length)),
            roof_area: round2(non_negative(self.roof_area)),
            roof_squares: round2(non_negative(self.roof_squares)),
            volume: round2(non_negative(self.volume)),
        }
    }
}

/// Both dimension-variable snapshots plus the opening breakdown behind them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimVarsReport {
    pub before_mw: DimVars,
    pub after_mw: DimVars,
    pub deductions: OpeningDeductions,
    pub warnings: Vec<EstimateWarning>,
}

/// Compute `before_mw`/`after_mw` dimension variables for a room and its openings.
pub fn calculate_dim_vars(dimensions: &RoomDimensions, openings: &[Opening]) -> DimVarsReport {
    let length = non_negative(dimensions.length);
    let width = non_negative(dimensions.width);
    let height = non_negative(dimensions.height);

    let gross = match dimensions.mode {
        MeasureMode::Box => box_dim_vars(length, width, height, dimensions),
        MeasureMode::Elevation => elevation_dim_vars(length, height),
    };

    let mut deductions = resolve_openings(openings, height);
    let mut warnings = std::mem::take(&mut deductions.warnings);

    let net = deduct_openings(&gross, &deductions);

    if gross.wall_area > 0.0 && deductions.total_area / gross.wall_area > EXCESSIVE_DEDUCTION_RATIO
    {
        warnings.push(EstimateWarning::new(
            WarningCode::ExcessiveDeductionRatio,
            "openings",
            format!(
                "openings remove {:.2} of {:.2} SF of wall area",
                deductions.total_area, gross.wall_area
            ),
        ));
    }

    DimVarsReport {
        before_mw: gross.rounded(),
        after_mw: net.rounded(),
        deductions,
        warnings,
    }
}

fn box_dim_vars(length: f64, width: f64, height: f64, dimensions: &RoomDimensions) -> DimVars {
    let long_side = length.max(width);
    let short_side = length.min(width);
    let floor_area = length * width;
    let perimeter = 2.0 * (length + width);

    let volume_factor = if dimensions.ceiling_type == CeilingType::Cathedral {
        CATHEDRAL_VOLUME_FACTOR
    } else {
        1.0
    };
    let roof_area = floor_area * pitch_factor(dimensions.roof_pitch);

    DimVars {
        ceiling_height: height,
        short_wall_height: height,
        wall_area: 2.0 * (length * height + width * height),
        long_wall_area: 2.0 * long_side * height,
        short_wall_area: 2.0 * short_side * height,
        floor_perimeter: perimeter,
        ceiling_perimeter: perimeter,
        ceiling_area: floor_area,
        floor_area,
        long_wall_length: long_side,
        roof_area,
        roof_squares: roof_area / 100.0,
        volume: floor_area * height * volume_factor,
    }
}

/// A facade is one flat wall: no floor, ceiling, roof or volume terms.
fn elevation_dim_vars(length: f64, height: f64) -> DimVars {
    let wall_area = length * height;
    DimVars {
        ceiling_height: height,
        short_wall_height: height,
        wall_area,
        long_wall_area: wall_area,
        short_wall_area: 0.0,
        floor_perimeter: length,
        ceiling_perimeter: length,
        long_wall_length: length,
        ..DimVars::default()
    }
}

fn pitch_factor(pitch: Option<f64>) -> f64 {
    match pitch.filter(|p| p.is_finite() && *p > 0.0) {
        Some(rise) => (1.0 + (rise / 12.0).powi(2)).sqrt(),
        None => 1.0,
    }
}

fn deduct_openings(gross: &DimVars, deductions: &OpeningDeductions) -> DimVars {
    let area = deductions.total_area;
    let (long_share, short_share) = if gross.wall_area > 0.0 {
        (
            gross.long_wall_area / gross.wall_area,
            gross.short_wall_area / gross.wall_area,
        )
    } else {
        (0.0, 0.0)
    };

    DimVars {
        wall_area: non_negative(gross.wall_area - area),
        long_wall_area: non_negative(gross.long_wall_area - area * long_share),
        short_wall_area: non_negative(gross.short_wall_area - area * short_share),
        floor_perimeter: non_negative(gross.floor_perimeter - deductions.floor_width),
        ceiling_perimeter: non_negative(gross.ceiling_perimeter - deductions.ceiling_width),
        ..*gross
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twelve_by_ten() -> RoomDimensions {
        RoomDimensions::new(12.0, 10.0, 8.0)
    }

    #[test]
    fn plain_box_matches_reference_room() {
        let report = calculate_dim_vars(&twelve_by_ten(), &[]);
        let vars = report.before_mw;

        assert_eq!(vars.wall_area, 352.0);
        assert_eq!(vars.long_wall_area, 192.0);
        assert_eq!(vars.short_wall_area, 160.0);
        assert_eq!(vars.floor_area, 120.0);
        assert_eq!(vars.ceiling_area, 120.0);
        assert_eq!(vars.floor_perimeter, 44.0);
        assert_eq!(vars.volume, 960.0);
        assert_eq!(vars.long_wall_length, 12.0);
        assert_eq!(vars.roof_squares, 1.2);
    }

    #[test]
    fn no_openings_means_identical_snapshots() {
        let report = calculate_dim_vars(&twelve_by_ten(), &[]);
        assert_eq!(report.before_mw, report.after_mw);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn floor_door_reduces_walls_and_floor_perimeter() {
        let door = Opening::new(OpeningType::Door, Some(3.0), Some(6.67)).to_floor();
        let report = calculate_dim_vars(&twelve_by_ten(), &[door]);
        let after = report.after_mw;

        assert_eq!(after.floor_perimeter, 41.0);
        assert_eq!(after.ceiling_perimeter, 44.0);
        assert_eq!(after.wall_area, 331.99);
        assert_eq!(after.long_wall_area, 181.09);
        assert_eq!(after.short_wall_area, 150.9);
        assert_eq!(after.floor_area, report.before_mw.floor_area);
    }

    #[test]
    fn windows_do_not_touch_perimeter() {
        let window = Opening::new(OpeningType::Window, Some(3.0), Some(4.0));
        let report = calculate_dim_vars(&twelve_by_ten(), &[window]);
        assert_eq!(report.after_mw.floor_perimeter, 44.0);
        assert_eq!(report.after_mw.wall_area, 340.0);
    }

    #[test]
    fn deductions_never_go_negative() {
        let wall = Opening::new(OpeningType::MissingWall, Some(14.0), Some(14.0))
            .to_floor()
            .times(4);
        let report = calculate_dim_vars(&RoomDimensions::new(4.0, 3.0, 8.0), &[wall]);
        assert_eq!(report.after_mw.wall_area, 0.0);
        assert_eq!(report.after_mw.long_wall_area, 0.0);
        assert_eq!(report.after_mw.short_wall_area, 0.0);
        assert_eq!(report.after_mw.floor_perimeter, 0.0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::ExcessiveDeductionRatio));
    }

    #[test]
    fn net_wall_area_subtracts_every_opening_times_its_quantity() {
        let cases: Vec<Vec<(OpeningType, f64, f64, u32)>> = vec![
            vec![(OpeningType::Window, 3.0, 4.0, 3), (OpeningType::Door, 3.0, 7.0, 2)],
            vec![
                (OpeningType::Window, 2.5, 3.33, 4),
                (OpeningType::DoubleDoor, 5.0, 6.67, 1),
                (OpeningType::Archway, 4.0, 7.0, 2),
            ],
            vec![(OpeningType::Window, 1.25, 1.25, 7)],
            vec![(OpeningType::MissingWall, 12.0, 8.0, 2), (OpeningType::Door, 3.0, 7.0, 3)],
            vec![(OpeningType::MissingWall, 14.0, 14.0, 2)],
        ];

        for case in cases {
            let openings: Vec<Opening> = case
                .iter()
                .map(|&(kind, width, height, quantity)| {
                    Opening::new(kind, Some(width), Some(height)).times(quantity)
                })
                .collect();
            let deducted: f64 = case
                .iter()
                .map(|&(_, width, height, quantity)| width * height * f64::from(quantity))
                .sum();

            let report = calculate_dim_vars(&twelve_by_ten(), &openings);

            let expected = round2(non_negative(352.0 - round2(deducted)));
            assert_eq!(report.after_mw.wall_area, expected, "{case:?}");
            assert!(report.after_mw.wall_area >= 0.0);
            assert!(report.after_mw.wall_area <= report.before_mw.wall_area);
        }
    }

    #[test]
    fn cathedral_ceiling_inflates_volume() {
        let dims = twelve_by_ten().with_ceiling(CeilingType::Cathedral);
        let report = calculate_dim_vars(&dims, &[]);
        assert_eq!(report.before_mw.volume, 1200.0);
    }

    #[test]
    fn roof_pitch_scales_roof_area() {
        let dims = RoomDimensions::new(40.0, 30.0, 9.0).with_roof_pitch(12.0);
        let report = calculate_dim_vars(&dims, &[]);
        assert_eq!(report.before_mw.roof_area, 1697.06);
        assert_eq!(report.before_mw.roof_squares, 16.97);
    }

    #[test]
    fn elevation_is_a_single_flat_wall() {
        let door = Opening::new(OpeningType::Door, Some(3.0), Some(7.0)).to_floor();
        let report = calculate_dim_vars(&RoomDimensions::elevation(30.0, 9.0), &[door]);

        assert_eq!(report.before_mw.wall_area, 270.0);
        assert_eq!(report.before_mw.floor_area, 0.0);
        assert_eq!(report.before_mw.volume, 0.0);
        assert_eq!(report.after_mw.wall_area, 249.0);
        assert_eq!(report.after_mw.long_wall_area, 249.0);
        assert_eq!(report.after_mw.floor_perimeter, 27.0);
    }

    #[test]
    fn attributes_follow_fixed_order() {
        let report = calculate_dim_vars(&twelve_by_ten(), &[]);
        let names: Vec<&str> = report
            .before_mw
            .attributes()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            names,
            ["HH", "SH", "W", "LW", "SW", "PF", "PC", "C", "F", "LL", "R", "SQ", "V"]
        );
    }
}
