use serde::{Deserialize, Serialize};

use crate::estimation::geometry::{DimVars, DimVarsReport};
use crate::estimation::money::round2;

/// Unit of measure for a scope or line item quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "SF")]
    SquareFeet,
    #[serde(rename = "LF")]
    LinearFeet,
    #[serde(rename = "CF")]
    CubicFeet,
    #[serde(rename = "SQ")]
    Squares,
    #[default]
    #[serde(rename = "EA")]
    Each,
}

impl Unit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SquareFeet => "SF",
            Self::LinearFeet => "LF",
            Self::CubicFeet => "CF",
            Self::Squares => "SQ",
            Self::Each => "EA",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SF" => Some(Self::SquareFeet),
            "LF" => Some(Self::LinearFeet),
            "CF" => Some(Self::CubicFeet),
            "SQ" => Some(Self::Squares),
            "EA" => Some(Self::Each),
            _ => None,
        }
    }
}

/// Named quantity formulas a catalog entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityFormula {
    FloorSf,
    CeilingSf,
    WallSf,
    WallSfNet,
    WallCeilingSfNet,
    LongWallSfNet,
    ShortWallSfNet,
    PerimeterLf,
    CeilingPerimeterLf,
    VolumeCf,
    RoofSf,
    RoofSq,
    Each,
    Manual,
}

impl QuantityFormula {
    pub fn from_code(code: &str) -> Option<Self> {
        let formula = match code.trim().to_ascii_uppercase().as_str() {
            "FLOOR_SF" => Self::FloorSf,
            "CEILING_SF" => Self::CeilingSf,
            "WALL_SF" => Self::WallSf,
            "WALL_SF_NET" => Self::WallSfNet,
            "WALL_CEILING_SF_NET" => Self::WallCeilingSfNet,
            "LONG_WALL_SF_NET" => Self::LongWallSfNet,
            "SHORT_WALL_SF_NET" => Self::ShortWallSfNet,
            "PERIMETER_LF" => Self::PerimeterLf,
            "CEILING_PERIMETER_LF" => Self::CeilingPerimeterLf,
            "VOLUME_CF" => Self::VolumeCf,
            "ROOF_SF" => Self::RoofSf,
            "ROOF_SQ" => Self::RoofSq,
            "EACH" => Self::Each,
            "MANUAL" => Self::Manual,
            _ => return None,
        };
        Some(formula)
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::FloorSf => "FLOOR_SF",
            Self::CeilingSf => "CEILING_SF",
            Self::WallSf => "WALL_SF",
            Self::WallSfNet => "WALL_SF_NET",
            Self::WallCeilingSfNet => "WALL_CEILING_SF_NET",
            Self::LongWallSfNet => "LONG_WALL_SF_NET",
            Self::ShortWallSfNet => "SHORT_WALL_SF_NET",
            Self::PerimeterLf => "PERIMETER_LF",
            Self::CeilingPerimeterLf => "CEILING_PERIMETER_LF",
            Self::VolumeCf => "VOLUME_CF",
            Self::RoofSf => "ROOF_SF",
            Self::RoofSq => "ROOF_SQ",
            Self::Each => "EACH",
            Self::Manual => "MANUAL",
        }
    }

    pub const fn unit(self) -> Unit {
        match self {
            Self::FloorSf
            | Self::CeilingSf
            | Self::WallSf
            | Self::WallSfNet
            | Self::WallCeilingSfNet
            | Self::LongWallSfNet
            | Self::ShortWallSfNet
            | Self::RoofSf => Unit::SquareFeet,
            Self::PerimeterLf | Self::CeilingPerimeterLf => Unit::LinearFeet,
            Self::VolumeCf => Unit::CubicFeet,
            Self::RoofSq => Unit::Squares,
            Self::Each | Self::Manual => Unit::Each,
        }
    }

    pub const fn requires_geometry(self) -> bool {
        !matches!(self, Self::Each | Self::Manual)
    }
}

/// Derived quantity with the reasoning shown to an adjuster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityResult {
    pub quantity: f64,
    pub unit: Unit,
    pub derivation: String,
}

/// Resolve a formula code against a room's dimension variables.
///
/// `None` means a person has to supply the quantity: the formula is `MANUAL`,
/// unknown, or needs geometry the room does not have.
pub fn derive_quantity(
    formula_code: &str,
    dim_vars: Option<&DimVarsReport>,
) -> Option<QuantityResult> {
    let formula = QuantityFormula::from_code(formula_code)?;

    match formula {
        QuantityFormula::Manual => None,
        QuantityFormula::Each => Some(QuantityResult {
            quantity: 1.0,
            unit: Unit::Each,
            derivation: "1 EA per room".to_string(),
        }),
        _ => {
            let report = dim_vars?;
            let (quantity, expression) = evaluate(formula, &report.before_mw, &report.after_mw);
            let quantity = round2(quantity);
            Some(QuantityResult {
                quantity,
                unit: formula.unit(),
                derivation: format!(
                    "{} = {} = {:.2} {}",
                    formula.code(),
                    expression,
                    quantity,
                    formula.unit().label()
                ),
            })
        }
    }
}

fn evaluate(formula: QuantityFormula, before: &DimVars, after: &DimVars) -> (f64, &'static str) {
    match formula {
        QuantityFormula::FloorSf => (after.floor_area, "F"),
        QuantityFormula::CeilingSf => (after.ceiling_area, "C"),
        QuantityFormula::WallSf => (before.wall_area, "W (before openings)"),
        QuantityFormula::WallSfNet => (after.wall_area, "W (net of openings)"),
        QuantityFormula::WallCeilingSfNet => {
            (after.wall_area + after.ceiling_area, "W (net) + C")
        }
        QuantityFormula::LongWallSfNet => (after.long_wall_area, "LW (net of openings)"),
        QuantityFormula::ShortWallSfNet => (after.short_wall_area, "SW (net of openings)"),
        QuantityFormula::PerimeterLf => (after.floor_perimeter, "PF (net of floor openings)"),
        QuantityFormula::CeilingPerimeterLf => {
            (after.ceiling_perimeter, "PC (net of ceiling openings)")
        }
        QuantityFormula::VolumeCf => (after.volume, "V"),
        QuantityFormula::RoofSf => (after.roof_area, "R"),
        QuantityFormula::RoofSq => (after.roof_squares, "SQ"),
        QuantityFormula::Each | QuantityFormula::Manual => (1.0, "1"),
    }
}

/// Human-readable reason a formula could not produce a quantity.
pub fn quantity_gap_reason(formula_code: &str, has_geometry: bool) -> String {
    match QuantityFormula::from_code(formula_code) {
        None => format!("unknown quantity formula '{}'", formula_code),
        Some(QuantityFormula::Manual) => {
            "catalog item requires a manually measured quantity".to_string()
        }
        Some(formula) if formula.requires_geometry() && !has_geometry => format!(
            "{} needs room dimensions, which have not been captured",
            formula.code()
        ),
        Some(formula) => format!("{} could not be derived", formula.code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::geometry::{calculate_dim_vars, Opening, OpeningType, RoomDimensions};

    fn report_with_door() -> DimVarsReport {
        calculate_dim_vars(
            &RoomDimensions::new(12.0, 10.0, 8.0),
            &[Opening::new(OpeningType::Door, Some(3.0), Some(6.67)).to_floor()],
        )
    }

    #[test]
    fn floor_and_net_wall_quantities_read_after_snapshot() {
        let report = report_with_door();

        let floor = derive_quantity("FLOOR_SF", Some(&report)).expect("floor derives");
        assert_eq!(floor.quantity, 120.0);
        assert_eq!(floor.unit, Unit::SquareFeet);

        let walls = derive_quantity("wall_sf_net", Some(&report)).expect("walls derive");
        assert_eq!(walls.quantity, 331.99);
        assert!(walls.derivation.contains("331.99 SF"));

        let gross = derive_quantity("WALL_SF", Some(&report)).expect("gross walls derive");
        assert_eq!(gross.quantity, 352.0);
    }

    #[test]
    fn perimeter_is_net_of_floor_openings() {
        let report = report_with_door();
        let baseboard = derive_quantity("PERIMETER_LF", Some(&report)).expect("perimeter derives");
        assert_eq!(baseboard.quantity, 41.0);
        assert_eq!(baseboard.unit, Unit::LinearFeet);
    }

    #[test]
    fn manual_and_missing_geometry_return_none() {
        let report = report_with_door();
        assert!(derive_quantity("MANUAL", Some(&report)).is_none());
        assert!(derive_quantity("FLOOR_SF", None).is_none());
        assert!(derive_quantity("NOT_A_FORMULA", Some(&report)).is_none());
    }

    #[test]
    fn each_does_not_need_geometry() {
        let each = derive_quantity("EACH", None).expect("each always derives");
        assert_eq!(each.quantity, 1.0);
        assert_eq!(each.unit, Unit::Each);
    }

    #[test]
    fn gap_reasons_name_the_problem() {
        assert!(quantity_gap_reason("FLOOR_SF", false).contains("room dimensions"));
        assert!(quantity_gap_reason("MANUAL", true).contains("manually"));
        assert!(quantity_gap_reason("BOGUS", true).contains("unknown"));
    }
}
