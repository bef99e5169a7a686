use serde::{Deserialize, Serialize};

use super::depreciation::DepreciationType;
use super::money::round2;
use super::scope::Unit;
use super::settlement::CoverageType;

/// A priced, billable unit of work as the settlement engine consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    /// Building or structure name, used to infer the coverage bucket.
    #[serde(default)]
    pub structure: Option<String>,
    /// Trade code (`DRY`, `PNT`, ...).
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub code: Option<String>,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Unit,
    pub unit_price: f64,
    pub total_price: f64,
    /// Labor portion of `total_price`, excluded from the tax base when labor is untaxed.
    #[serde(default)]
    pub labor_total: f64,
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub life_expectancy_years: Option<f64>,
    /// Manual depreciation percentage override.
    #[serde(default)]
    pub depreciation_pct: Option<f64>,
    #[serde(default)]
    pub depreciation_type: Option<DepreciationType>,
    #[serde(default)]
    pub coverage: Option<CoverageType>,
    #[serde(default)]
    pub work_completed: bool,
}

impl LineItem {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        unit: Unit,
        unit_price: f64,
    ) -> Self {
        let unit_price = round2(unit_price);
        Self {
            id: id.into(),
            room_id: None,
            structure: None,
            category: category.into(),
            description: description.into(),
            code: None,
            quantity,
            unit,
            unit_price,
            total_price: round2(unit_price * quantity),
            labor_total: 0.0,
            age_years: None,
            life_expectancy_years: None,
            depreciation_pct: None,
            depreciation_type: None,
            coverage: None,
            work_completed: false,
        }
    }

    pub fn in_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn in_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_labor(mut self, labor_total: f64) -> Self {
        self.labor_total = round2(labor_total);
        self
    }

    pub fn aged(mut self, age_years: f64, life_expectancy_years: f64) -> Self {
        self.age_years = Some(age_years);
        self.life_expectancy_years = Some(life_expectancy_years);
        self
    }

    pub fn with_depreciation_pct(mut self, pct: f64) -> Self {
        self.depreciation_pct = Some(pct);
        self
    }

    pub fn with_depreciation_type(mut self, depreciation_type: DepreciationType) -> Self {
        self.depreciation_type = Some(depreciation_type);
        self
    }

    pub fn with_coverage(mut self, coverage: CoverageType) -> Self {
        self.coverage = Some(coverage);
        self
    }

    pub fn completed(mut self) -> Self {
        self.work_completed = true;
        self
    }

    /// Trade key used for grouping: trimmed, upper-cased category.
    pub fn trade_code(&self) -> String {
        self.category.trim().to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_extends_price_in_cents() {
        let item = LineItem::new("1", "dry", "Drywall", 100.0, Unit::SquareFeet, 1.104);
        assert_eq!(item.unit_price, 1.1);
        assert_eq!(item.total_price, 110.0);
        assert_eq!(item.trade_code(), "DRY");
    }

    #[test]
    fn deserializes_with_defaults() {
        let item: LineItem = serde_json::from_value(serde_json::json!({
            "id": "li-1",
            "category": "PNT",
            "description": "Paint walls",
            "quantity": 100.0,
            "unit": "SF",
            "unit_price": 1.05,
            "total_price": 105.0,
            "depreciation_type": "Paid When Incurred",
            "coverage": "B"
        }))
        .expect("line item parses");

        assert_eq!(item.labor_total, 0.0);
        assert!(!item.work_completed);
        assert_eq!(item.depreciation_type, Some(DepreciationType::PaidWhenIncurred));
        assert_eq!(item.coverage, Some(CoverageType::OtherStructures));
    }
}
