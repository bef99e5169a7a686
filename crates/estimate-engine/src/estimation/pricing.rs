//! Line pricing: unit costs plus waste to unit and extended prices.
//!
//! Waste applies to material only. Unit price, line total and labor share are
//! each rounded to cents; raw unit costs are not.

use serde::{Deserialize, Serialize};

use super::money::{non_negative, round2};
use super::scope::{CatalogError, CatalogSource, RegionalPrice, UnitCosts};

pub const DEFAULT_ACTIVITY: &str = "install";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricedAmounts {
    pub unit_price: f64,
    pub total_price: f64,
    /// Labor share of `total_price`.
    pub labor_total: f64,
}

/// Price one line from its unit costs, waste factor (percent) and quantity.
pub fn price_line(costs: &UnitCosts, waste_factor: f64, quantity: f64) -> PricedAmounts {
    let material = non_negative(costs.material_cost);
    let labor = non_negative(costs.labor_cost);
    let equipment = non_negative(costs.equipment_cost);
    let waste = non_negative(waste_factor);
    let quantity = non_negative(quantity);

    let unit_price = round2(material * (1.0 + waste / 100.0) + labor + equipment);

    PricedAmounts {
        unit_price,
        total_price: round2(unit_price * quantity),
        labor_total: round2(labor * quantity),
    }
}

/// Pick the price row for `activity`, falling back to `install`, then the first row.
pub fn resolve_regional_price<'a>(
    prices: &'a [RegionalPrice],
    activity: &str,
) -> Option<&'a RegionalPrice> {
    let by_activity = |wanted: &str| {
        prices
            .iter()
            .find(|price| price.activity.trim().eq_ignore_ascii_case(wanted))
    };

    by_activity(activity)
        .or_else(|| by_activity(DEFAULT_ACTIVITY))
        .or_else(|| prices.first())
}

/// Fetch and resolve regional unit costs for one code. `Ok(None)` means no price exists.
pub async fn lookup_unit_costs<S>(
    source: &S,
    code: &str,
    region_id: &str,
    activity: &str,
) -> Result<Option<UnitCosts>, CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let prices = source.regional_prices(code, region_id).await?;
    Ok(resolve_regional_price(&prices, activity).map(|price| price.costs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::scope::InMemoryCatalog;

    fn costs(material: f64, labor: f64, equipment: f64) -> UnitCosts {
        UnitCosts {
            material_cost: material,
            labor_cost: labor,
            equipment_cost: equipment,
        }
    }

    fn price(activity: &str, material: f64) -> RegionalPrice {
        RegionalPrice {
            code: "DRY 1/2".to_string(),
            region_id: "IADM8X".to_string(),
            activity: activity.to_string(),
            costs: costs(material, 1.0, 0.0),
        }
    }

    #[test]
    fn waste_applies_to_material_only() {
        let priced = price_line(&costs(0.5, 1.4, 0.1), 10.0, 100.0);
        assert_eq!(priced.unit_price, 2.05);
        assert_eq!(priced.total_price, 205.0);
        assert_eq!(priced.labor_total, 140.0);
    }

    #[test]
    fn fractional_cent_costs_round_only_the_unit_price() {
        // 1.234 + 1.234 = 2.468; rounding each cost first would give 2.46.
        let priced = price_line(&costs(1.234, 1.234, 0.0), 0.0, 100.0);
        assert_eq!(priced.unit_price, 2.47);
        assert_eq!(priced.total_price, 247.0);
        assert_eq!(priced.labor_total, 123.4);
    }

    #[test]
    fn waste_on_fractional_material_is_not_pre_rounded() {
        // 0.555 * 1.1 = 0.6105; pre-rounding material to 0.56 would give 1.62.
        let priced = price_line(&costs(0.555, 1.0, 0.0), 10.0, 10.0);
        assert_eq!(priced.unit_price, 1.61);
        assert_eq!(priced.total_price, 16.1);
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        let priced = price_line(&costs(-4.0, 2.0, -1.0), -10.0, -3.0);
        assert_eq!(priced.unit_price, 2.0);
        assert_eq!(priced.total_price, 0.0);
        assert_eq!(priced.labor_total, 0.0);
    }

    #[test]
    fn activity_fallback_prefers_install_then_first() {
        let rows = vec![price("remove", 0.1), price("install", 0.5), price("replace", 0.9)];
        assert_eq!(
            resolve_regional_price(&rows, "REPLACE").map(|row| row.activity.as_str()),
            Some("replace")
        );
        assert_eq!(
            resolve_regional_price(&rows, "detach").map(|row| row.activity.as_str()),
            Some("install")
        );

        let no_install = vec![price("remove", 0.1), price("replace", 0.9)];
        assert_eq!(
            resolve_regional_price(&no_install, "detach").map(|row| row.activity.as_str()),
            Some("remove")
        );
        assert!(resolve_regional_price(&[], "install").is_none());
    }

    #[tokio::test]
    async fn lookup_unit_costs_reads_the_source() {
        let catalog = InMemoryCatalog::new().with_price(price("install", 0.5));

        let found = lookup_unit_costs(&catalog, "dry 1/2", "iadm8x", "install")
            .await
            .expect("lookup succeeds");
        assert_eq!(found.map(|costs| costs.material_cost), Some(0.5));

        let missing = lookup_unit_costs(&catalog, "PNT SP", "IADM8X", "install")
            .await
            .expect("lookup succeeds");
        assert!(missing.is_none());
    }
}
