use std::io::Cursor;

use estimate_engine::estimation::geometry::{Opening, OpeningType, RoomDimensions};
use estimate_engine::estimation::pipeline::{build_estimate, InspectionEstimate};
use estimate_engine::estimation::scope::{
    DamageObservation, DamageType, InMemoryCatalog, MatchStrategy, Severity,
};
use estimate_engine::estimation::settlement::{
    CarrierRuleTable, CoverageType, LossContext, PolicyRule,
};
use estimate_engine::estimation::{Room, WarningCode};

const CATALOG_CSV: &str = "code,description,trade,unit,formula,waste,activity,life_years,requires,auto_adds,excludes,damage_types,severities,room_types,zones\n\
WTR EXT,Water extraction from carpet,WTR,SF,FLOOR_SF,,,,,,,,,,\n\
WTR DEHU,Dehumidifier - per 24 hour period,WTR,EA,EACH,,,,WTR AIRM,,,,,,\n\
CLN ODOR,Odor treatment - floor,CLN,SF,FLOOR_SF,,,10,,,,other,minor;moderate,,interior\n";

const PRICE_CSV: &str = "code,region,activity,material,labor,equipment\n\
WTR EXT,IADM8X,install,0,0.50,0\n\
WTR DEHU,IADM8X,install,0,70.00,5.00\n\
CLN ODOR,IADM8X,install,0.20,0.30,0\n";

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_csv_readers(Cursor::new(CATALOG_CSV), Cursor::new(PRICE_CSV))
        .expect("catalog loads")
}

fn inspection() -> InspectionEstimate {
    InspectionEstimate {
        rooms: vec![
            Room::new("kitchen", "Kitchen")
                .of_type("kitchen")
                .measured(RoomDimensions::new(12.0, 10.0, 8.0))
                .with_opening(Opening::new(OpeningType::Door, Some(3.0), Some(7.0)))
                .with_damage(DamageObservation::new(DamageType::Water, Severity::Minor)),
            Room::new("den", "Den")
                .measured(RoomDimensions::new(10.0, 10.0, 8.0))
                .with_damage(DamageObservation::new(DamageType::Other, Severity::Minor))
                .aged(4.0),
        ],
        policy_rules: vec![PolicyRule {
            coverage: CoverageType::Dwelling,
            policy_limit: None,
            deductible: 50.0,
            overhead_pct: None,
            profit_pct: None,
            roof_schedule: false,
        }],
        claim_tax_rate: Some(0.0),
        loss: LossContext {
            water_category: Some(1),
            ..LossContext::default()
        },
        ..InspectionEstimate::default()
    }
}

#[tokio::test]
async fn inspection_flows_from_geometry_to_net_claim() {
    let outcome = build_estimate(
        &catalog(),
        &CarrierRuleTable::standard(),
        &inspection(),
        "IADM8X",
    )
    .await
    .expect("estimate builds");

    let kitchen = &outcome.rooms[0];
    assert_eq!(kitchen.strategies, vec![MatchStrategy::Curated]);
    let dim_vars = kitchen.dim_vars.as_ref().expect("kitchen measured");
    assert_eq!(dim_vars.before_mw.wall_area, 352.0);
    assert_eq!(dim_vars.after_mw.wall_area, 331.0);
    assert_eq!(outcome.rooms[1].strategies, vec![MatchStrategy::Conditions]);

    let ids: Vec<&str> = outcome
        .line_items
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert_eq!(ids, vec!["kitchen-001", "kitchen-002", "den-001"]);
    assert_eq!(outcome.line_items[0].total_price, 60.0);
    assert_eq!(outcome.line_items[1].total_price, 75.0);
    assert_eq!(outcome.line_items[2].total_price, 50.0);

    assert!(outcome.warnings.iter().any(|warning| {
        warning.code == WarningCode::MissingCompanion && warning.message.contains("WTR AIRM")
    }));

    let settlement = &outcome.settlement;
    assert!(!settlement.qualifies_for_op);
    assert_eq!(settlement.distinct_trades, 2);
    assert_eq!(settlement.totals.line_item_total, 185.0);
    assert_eq!(settlement.totals.rcv, 185.0);
    assert_eq!(settlement.totals.recoverable_depreciation, 20.0);
    assert_eq!(settlement.totals.acv, 165.0);
    assert_eq!(settlement.totals.deductible_applied, 50.0);
    assert_eq!(settlement.totals.net_claim, 115.0);

    let odor = settlement.item("den-001").expect("den line settled");
    assert_eq!(odor.depreciation_pct, 40.0);
    assert_eq!(odor.coverage, CoverageType::Dwelling);
}

#[tokio::test]
async fn unknown_region_prices_every_line_at_zero() {
    let outcome = build_estimate(
        &catalog(),
        &CarrierRuleTable::standard(),
        &inspection(),
        "NOWHERE",
    )
    .await
    .expect("estimate builds");

    assert_eq!(outcome.line_items.len(), 3);
    assert!(outcome.line_items.iter().all(|item| item.total_price == 0.0));
    let missing = outcome
        .warnings
        .iter()
        .filter(|warning| warning.code == WarningCode::MissingPrice)
        .count();
    assert_eq!(missing, 3);
    assert_eq!(outcome.settlement.totals.net_claim, 0.0);
}

#[tokio::test]
async fn category_three_water_removes_depreciation() {
    let mut estimate = inspection();
    estimate.loss.water_category = Some(3);

    let outcome = build_estimate(&catalog(), &CarrierRuleTable::standard(), &estimate, "IADM8X")
        .await
        .expect("estimate builds");

    assert_eq!(outcome.settlement.totals.recoverable_depreciation, 0.0);
    assert_eq!(outcome.settlement.totals.acv, 185.0);
    assert_eq!(outcome.settlement.totals.net_claim, 135.0);
}
