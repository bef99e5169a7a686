use super::common::*;
use crate::estimation::money::round2;
use crate::estimation::settlement::{calculate_settlement, RuleOverrides, SettlementInput};

const TRADES: [&str; 6] = ["DRY", "PNT", "FLR", "INS", "CLN", "DEM"];

#[test]
fn settlement_is_idempotent() {
    let mut input = three_trade_input();
    input.claim_tax_rate = Some(6.25);
    input.line_items[1] = input.line_items[1].clone().aged(7.0, 15.0);

    let first = calculate_settlement(&input, &table()).expect("settles");
    let second = calculate_settlement(&input, &table()).expect("settles");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialises"),
        serde_json::to_string(&second).expect("serialises")
    );
}

#[test]
fn inputs_are_not_mutated() {
    let input = three_trade_input();
    let snapshot = input.clone();

    calculate_settlement(&input, &table()).expect("settles");

    assert_eq!(input, snapshot);
}

#[test]
fn op_eligibility_is_monotonic_in_trade_count() {
    let mut seen_qualifying = false;
    for count in 1..=TRADES.len() {
        let input = SettlementInput {
            line_items: TRADES[..count]
                .iter()
                .enumerate()
                .map(|(index, trade)| line(&format!("item-{index}"), trade, 100.0))
                .collect(),
            policy_rules: vec![dwelling_rule(0.0, None)],
            ..SettlementInput::default()
        };

        let summary = calculate_settlement(&input, &table()).expect("settles");

        assert_eq!(summary.qualifies_for_op, count >= 3, "{count} trades");
        if seen_qualifying {
            assert!(summary.qualifies_for_op, "eligibility lost at {count} trades");
        }
        seen_qualifying |= summary.qualifies_for_op;
    }
}

#[test]
fn percentages_and_acv_stay_in_range() {
    let input = SettlementInput {
        line_items: vec![
            line("a", "DRY", 250.0).with_depreciation_pct(150.0),
            line("b", "PNT", 90.0).with_depreciation_pct(-20.0),
            line("c", "FLR", 400.0).aged(-3.0, 10.0),
            line("d", "RFG", 0.0).aged(30.0, 20.0),
            line("e", "DEM", -75.0).aged(5.0, 10.0),
        ],
        policy_rules: vec![dwelling_rule(100.0, Some(50.0))],
        claim_tax_rate: Some(9.5),
        ..SettlementInput::default()
    };

    let summary = calculate_settlement(&input, &table()).expect("settles");

    for item in &summary.items {
        assert!((0.0..=100.0).contains(&item.depreciation_pct), "{}", item.id);
        assert!(item.acv >= 0.0 && item.acv <= item.rcv, "{}", item.id);
        assert!(item.depreciation_amount <= item.rcv, "{}", item.id);
    }
    assert_eq!(summary.item("a").map(|item| item.acv), Some(0.0));
    assert_eq!(summary.item("e").map(|item| item.rcv), Some(0.0));
    for rollup in &summary.coverages {
        assert!(rollup.acv <= rollup.rcv);
        assert!(rollup.net_claim <= rollup.policy_limit.unwrap_or(f64::MAX));
    }
}

#[test]
fn invalid_overrides_abort_with_every_field() {
    let mut input = three_trade_input();
    input.claim_tax_rate = Some(101.0);
    input.overrides = Some(RuleOverrides {
        op_threshold: Some(-2),
        ..RuleOverrides::default()
    });

    let error = calculate_settlement(&input, &table()).expect_err("rejected");

    assert_eq!(error.violations().len(), 2);
}

#[test]
fn op_shares_never_go_negative_for_tiny_lines() {
    let mut input = three_trade_input();
    input.line_items = (0..4)
        .map(|index| line(&format!("dry-{index}"), "DRY", 0.05))
        .chain([line("pnt-1", "PNT", 100.0), line("flr-1", "FLR", 100.0)])
        .collect();

    let summary = calculate_settlement(&input, &table()).expect("settles");

    let drywall = summary.trade("DRY").expect("drywall trade");
    assert_eq!(drywall.overhead, 0.02);
    let mut overhead = 0.0;
    let mut profit = 0.0;
    for item in summary.items.iter().filter(|item| item.category == "DRY") {
        assert!(item.overhead >= 0.0 && item.profit >= 0.0, "{}", item.id);
        assert!(item.rcv >= item.total_price, "{}", item.id);
        overhead = round2(overhead + item.overhead);
        profit = round2(profit + item.profit);
    }
    assert_eq!(overhead, drywall.overhead);
    assert_eq!(profit, drywall.profit);
}

#[test]
fn op_shares_sum_to_trade_amounts_across_uneven_splits() {
    let totals = [0.01, 0.07, 1.0, 3.33, 19.99, 250.5];
    for count in 1..=totals.len() {
        let mut input = three_trade_input();
        input.line_items = totals[..count]
            .iter()
            .enumerate()
            .map(|(index, total)| line(&format!("dry-{index}"), "DRY", *total))
            .chain([line("pnt-1", "PNT", 100.0), line("flr-1", "FLR", 100.0)])
            .collect();

        let summary = calculate_settlement(&input, &table()).expect("settles");

        let drywall = summary.trade("DRY").expect("drywall trade");
        let shares: Vec<f64> = summary
            .items
            .iter()
            .filter(|item| item.category == "DRY")
            .map(|item| item.overhead)
            .collect();
        assert!(shares.iter().all(|share| *share >= 0.0), "{count} lines");
        let allocated = shares.iter().fold(0.0, |sum, share| round2(sum + share));
        assert_eq!(allocated, drywall.overhead, "{count} lines");
    }
}
