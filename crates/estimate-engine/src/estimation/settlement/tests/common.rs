use crate::estimation::line_item::LineItem;
use crate::estimation::scope::Unit;
use crate::estimation::settlement::{
    CarrierRuleTable, CoverageType, PolicyRule, RuleOverrides, SettlementInput, TaxRule,
};

pub(super) fn table() -> CarrierRuleTable {
    CarrierRuleTable::standard()
}

/// A line priced at a flat total, quantity 1.
pub(super) fn line(id: &str, trade: &str, total: f64) -> LineItem {
    LineItem::new(id, trade, format!("{trade} work"), 1.0, Unit::Each, total)
}

pub(super) fn dwelling_rule(deductible: f64, limit: Option<f64>) -> PolicyRule {
    PolicyRule {
        coverage: CoverageType::Dwelling,
        policy_limit: limit,
        deductible,
        overhead_pct: None,
        profit_pct: None,
        roof_schedule: false,
    }
}

pub(super) fn default_tax(rate: f64) -> TaxRule {
    TaxRule {
        id: "default".to_string(),
        categories: Vec::new(),
        rate,
        is_default: true,
        tax_labor: None,
        tax_op: None,
    }
}

/// DRY, PNT and FLR at 100 each with 10/10 O&P and no tax.
pub(super) fn three_trade_input() -> SettlementInput {
    SettlementInput {
        line_items: vec![
            line("dry-1", "DRY", 100.0),
            line("pnt-1", "PNT", 100.0),
            line("flr-1", "FLR", 100.0),
        ],
        policy_rules: vec![dwelling_rule(0.0, None)],
        tax_rules: Vec::new(),
        carrier_code: None,
        claim_tax_rate: None,
        overrides: Some(RuleOverrides {
            overhead_pct: Some(10.0),
            profit_pct: Some(10.0),
            ..RuleOverrides::default()
        }),
        ..SettlementInput::default()
    }
}
