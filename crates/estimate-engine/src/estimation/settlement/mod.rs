//! Settlement: carrier rule resolution and the RCV → ACV → net claim waterfall.

pub mod coverage;
pub mod engine;
pub mod rules;
pub mod summary;

#[cfg(test)]
mod tests;

pub use coverage::{infer_coverage, CoverageType};
pub use engine::{
    calculate_settlement, settle_with_config, LossContext, PolicyRule, SettlementInput, TaxRule,
};
pub use rules::{
    resolve_settlement_rules, CarrierRuleTable, DepreciationBasis, RuleOverrides, RulesError,
    SettlementConfig,
};
pub use summary::{
    CoverageRollup, SettledLineItem, SettlementSummary, SettlementTotals, TradeSubtotal,
};
