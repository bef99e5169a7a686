use serde::{Deserialize, Serialize};

use super::coverage::CoverageType;
use super::rules::SettlementConfig;
use crate::estimation::depreciation::DepreciationType;
use crate::estimation::diagnostics::EstimateWarning;
use crate::estimation::scope::Unit;

/// Per-trade subtotal with its O&P eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSubtotal {
    pub trade_code: String,
    pub item_count: usize,
    /// Sum of extended prices, before tax and O&P.
    pub subtotal: f64,
    pub op_eligible: bool,
    pub overhead: f64,
    pub profit: f64,
}

/// One line after O&P, tax and depreciation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledLineItem {
    pub id: String,
    pub room_id: Option<String>,
    pub category: String,
    pub description: String,
    pub coverage: CoverageType,
    pub quantity: f64,
    pub unit: Unit,
    pub unit_price: f64,
    pub total_price: f64,
    pub overhead: f64,
    pub profit: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub rcv: f64,
    pub depreciation_pct: f64,
    pub depreciation_type: DepreciationType,
    pub depreciation_amount: f64,
    pub acv: f64,
    /// Paid-when-incurred line whose work is not yet complete.
    pub withheld: bool,
}

/// Money rolled up for one coverage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRollup {
    pub coverage: CoverageType,
    pub line_item_total: f64,
    pub overhead: f64,
    pub profit: f64,
    pub tax: f64,
    pub rcv: f64,
    pub recoverable_depreciation: f64,
    pub non_recoverable_depreciation: f64,
    /// RCV withheld on paid-when-incurred lines until the work is done.
    pub paid_when_incurred: f64,
    pub acv: f64,
    pub deductible: f64,
    pub deductible_applied: f64,
    pub policy_limit: Option<f64>,
    pub net_claim: f64,
    /// Amount the net claim would have exceeded the policy limit by.
    pub over_limit: f64,
}

impl CoverageRollup {
    pub(crate) fn empty(coverage: CoverageType) -> Self {
        Self {
            coverage,
            line_item_total: 0.0,
            overhead: 0.0,
            profit: 0.0,
            tax: 0.0,
            rcv: 0.0,
            recoverable_depreciation: 0.0,
            non_recoverable_depreciation: 0.0,
            paid_when_incurred: 0.0,
            acv: 0.0,
            deductible: 0.0,
            deductible_applied: 0.0,
            policy_limit: None,
            net_claim: 0.0,
            over_limit: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementTotals {
    pub line_item_total: f64,
    pub overhead: f64,
    pub profit: f64,
    pub tax: f64,
    pub rcv: f64,
    pub recoverable_depreciation: f64,
    pub non_recoverable_depreciation: f64,
    pub paid_when_incurred: f64,
    pub acv: f64,
    pub deductible_applied: f64,
    pub net_claim: f64,
    pub over_limit: f64,
}

/// Terminal output of a settlement run. A value, recomputed whenever inputs change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub config: SettlementConfig,
    pub qualifies_for_op: bool,
    pub distinct_trades: usize,
    pub trades: Vec<TradeSubtotal>,
    pub coverages: Vec<CoverageRollup>,
    pub items: Vec<SettledLineItem>,
    pub totals: SettlementTotals,
    pub warnings: Vec<EstimateWarning>,
}

impl SettlementSummary {
    pub fn coverage(&self, coverage: CoverageType) -> Option<&CoverageRollup> {
        self.coverages
            .iter()
            .find(|rollup| rollup.coverage == coverage)
    }

    pub fn trade(&self, trade_code: &str) -> Option<&TradeSubtotal> {
        self.trades
            .iter()
            .find(|trade| trade.trade_code.eq_ignore_ascii_case(trade_code))
    }

    pub fn item(&self, id: &str) -> Option<&SettledLineItem> {
        self.items.iter().find(|item| item.id == id)
    }
}
