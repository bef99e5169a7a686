use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::coverage::{infer_coverage, CoverageType};
use super::rules::{
    resolve_settlement_rules, CarrierRuleTable, DepreciationBasis, RuleOverrides, RulesError,
    SettlementConfig,
};
use super::summary::{
    CoverageRollup, SettledLineItem, SettlementSummary, SettlementTotals, TradeSubtotal,
};
use crate::estimation::depreciation::{
    depreciate, DepreciationContext, DepreciationInput, DepreciationType, RoofSchedule,
};
use crate::estimation::diagnostics::{EstimateWarning, WarningCode};
use crate::estimation::line_item::LineItem;
use crate::estimation::money::{clamp_percent, non_negative, round2};

/// Limit, deductible and O&P terms for one coverage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub coverage: CoverageType,
    #[serde(default)]
    pub policy_limit: Option<f64>,
    #[serde(default)]
    pub deductible: f64,
    #[serde(default)]
    pub overhead_pct: Option<f64>,
    #[serde(default)]
    pub profit_pct: Option<f64>,
    /// Apply the carrier roof-age schedule to roofing under this coverage.
    #[serde(default)]
    pub roof_schedule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    pub id: String,
    /// Categories this rate applies to; matched as substrings of the item category.
    #[serde(default)]
    pub categories: Vec<String>,
    pub rate: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub tax_labor: Option<bool>,
    #[serde(default)]
    pub tax_op: Option<bool>,
}

/// Loss facts that drive depreciation overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossContext {
    #[serde(default)]
    pub water_category: Option<u8>,
    #[serde(default)]
    pub water_class: Option<u8>,
    #[serde(default)]
    pub roof_age_years: Option<f64>,
}

/// Everything a settlement run reads. Passed as plain data; never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementInput {
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub policy_rules: Vec<PolicyRule>,
    #[serde(default)]
    pub tax_rules: Vec<TaxRule>,
    #[serde(default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub claim_tax_rate: Option<f64>,
    #[serde(default)]
    pub overrides: Option<RuleOverrides>,
    #[serde(default)]
    pub loss: LossContext,
}

/// Resolve carrier rules, then run the full settlement waterfall.
pub fn calculate_settlement(
    input: &SettlementInput,
    table: &CarrierRuleTable,
) -> Result<SettlementSummary, RulesError> {
    let config = resolve_settlement_rules(
        table,
        input.carrier_code.as_deref(),
        input.claim_tax_rate,
        input.overrides.as_ref(),
    )?;
    Ok(settle_with_config(input, config))
}

struct TradeGroup {
    members: Vec<usize>,
    subtotal: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct OpShare {
    overhead: f64,
    profit: f64,
}

struct TaxTreatment {
    rate: f64,
    tax_labor: bool,
    tax_op: bool,
}

/// Run the waterfall against an already resolved configuration.
pub fn settle_with_config(input: &SettlementInput, config: SettlementConfig) -> SettlementSummary {
    let mut warnings = Vec::new();
    if let (Some(code), false) = (&input.carrier_code, config.carrier_matched) {
        warnings.push(EstimateWarning::new(
            WarningCode::UnknownCarrier,
            code.clone(),
            format!(
                "carrier '{}' is not in rule table {}; library defaults apply",
                code, config.table_version
            ),
        ));
    }

    let items = &input.line_items;
    let extended: Vec<f64> = items
        .iter()
        .map(|item| round2(non_negative(item.total_price)))
        .collect();

    let mut groups: BTreeMap<String, TradeGroup> = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        let group = groups.entry(item.trade_code()).or_insert_with(|| TradeGroup {
            members: Vec::new(),
            subtotal: 0.0,
        });
        group.members.push(index);
        group.subtotal = round2(group.subtotal + extended[index]);
    }

    // Zero-priced placeholder lines do not count as a trade's work.
    let distinct_trades = groups.values().filter(|group| group.subtotal > 0.0).count();
    let qualifies_for_op = distinct_trades >= config.op_threshold as usize;

    let dwelling_rule = policy_rule(&input.policy_rules, CoverageType::Dwelling);
    let overhead_pct = clamp_percent(
        dwelling_rule
            .and_then(|rule| rule.overhead_pct)
            .unwrap_or(config.overhead_pct),
    );
    let profit_pct = clamp_percent(
        dwelling_rule
            .and_then(|rule| rule.profit_pct)
            .unwrap_or(config.profit_pct),
    );

    let mut shares = vec![OpShare::default(); items.len()];
    let mut trades = Vec::with_capacity(groups.len());
    for (trade_code, group) in &groups {
        let op_eligible = qualifies_for_op && !config.excludes_trade(trade_code);
        let (overhead, profit) = if op_eligible {
            (
                round2(group.subtotal * overhead_pct / 100.0),
                round2(group.subtotal * profit_pct / 100.0),
            )
        } else {
            (0.0, 0.0)
        };

        let overheads = distribute(overhead, group, &extended);
        let profits = distribute(profit, group, &extended);
        for (position, &index) in group.members.iter().enumerate() {
            shares[index] = OpShare {
                overhead: overheads[position],
                profit: profits[position],
            };
        }

        debug!(trade = %trade_code, subtotal = group.subtotal, op_eligible, "trade grouped");
        trades.push(TradeSubtotal {
            trade_code: trade_code.clone(),
            item_count: group.members.len(),
            subtotal: group.subtotal,
            op_eligible,
            overhead,
            profit,
        });
    }

    let mut settled = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        settled.push(settle_item(
            item,
            extended[index],
            shares[index],
            input,
            &config,
        ));
    }

    let mut rollups: BTreeMap<CoverageType, CoverageRollup> = BTreeMap::new();
    for item in &settled {
        let rollup = rollups
            .entry(item.coverage)
            .or_insert_with(|| CoverageRollup::empty(item.coverage));
        rollup.line_item_total = round2(rollup.line_item_total + item.total_price);
        rollup.overhead = round2(rollup.overhead + item.overhead);
        rollup.profit = round2(rollup.profit + item.profit);
        rollup.tax = round2(rollup.tax + item.tax);
        rollup.rcv = round2(rollup.rcv + item.rcv);
        if item.withheld {
            rollup.paid_when_incurred = round2(rollup.paid_when_incurred + item.rcv);
        } else if item.depreciation_type == DepreciationType::NonRecoverable {
            rollup.non_recoverable_depreciation =
                round2(rollup.non_recoverable_depreciation + item.depreciation_amount);
        } else {
            rollup.recoverable_depreciation =
                round2(rollup.recoverable_depreciation + item.depreciation_amount);
        }
    }

    let mut coverages = Vec::with_capacity(rollups.len());
    for (coverage, mut rollup) in rollups {
        rollup.acv = round2(non_negative(
            rollup.rcv
                - rollup.recoverable_depreciation
                - rollup.non_recoverable_depreciation
                - rollup.paid_when_incurred,
        ));

        match policy_rule(&input.policy_rules, coverage) {
            Some(rule) => {
                rollup.deductible = round2(non_negative(rule.deductible));
                rollup.policy_limit = rule.policy_limit.map(|limit| round2(non_negative(limit)));
            }
            None => warnings.push(EstimateWarning::new(
                WarningCode::MissingPolicyRule,
                coverage.code(),
                format!(
                    "no policy rule for {}; no deductible or limit applied",
                    coverage.label()
                ),
            )),
        }

        rollup.deductible_applied = rollup.deductible.min(rollup.acv);
        let candidate = round2(non_negative(rollup.acv - rollup.deductible));
        match rollup.policy_limit {
            Some(limit) if candidate > limit => {
                rollup.net_claim = limit;
                rollup.over_limit = round2(candidate - limit);
            }
            _ => rollup.net_claim = candidate,
        }
        coverages.push(rollup);
    }

    let totals = coverages
        .iter()
        .fold(SettlementTotals::default(), |totals, rollup| SettlementTotals {
            line_item_total: round2(totals.line_item_total + rollup.line_item_total),
            overhead: round2(totals.overhead + rollup.overhead),
            profit: round2(totals.profit + rollup.profit),
            tax: round2(totals.tax + rollup.tax),
            rcv: round2(totals.rcv + rollup.rcv),
            recoverable_depreciation: round2(
                totals.recoverable_depreciation + rollup.recoverable_depreciation,
            ),
            non_recoverable_depreciation: round2(
                totals.non_recoverable_depreciation + rollup.non_recoverable_depreciation,
            ),
            paid_when_incurred: round2(totals.paid_when_incurred + rollup.paid_when_incurred),
            acv: round2(totals.acv + rollup.acv),
            deductible_applied: round2(totals.deductible_applied + rollup.deductible_applied),
            net_claim: round2(totals.net_claim + rollup.net_claim),
            over_limit: round2(totals.over_limit + rollup.over_limit),
        });

    info!(
        carrier = config.carrier_code.as_deref().unwrap_or("-"),
        items = settled.len(),
        distinct_trades,
        qualifies_for_op,
        rcv = totals.rcv,
        acv = totals.acv,
        net_claim = totals.net_claim,
        "settlement calculated"
    );

    SettlementSummary {
        config,
        qualifies_for_op,
        distinct_trades,
        trades,
        coverages,
        items: settled,
        totals,
        warnings,
    }
}

fn policy_rule(rules: &[PolicyRule], coverage: CoverageType) -> Option<&PolicyRule> {
    rules.iter().find(|rule| rule.coverage == coverage)
}

/// Split `amount` across a trade's items by their share of the trade subtotal.
///
/// Whole cents are allocated by largest remainder: every item gets the floor of
/// its exact share, then leftover cents go to the largest fractional parts
/// (earlier items win ties). Shares are never negative and sum exactly to `amount`.
fn distribute(amount: f64, group: &TradeGroup, extended: &[f64]) -> Vec<f64> {
    let mut cents = vec![0_i64; group.members.len()];
    let total_cents = (round2(amount) * 100.0).round() as i64;
    if total_cents <= 0 || group.subtotal <= 0.0 {
        return vec![0.0; group.members.len()];
    }

    let mut remainders = Vec::with_capacity(group.members.len());
    for (position, &index) in group.members.iter().enumerate() {
        let exact = total_cents as f64 * extended[index] / group.subtotal;
        let floor = exact.floor();
        cents[position] = floor as i64;
        remainders.push((position, exact - floor));
    }

    let leftover = total_cents - cents.iter().sum::<i64>();
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    for &(position, _) in remainders.iter().take(leftover.max(0) as usize) {
        cents[position] += 1;
    }

    cents.into_iter().map(|value| value as f64 / 100.0).collect()
}

fn resolve_tax(rules: &[TaxRule], category: &str, config: &SettlementConfig) -> TaxTreatment {
    let category = category.trim().to_ascii_uppercase();
    let matched = rules
        .iter()
        .find(|rule| {
            rule.categories.iter().any(|declared| {
                let declared = declared.trim().to_ascii_uppercase();
                !declared.is_empty() && category.contains(&declared)
            })
        })
        .or_else(|| rules.iter().find(|rule| rule.is_default));

    match matched {
        Some(rule) => TaxTreatment {
            rate: clamp_percent(rule.rate),
            tax_labor: rule.tax_labor.unwrap_or(config.tax_on_labor),
            tax_op: rule.tax_op.unwrap_or(config.tax_on_op),
        },
        None => TaxTreatment {
            rate: clamp_percent(config.fallback_tax_rate),
            tax_labor: config.tax_on_labor,
            tax_op: config.tax_on_op,
        },
    }
}

fn settle_item(
    item: &LineItem,
    total_price: f64,
    share: OpShare,
    input: &SettlementInput,
    config: &SettlementConfig,
) -> SettledLineItem {
    let op = round2(share.overhead + share.profit);

    let treatment = resolve_tax(&input.tax_rules, &item.category, config);
    let mut taxable = total_price;
    if !treatment.tax_labor {
        taxable = round2(taxable - non_negative(item.labor_total).min(total_price));
    }
    if treatment.tax_op {
        taxable = round2(taxable + op);
    }
    let tax = round2(taxable * treatment.rate / 100.0);
    let rcv = round2(total_price + op + tax);

    let basis = match config.depreciation_basis {
        DepreciationBasis::FullRcv => rcv,
        DepreciationBasis::ExcludeTax => round2(total_price + op),
        DepreciationBasis::LineItemOnly => total_price,
    };

    let coverage = infer_coverage(item.coverage, item.structure.as_deref());
    let roof_schedule = config.roof_schedule().or_else(|| {
        policy_rule(&input.policy_rules, coverage)
            .filter(|rule| rule.roof_schedule)
            .map(|_| RoofSchedule {
                threshold_years: config.roof_schedule_threshold_years,
            })
    });
    let context = DepreciationContext {
        water_category: input.loss.water_category,
        water_class: input.loss.water_class,
        roof_schedule,
        roof_age_years: input.loss.roof_age_years,
    };
    let outcome = depreciate(
        &DepreciationInput {
            trade_code: &item.category,
            age_years: item.age_years,
            life_expectancy_years: item.life_expectancy_years,
            override_pct: item.depreciation_pct,
            depreciation_type: item.depreciation_type,
            work_completed: item.work_completed,
            basis,
            rcv,
        },
        &context,
    );

    SettledLineItem {
        id: item.id.clone(),
        room_id: item.room_id.clone(),
        category: item.trade_code(),
        description: item.description.clone(),
        coverage,
        quantity: item.quantity,
        unit: item.unit,
        unit_price: round2(item.unit_price),
        total_price,
        overhead: share.overhead,
        profit: share.profit,
        tax_rate: treatment.rate,
        tax,
        rcv,
        depreciation_pct: outcome.percent,
        depreciation_type: outcome.depreciation_type,
        depreciation_amount: outcome.amount,
        acv: outcome.acv,
        withheld: outcome.withheld,
    }
}
