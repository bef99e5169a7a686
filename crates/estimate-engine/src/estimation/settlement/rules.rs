use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::estimation::depreciation::RoofSchedule;
use crate::estimation::diagnostics::FieldViolation;

pub const DEFAULT_OP_THRESHOLD: u32 = 3;
pub const DEFAULT_OVERHEAD_PCT: f64 = 10.0;
pub const DEFAULT_PROFIT_PCT: f64 = 10.0;
pub const DEFAULT_ROOF_THRESHOLD_YEARS: f64 = 15.0;

/// What the depreciation percentage is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationBasis {
    /// Extended price plus O&P share plus tax.
    #[default]
    FullRcv,
    /// Extended price plus O&P share.
    ExcludeTax,
    /// Extended price only.
    LineItemOnly,
}

impl DepreciationBasis {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full_rcv" => Some(Self::FullRcv),
            "exclude_tax" => Some(Self::ExcludeTax),
            "line_item_only" => Some(Self::LineItemOnly),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullRcv => "full_rcv",
            Self::ExcludeTax => "exclude_tax",
            Self::LineItemOnly => "line_item_only",
        }
    }
}

/// One layer of settlement rule fields. Unset fields inherit from the layer below.
///
/// Used both for carrier table entries and caller-supplied overrides. Values are
/// kept loose (signed threshold, free-text basis) so bad input reaches validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverrides {
    #[serde(default)]
    pub op_threshold: Option<i64>,
    #[serde(default)]
    pub overhead_pct: Option<f64>,
    #[serde(default)]
    pub profit_pct: Option<f64>,
    #[serde(default)]
    pub tax_on_labor: Option<bool>,
    #[serde(default)]
    pub tax_on_op: Option<bool>,
    #[serde(default)]
    pub depreciation_basis: Option<String>,
    #[serde(default)]
    pub excluded_op_trades: Option<Vec<String>>,
    #[serde(default)]
    pub roof_schedule_enabled: Option<bool>,
    #[serde(default)]
    pub roof_schedule_threshold_years: Option<f64>,
    #[serde(default)]
    pub default_tax_rate: Option<f64>,
}

/// Immutable, versioned carrier rule lookup, keyed by upper-cased carrier code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierRuleTable {
    pub version: String,
    carriers: BTreeMap<String, RuleOverrides>,
}

impl CarrierRuleTable {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            carriers: BTreeMap::new(),
        }
    }

    pub fn with_carrier(mut self, code: &str, rules: RuleOverrides) -> Self {
        self.carriers.insert(code.trim().to_ascii_uppercase(), rules);
        self
    }

    pub fn get(&self, code: &str) -> Option<&RuleOverrides> {
        self.carriers.get(&code.trim().to_ascii_uppercase())
    }

    pub fn carrier_codes(&self) -> impl Iterator<Item = &str> {
        self.carriers.keys().map(String::as_str)
    }

    /// Built-in carrier programs shipped with the engine.
    pub fn standard() -> Self {
        Self::new("2026.1")
            .with_carrier(
                "HOMESTEAD",
                RuleOverrides {
                    op_threshold: Some(3),
                    tax_on_labor: Some(false),
                    excluded_op_trades: Some(vec!["WTR".to_string(), "MIT".to_string()]),
                    ..RuleOverrides::default()
                },
            )
            .with_carrier(
                "PRAIRIE",
                RuleOverrides {
                    op_threshold: Some(2),
                    overhead_pct: Some(10.0),
                    profit_pct: Some(5.0),
                    tax_on_op: Some(true),
                    depreciation_basis: Some("exclude_tax".to_string()),
                    roof_schedule_enabled: Some(true),
                    roof_schedule_threshold_years: Some(10.0),
                    ..RuleOverrides::default()
                },
            )
            .with_carrier(
                "LAKESIDE",
                RuleOverrides {
                    op_threshold: Some(4),
                    depreciation_basis: Some("line_item_only".to_string()),
                    roof_schedule_enabled: Some(true),
                    ..RuleOverrides::default()
                },
            )
    }
}

/// Fully resolved carrier-specific settlement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    pub carrier_code: Option<String>,
    /// Whether `carrier_code` was found in the rule table.
    pub carrier_matched: bool,
    pub table_version: String,
    pub op_threshold: u32,
    pub overhead_pct: f64,
    pub profit_pct: f64,
    pub tax_on_labor: bool,
    pub tax_on_op: bool,
    pub depreciation_basis: DepreciationBasis,
    pub excluded_op_trades: BTreeSet<String>,
    pub roof_schedule_enabled: bool,
    pub roof_schedule_threshold_years: f64,
    /// Flat tax rate used when no tax rule matches.
    pub fallback_tax_rate: f64,
}

impl SettlementConfig {
    pub fn roof_schedule(&self) -> Option<RoofSchedule> {
        self.roof_schedule_enabled.then_some(RoofSchedule {
            threshold_years: self.roof_schedule_threshold_years,
        })
    }

    pub fn excludes_trade(&self, trade_code: &str) -> bool {
        self.excluded_op_trades
            .contains(&trade_code.trim().to_ascii_uppercase())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("invalid settlement rules: {}", FieldViolation::join(.violations))]
    Invalid { violations: Vec<FieldViolation> },
}

impl RulesError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Invalid { violations } => violations,
        }
    }
}

/// Working copy of the merge before validation narrows the types.
struct Layered {
    op_threshold: i64,
    overhead_pct: f64,
    profit_pct: f64,
    tax_on_labor: bool,
    tax_on_op: bool,
    depreciation_basis: String,
    excluded_op_trades: Vec<String>,
    roof_schedule_enabled: bool,
    roof_schedule_threshold_years: f64,
    tax_rate: f64,
}

impl Layered {
    fn defaults() -> Self {
        Self {
            op_threshold: i64::from(DEFAULT_OP_THRESHOLD),
            overhead_pct: DEFAULT_OVERHEAD_PCT,
            profit_pct: DEFAULT_PROFIT_PCT,
            tax_on_labor: true,
            tax_on_op: false,
            depreciation_basis: DepreciationBasis::FullRcv.label().to_string(),
            excluded_op_trades: Vec::new(),
            roof_schedule_enabled: false,
            roof_schedule_threshold_years: DEFAULT_ROOF_THRESHOLD_YEARS,
            tax_rate: 0.0,
        }
    }

    fn apply(&mut self, layer: &RuleOverrides) {
        if let Some(value) = layer.op_threshold {
            self.op_threshold = value;
        }
        if let Some(value) = layer.overhead_pct {
            self.overhead_pct = value;
        }
        if let Some(value) = layer.profit_pct {
            self.profit_pct = value;
        }
        if let Some(value) = layer.tax_on_labor {
            self.tax_on_labor = value;
        }
        if let Some(value) = layer.tax_on_op {
            self.tax_on_op = value;
        }
        if let Some(value) = &layer.depreciation_basis {
            self.depreciation_basis = value.clone();
        }
        if let Some(value) = &layer.excluded_op_trades {
            self.excluded_op_trades = value.clone();
        }
        if let Some(value) = layer.roof_schedule_enabled {
            self.roof_schedule_enabled = value;
        }
        if let Some(value) = layer.roof_schedule_threshold_years {
            self.roof_schedule_threshold_years = value;
        }
        if let Some(value) = layer.default_tax_rate {
            self.tax_rate = value;
        }
    }
}

fn check_percent(violations: &mut Vec<FieldViolation>, field: &str, value: f64) {
    if !(0.0..=100.0).contains(&value) {
        violations.push(FieldViolation::new(
            field,
            format!("must be between 0 and 100, got {}", value),
        ));
    }
}

/// Merge defaults, the carrier entry, the claim tax rate and caller overrides, then validate.
///
/// Every invalid field is reported, not only the first.
pub fn resolve_settlement_rules(
    table: &CarrierRuleTable,
    carrier_code: Option<&str>,
    claim_tax_rate: Option<f64>,
    overrides: Option<&RuleOverrides>,
) -> Result<SettlementConfig, RulesError> {
    let mut layered = Layered::defaults();

    let carrier = carrier_code.and_then(|code| table.get(code));
    match (carrier_code, carrier) {
        (_, Some(carrier)) => layered.apply(carrier),
        (Some(code), None) => debug!(
            carrier = code,
            known = ?table.carrier_codes().collect::<Vec<_>>(),
            "carrier not in rule table"
        ),
        (None, None) => {}
    }
    if let Some(rate) = claim_tax_rate {
        layered.tax_rate = rate;
    }
    if let Some(overrides) = overrides {
        layered.apply(overrides);
    }

    let mut violations = Vec::new();
    if layered.op_threshold < 1 {
        violations.push(FieldViolation::new(
            "op_threshold",
            format!("must be at least 1, got {}", layered.op_threshold),
        ));
    }
    check_percent(&mut violations, "tax_rate", layered.tax_rate);
    check_percent(&mut violations, "overhead_pct", layered.overhead_pct);
    check_percent(&mut violations, "profit_pct", layered.profit_pct);
    let basis = DepreciationBasis::parse(&layered.depreciation_basis);
    if basis.is_none() {
        violations.push(FieldViolation::new(
            "depreciation_basis",
            format!(
                "unknown value '{}' (expected full_rcv, exclude_tax or line_item_only)",
                layered.depreciation_basis
            ),
        ));
    }
    let roof_threshold = layered.roof_schedule_threshold_years;
    if roof_threshold.is_nan() || roof_threshold < 0.0 {
        violations.push(FieldViolation::new(
            "roof_schedule_threshold_years",
            "must not be negative",
        ));
    }

    let depreciation_basis = match basis {
        Some(basis) if violations.is_empty() => basis,
        _ => return Err(RulesError::Invalid { violations }),
    };

    Ok(SettlementConfig {
        carrier_code: carrier_code.map(|code| code.trim().to_ascii_uppercase()),
        carrier_matched: carrier.is_some(),
        table_version: table.version.clone(),
        op_threshold: u32::try_from(layered.op_threshold).unwrap_or(u32::MAX),
        overhead_pct: layered.overhead_pct,
        profit_pct: layered.profit_pct,
        tax_on_labor: layered.tax_on_labor,
        tax_on_op: layered.tax_on_op,
        depreciation_basis,
        excluded_op_trades: layered
            .excluded_op_trades
            .iter()
            .map(|trade| trade.trim().to_ascii_uppercase())
            .collect(),
        roof_schedule_enabled: layered.roof_schedule_enabled,
        roof_schedule_threshold_years: layered.roof_schedule_threshold_years,
        fallback_tax_rate: layered.tax_rate,
    })
}

impl fmt::Display for SettlementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "carrier={} table={} threshold={} o&p={}/{} basis={}",
            self.carrier_code.as_deref().unwrap_or("-"),
            self.table_version,
            self.op_threshold,
            self.overhead_pct,
            self.profit_pct,
            self.depreciation_basis.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_carrier() {
        let config = resolve_settlement_rules(&CarrierRuleTable::standard(), None, None, None)
            .expect("defaults are valid");

        assert_eq!(config.op_threshold, 3);
        assert!(config.tax_on_labor);
        assert!(!config.tax_on_op);
        assert_eq!(config.depreciation_basis, DepreciationBasis::FullRcv);
        assert_eq!(config.fallback_tax_rate, 0.0);
        assert!(!config.carrier_matched);
        assert!(config.roof_schedule().is_none());
    }

    #[test]
    fn layers_overwrite_only_specified_fields() {
        let overrides = RuleOverrides {
            profit_pct: Some(8.0),
            ..RuleOverrides::default()
        };
        let config = resolve_settlement_rules(
            &CarrierRuleTable::standard(),
            Some("prairie"),
            Some(7.0),
            Some(&overrides),
        )
        .expect("valid layering");

        assert!(config.carrier_matched);
        assert_eq!(config.carrier_code.as_deref(), Some("PRAIRIE"));
        assert_eq!(config.op_threshold, 2);
        assert_eq!(config.overhead_pct, 10.0);
        assert_eq!(config.profit_pct, 8.0);
        assert!(config.tax_on_labor);
        assert!(config.tax_on_op);
        assert_eq!(config.depreciation_basis, DepreciationBasis::ExcludeTax);
        assert_eq!(config.fallback_tax_rate, 7.0);
        assert_eq!(
            config.roof_schedule(),
            Some(RoofSchedule {
                threshold_years: 10.0
            })
        );
    }

    #[test]
    fn caller_overrides_beat_claim_tax_rate() {
        let overrides = RuleOverrides {
            default_tax_rate: Some(6.5),
            ..RuleOverrides::default()
        };
        let config = resolve_settlement_rules(
            &CarrierRuleTable::standard(),
            None,
            Some(7.0),
            Some(&overrides),
        )
        .expect("valid");
        assert_eq!(config.fallback_tax_rate, 6.5);
    }

    #[test]
    fn excluded_trades_are_normalised() {
        let config =
            resolve_settlement_rules(&CarrierRuleTable::standard(), Some("HOMESTEAD"), None, None)
                .expect("valid");
        assert!(config.excludes_trade("wtr"));
        assert!(config.excludes_trade(" MIT "));
        assert!(!config.excludes_trade("DRY"));
        assert!(!config.tax_on_labor);
    }

    #[test]
    fn validation_collects_every_violation() {
        let overrides = RuleOverrides {
            op_threshold: Some(0),
            default_tax_rate: Some(120.0),
            depreciation_basis: Some("half_rcv".to_string()),
            overhead_pct: Some(-1.0),
            ..RuleOverrides::default()
        };
        let error = resolve_settlement_rules(
            &CarrierRuleTable::standard(),
            None,
            None,
            Some(&overrides),
        )
        .expect_err("invalid overrides rejected");

        let fields: Vec<&str> = error
            .violations()
            .iter()
            .map(|violation| violation.field.as_str())
            .collect();
        assert_eq!(
            fields,
            vec!["op_threshold", "tax_rate", "overhead_pct", "depreciation_basis"]
        );
        assert!(error.to_string().contains("half_rcv"));
    }

    #[test]
    fn claim_tax_rate_out_of_range_is_rejected() {
        let error =
            resolve_settlement_rules(&CarrierRuleTable::standard(), None, Some(-0.5), None)
                .expect_err("negative tax rejected");
        assert_eq!(error.violations().len(), 1);
        assert_eq!(error.violations()[0].field, "tax_rate");
    }
}
