//! Per-line depreciation: age/life percentage, water contamination overrides,
//! the roof-age schedule and paid-when-incurred handling.

use serde::{Deserialize, Serialize};

use super::money::{clamp_percent, non_negative, round2};

/// Trades forced to 50% under category 2 water at class 3 or above.
const WATER_FORCED_TRADES: &[&str] = &["DEM", "RFG", "FLR", "EXT", "SDG"];
/// Mitigation and drywall trades, never depreciated while a water override applies.
const WATER_EXEMPT_TRADES: &[&str] = &["MIT", "WTR", "DRY"];
const WATER_FORCED_PCT: f64 = 50.0;
const ROOFING_TRADE: &str = "RFG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepreciationType {
    #[default]
    #[serde(rename = "Recoverable")]
    Recoverable,
    #[serde(rename = "Non-Recoverable")]
    NonRecoverable,
    #[serde(rename = "Paid When Incurred")]
    PaidWhenIncurred,
}

impl DepreciationType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recoverable => "Recoverable",
            Self::NonRecoverable => "Non-Recoverable",
            Self::PaidWhenIncurred => "Paid When Incurred",
        }
    }
}

/// Carrier roof-age schedule: roofing at or past the threshold depreciates non-recoverably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofSchedule {
    pub threshold_years: f64,
}

/// Loss-level facts that change how every line depreciates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationContext {
    /// IICRC water category (1 clean, 2 grey, 3 black).
    pub water_category: Option<u8>,
    /// IICRC water class (1 through 4).
    pub water_class: Option<u8>,
    pub roof_schedule: Option<RoofSchedule>,
    pub roof_age_years: Option<f64>,
}

/// What the depreciation module needs to know about one line.
#[derive(Debug, Clone, Copy)]
pub struct DepreciationInput<'a> {
    pub trade_code: &'a str,
    pub age_years: Option<f64>,
    pub life_expectancy_years: Option<f64>,
    pub override_pct: Option<f64>,
    pub depreciation_type: Option<DepreciationType>,
    pub work_completed: bool,
    /// Amount the percentage is applied to, per the carrier's depreciation basis.
    pub basis: f64,
    pub rcv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepreciationOutcome {
    pub percent: f64,
    pub depreciation_type: DepreciationType,
    pub amount: f64,
    pub acv: f64,
    /// True while a paid-when-incurred line is still waiting on the work.
    pub withheld: bool,
}

fn trade_in(trade_code: &str, trades: &[&str]) -> bool {
    trades
        .iter()
        .any(|trade| trade.eq_ignore_ascii_case(trade_code.trim()))
}

/// Depreciation percentage in `[0, 100]`, kept to two decimals.
///
/// Water overrides run first: class 4 and category 3 force zero, category 2 at
/// class 3+ forces 50% on tear-out and envelope trades and zero on mitigation
/// and drywall. Otherwise an explicit override wins over age/life.
pub fn depreciation_percent(input: &DepreciationInput<'_>, context: &DepreciationContext) -> f64 {
    if let Some(percent) = water_override(input.trade_code, context) {
        return percent;
    }

    let percent = match (input.override_pct, input.age_years, input.life_expectancy_years) {
        (Some(explicit), _, _) => explicit,
        (None, Some(age), Some(life)) if life > 0.0 => non_negative(age) / life * 100.0,
        _ => 0.0,
    };
    round2(clamp_percent(percent))
}

fn water_override(trade_code: &str, context: &DepreciationContext) -> Option<f64> {
    if context.water_class == Some(4) {
        return Some(0.0);
    }
    match context.water_category {
        Some(3) => Some(0.0),
        Some(2) if context.water_class.is_some_and(|class| class >= 3) => {
            if trade_in(trade_code, WATER_FORCED_TRADES) {
                Some(WATER_FORCED_PCT)
            } else if trade_in(trade_code, WATER_EXEMPT_TRADES) {
                Some(0.0)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Resolved depreciation type for a line, applying the roof-age schedule.
pub fn depreciation_type(
    input: &DepreciationInput<'_>,
    context: &DepreciationContext,
) -> DepreciationType {
    let declared = input.depreciation_type.unwrap_or_default();
    if declared == DepreciationType::PaidWhenIncurred {
        return declared;
    }

    let schedule_applies = match (context.roof_schedule, context.roof_age_years) {
        (Some(schedule), Some(age)) => age >= schedule.threshold_years,
        _ => false,
    };
    if schedule_applies && input.trade_code.trim().eq_ignore_ascii_case(ROOFING_TRADE) {
        DepreciationType::NonRecoverable
    } else {
        declared
    }
}

/// Depreciate one line: amount is `basis × percent`, capped at the line's RCV.
pub fn depreciate(
    input: &DepreciationInput<'_>,
    context: &DepreciationContext,
) -> DepreciationOutcome {
    let rcv = round2(non_negative(input.rcv));
    let percent = depreciation_percent(input, context);
    let depreciation_type = depreciation_type(input, context);
    let amount = round2(non_negative(input.basis) * percent / 100.0).min(rcv);

    let withheld = depreciation_type == DepreciationType::PaidWhenIncurred && !input.work_completed;
    let acv = if withheld {
        0.0
    } else {
        round2(non_negative(rcv - amount))
    };

    DepreciationOutcome {
        percent,
        depreciation_type,
        amount,
        acv,
        withheld,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(trade: &str) -> DepreciationInput<'_> {
        DepreciationInput {
            trade_code: trade,
            age_years: Some(10.0),
            life_expectancy_years: Some(20.0),
            override_pct: None,
            depreciation_type: None,
            work_completed: false,
            basis: 1000.0,
            rcv: 1000.0,
        }
    }

    fn water(category: u8, class: u8) -> DepreciationContext {
        DepreciationContext {
            water_category: Some(category),
            water_class: Some(class),
            ..DepreciationContext::default()
        }
    }

    #[test]
    fn age_over_life_is_clamped() {
        let context = DepreciationContext::default();
        assert_eq!(depreciation_percent(&input("PNT"), &context), 50.0);

        let worn = DepreciationInput {
            age_years: Some(40.0),
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&worn, &context), 100.0);

        let unknown_life = DepreciationInput {
            life_expectancy_years: None,
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&unknown_life, &context), 0.0);

        let zero_life = DepreciationInput {
            life_expectancy_years: Some(0.0),
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&zero_life, &context), 0.0);
    }

    #[test]
    fn explicit_override_wins_over_age() {
        let context = DepreciationContext::default();
        let overridden = DepreciationInput {
            override_pct: Some(130.0),
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&overridden, &context), 100.0);

        let negative = DepreciationInput {
            override_pct: Some(-5.0),
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&negative, &context), 0.0);
    }

    #[test]
    fn category_three_forces_zero_everywhere() {
        let context = water(3, 2);
        for trade in ["DEM", "RFG", "PNT", "DRY"] {
            let aged = DepreciationInput {
                override_pct: Some(80.0),
                ..input(trade)
            };
            let outcome = depreciate(&aged, &context);
            assert_eq!(outcome.percent, 0.0, "{trade}");
            assert_eq!(outcome.acv, 1000.0);
        }
    }

    #[test]
    fn category_two_high_class_splits_by_trade() {
        let context = water(2, 3);
        assert_eq!(depreciation_percent(&input("dem"), &context), 50.0);
        assert_eq!(depreciation_percent(&input("FLR"), &context), 50.0);
        assert_eq!(depreciation_percent(&input("MIT"), &context), 0.0);
        assert_eq!(depreciation_percent(&input("DRY"), &context), 0.0);
        assert_eq!(depreciation_percent(&input("PNT"), &context), 50.0);

        let young_paint = DepreciationInput {
            age_years: Some(2.0),
            ..input("PNT")
        };
        assert_eq!(depreciation_percent(&young_paint, &context), 10.0);
    }

    #[test]
    fn class_four_forces_zero_regardless_of_category() {
        assert_eq!(depreciation_percent(&input("DEM"), &water(1, 4)), 0.0);
        assert_eq!(depreciation_percent(&input("DEM"), &water(2, 4)), 0.0);
    }

    #[test]
    fn low_water_class_uses_age() {
        assert_eq!(depreciation_percent(&input("DEM"), &water(2, 2)), 50.0);
        let young = DepreciationInput {
            age_years: Some(5.0),
            ..input("DEM")
        };
        assert_eq!(depreciation_percent(&young, &water(2, 2)), 25.0);
    }

    #[test]
    fn roof_schedule_makes_old_roofing_non_recoverable() {
        let context = DepreciationContext {
            roof_schedule: Some(RoofSchedule {
                threshold_years: 15.0,
            }),
            roof_age_years: Some(15.0),
            ..DepreciationContext::default()
        };
        assert_eq!(
            depreciate(&input("RFG"), &context).depreciation_type,
            DepreciationType::NonRecoverable
        );
        assert_eq!(
            depreciate(&input("GTR"), &context).depreciation_type,
            DepreciationType::Recoverable
        );

        let young_roof = DepreciationContext {
            roof_age_years: Some(14.0),
            ..context
        };
        assert_eq!(
            depreciate(&input("RFG"), &young_roof).depreciation_type,
            DepreciationType::Recoverable
        );
    }

    #[test]
    fn paid_when_incurred_withholds_until_complete() {
        let context = DepreciationContext::default();
        let pending = DepreciationInput {
            depreciation_type: Some(DepreciationType::PaidWhenIncurred),
            ..input("PNT")
        };
        let outcome = depreciate(&pending, &context);
        assert!(outcome.withheld);
        assert_eq!(outcome.acv, 0.0);

        let done = DepreciationInput {
            work_completed: true,
            ..pending
        };
        let outcome = depreciate(&done, &context);
        assert!(!outcome.withheld);
        assert_eq!(outcome.acv, 500.0);
    }

    #[test]
    fn amount_never_exceeds_rcv() {
        let context = DepreciationContext::default();
        let inflated = DepreciationInput {
            override_pct: Some(100.0),
            basis: 1200.0,
            rcv: 1000.0,
            ..input("PNT")
        };
        let outcome = depreciate(&inflated, &context);
        assert_eq!(outcome.amount, 1000.0);
        assert_eq!(outcome.acv, 0.0);
    }
}
