//! Composes one inspection into a settlement: room geometry, scope assembly,
//! pricing and the settlement waterfall.
//!
//! The only suspension points are catalog and price lookups. A missing price or
//! an unavailable catalog degrades to a zero-priced line plus a warning.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::diagnostics::{EstimateWarning, FieldViolation, WarningCode};
use super::geometry::{calculate_dim_vars, DimVarsReport};
use super::inspection::Room;
use super::line_item::LineItem;
use super::pricing::{lookup_unit_costs, price_line, PricedAmounts};
use super::scope::{
    assemble_scope, CatalogSource, ManualQuantity, MatchStrategy, RoomContext, ScopeItem,
};
use super::settlement::{
    calculate_settlement, CarrierRuleTable, LossContext, PolicyRule, RuleOverrides, RulesError,
    SettlementInput, SettlementSummary, TaxRule,
};

/// One inspection as the surrounding application hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionEstimate {
    /// Overrides the configured region for price lookups.
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    /// Lines entered by hand, settled alongside the generated scope.
    #[serde(default)]
    pub manual_items: Vec<LineItem>,
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomEstimate {
    pub room_id: String,
    pub dim_vars: Option<DimVarsReport>,
    pub strategies: Vec<MatchStrategy>,
    pub scope: Vec<ScopeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateOutcome {
    pub region_id: String,
    pub rooms: Vec<RoomEstimate>,
    pub line_items: Vec<LineItem>,
    pub manual_quantities: Vec<ManualQuantity>,
    pub warnings: Vec<EstimateWarning>,
    pub settlement: SettlementSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid inspection: {}", FieldViolation::join(.violations))]
    InvalidInspection { violations: Vec<FieldViolation> },
    #[error(transparent)]
    Rules(#[from] RulesError),
}

fn validate_rooms(rooms: &[Room]) -> Result<(), PipelineError> {
    let mut seen = BTreeSet::new();
    let mut violations = Vec::new();
    for (index, room) in rooms.iter().enumerate() {
        let field = format!("rooms[{index}].room_id");
        if room.room_id.trim().is_empty() {
            violations.push(FieldViolation::new(field, "is required"));
        } else if !seen.insert(room.room_id.as_str()) {
            violations.push(FieldViolation::new(
                field,
                format!("duplicate room id '{}'", room.room_id),
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::InvalidInspection { violations })
    }
}

/// Build priced line items for every room and settle them with the manual lines.
pub async fn build_estimate<S>(
    source: &S,
    table: &CarrierRuleTable,
    estimate: &InspectionEstimate,
    default_region: &str,
) -> Result<EstimateOutcome, PipelineError>
where
    S: CatalogSource + ?Sized,
{
    validate_rooms(&estimate.rooms)?;
    let region_id = estimate
        .region_id
        .as_deref()
        .filter(|region| !region.trim().is_empty())
        .unwrap_or(default_region)
        .to_string();

    info!(
        rooms = estimate.rooms.len(),
        manual_items = estimate.manual_items.len(),
        region = %region_id,
        "building estimate"
    );

    let mut rooms = Vec::with_capacity(estimate.rooms.len());
    let mut line_items = Vec::new();
    let mut manual_quantities = Vec::new();
    let mut warnings = Vec::new();

    for room in &estimate.rooms {
        let dim_vars = room
            .dimensions
            .as_ref()
            .map(|dimensions| calculate_dim_vars(dimensions, &room.openings));
        if let Some(report) = &dim_vars {
            warnings.extend(report.warnings.iter().map(|warning| EstimateWarning {
                subject: format!("{}/{}", room.room_id, warning.subject),
                ..warning.clone()
            }));
        }

        let mut scope: Vec<ScopeItem> = Vec::new();
        let mut strategies = Vec::with_capacity(room.damages.len());
        for damage in &room.damages {
            let outcome = assemble_scope(
                source,
                damage,
                &RoomContext {
                    room_id: &room.room_id,
                    room_type: &room.room_type,
                    dim_vars: dim_vars.as_ref(),
                    active_items: &scope,
                },
            )
            .await;
            strategies.push(outcome.strategy);
            scope.extend(outcome.items);
            manual_quantities.extend(outcome.manual_quantities);
            warnings.extend(outcome.warnings);
        }

        for item in scope.iter().filter(|item| item.active) {
            let Some(quantity) = item.quantity else {
                continue;
            };
            let priced = price_scope_item(source, item, quantity, &region_id, &mut warnings).await;
            line_items.push(LineItem {
                id: item.id.clone(),
                room_id: Some(room.room_id.clone()),
                structure: room.structure.clone(),
                category: item.trade_code.clone(),
                description: item.description.clone(),
                code: Some(item.code.clone()),
                quantity,
                unit: item.unit,
                unit_price: priced.unit_price,
                total_price: priced.total_price,
                labor_total: priced.labor_total,
                age_years: room.age_years,
                life_expectancy_years: item.life_expectancy_years,
                depreciation_pct: None,
                depreciation_type: None,
                coverage: None,
                work_completed: false,
            });
        }

        debug!(room = %room.room_id, scope = scope.len(), "room scoped");
        rooms.push(RoomEstimate {
            room_id: room.room_id.clone(),
            dim_vars,
            strategies,
            scope,
        });
    }

    line_items.extend(estimate.manual_items.iter().cloned());

    let input = SettlementInput {
        line_items: line_items.clone(),
        policy_rules: estimate.policy_rules.clone(),
        tax_rules: estimate.tax_rules.clone(),
        carrier_code: estimate.carrier_code.clone(),
        claim_tax_rate: estimate.claim_tax_rate,
        overrides: estimate.overrides.clone(),
        loss: estimate.loss,
    };
    let settlement = calculate_settlement(&input, table)?;
    warnings.extend(settlement.warnings.iter().cloned());

    info!(
        line_items = line_items.len(),
        manual_quantities = manual_quantities.len(),
        warnings = warnings.len(),
        rcv = settlement.totals.rcv,
        "estimate built"
    );

    Ok(EstimateOutcome {
        region_id,
        rooms,
        line_items,
        manual_quantities,
        warnings,
        settlement,
    })
}

async fn price_scope_item<S>(
    source: &S,
    item: &ScopeItem,
    quantity: f64,
    region_id: &str,
    warnings: &mut Vec<EstimateWarning>,
) -> PricedAmounts
where
    S: CatalogSource + ?Sized,
{
    match lookup_unit_costs(source, &item.code, region_id, &item.activity).await {
        Ok(Some(costs)) => price_line(&costs, item.waste_factor, quantity),
        Ok(None) => {
            warnings.push(EstimateWarning::new(
                WarningCode::MissingPrice,
                item.id.as_str(),
                format!(
                    "no {} price for '{}' in region {}; priced at zero",
                    item.activity, item.code, region_id
                ),
            ));
            PricedAmounts::default()
        }
        Err(err) => {
            warn!(code = %item.code, error = %err, "price lookup failed");
            warnings.push(EstimateWarning::new(
                WarningCode::CatalogUnavailable,
                item.id.as_str(),
                format!("price lookup for '{}' failed: {}; priced at zero", item.code, err),
            ));
            PricedAmounts::default()
        }
    }
}
