use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{CatalogEntry, CatalogSource, MatchContext};
use super::damage::DamageObservation;
use super::quantity::{derive_quantity, quantity_gap_reason, Unit};
use super::trade_map::curated_codes;
use crate::estimation::diagnostics::{EstimateWarning, WarningCode};
use crate::estimation::geometry::DimVarsReport;

/// Why a scope item exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeProvenance {
    DamageTriggered,
    CompanionAuto,
    Template,
    Manual,
}

/// Catalog code bound to a room with its derived quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeItem {
    pub id: String,
    pub room_id: String,
    pub code: String,
    pub description: String,
    pub trade_code: String,
    pub activity: String,
    pub unit: Unit,
    /// `None` until someone measures it; see [`ManualQuantity`].
    pub quantity: Option<f64>,
    pub derivation: Option<String>,
    pub waste_factor: f64,
    pub life_expectancy_years: Option<f64>,
    pub provenance: ScopeProvenance,
    /// Traceability link to the item that auto-added this one.
    pub parent_id: Option<String>,
    /// Codes this item keeps out of the room.
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default = "active")]
    pub active: bool,
}

fn active() -> bool {
    true
}

/// A scope item whose quantity a person has to supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualQuantity {
    pub room_id: String,
    pub item_id: String,
    pub code: String,
    pub reason: String,
}

/// Which lookup produced the primary items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Curated,
    Conditions,
    Unmatched,
}

/// Room being scoped, with the items already active in it.
#[derive(Debug, Clone, Copy)]
pub struct RoomContext<'a> {
    pub room_id: &'a str,
    pub room_type: &'a str,
    pub dim_vars: Option<&'a DimVarsReport>,
    pub active_items: &'a [ScopeItem],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyOutcome {
    pub strategy: MatchStrategy,
    pub items: Vec<ScopeItem>,
    pub manual_quantities: Vec<ManualQuantity>,
    pub warnings: Vec<EstimateWarning>,
}

struct RoomScope<'a> {
    room: &'a RoomContext<'a>,
    active_codes: BTreeSet<String>,
    excluded_codes: BTreeSet<String>,
    next_sequence: usize,
    outcome: AssemblyOutcome,
}

fn code_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Highest numeric id suffix already in use, so new ids never repeat a removed one.
fn last_sequence(items: &[ScopeItem]) -> usize {
    items
        .iter()
        .filter_map(|item| item.id.rsplit('-').next()?.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

impl<'a> RoomScope<'a> {
    fn new(room: &'a RoomContext<'a>) -> Self {
        let mut active_codes = BTreeSet::new();
        let mut excluded_codes = BTreeSet::new();
        for item in room.active_items.iter().filter(|item| item.active) {
            active_codes.insert(code_key(&item.code));
            excluded_codes.extend(item.excludes.iter().map(|code| code_key(code)));
        }

        Self {
            room,
            active_codes,
            excluded_codes,
            next_sequence: last_sequence(room.active_items) + 1,
            outcome: AssemblyOutcome {
                strategy: MatchStrategy::Unmatched,
                items: Vec::new(),
                manual_quantities: Vec::new(),
                warnings: Vec::new(),
            },
        }
    }

    fn admits(&self, code: &str) -> bool {
        let key = code_key(code);
        !self.active_codes.contains(&key) && !self.excluded_codes.contains(&key)
    }

    fn create(
        &mut self,
        entry: &CatalogEntry,
        provenance: ScopeProvenance,
        parent_id: Option<String>,
    ) -> ScopeItem {
        let id = format!("{}-{:03}", self.room.room_id, self.next_sequence);
        self.next_sequence += 1;

        let derived = derive_quantity(&entry.quantity_formula, self.room.dim_vars);
        let (quantity, unit, derivation) = match derived {
            Some(result) => (Some(result.quantity), result.unit, Some(result.derivation)),
            None => {
                self.outcome.manual_quantities.push(ManualQuantity {
                    room_id: self.room.room_id.to_string(),
                    item_id: id.clone(),
                    code: entry.code.clone(),
                    reason: quantity_gap_reason(
                        &entry.quantity_formula,
                        self.room.dim_vars.is_some(),
                    ),
                });
                (None, entry.unit, None)
            }
        };

        self.active_codes.insert(code_key(&entry.code));
        self.excluded_codes
            .extend(entry.companions.excludes.iter().map(|code| code_key(code)));

        let item = ScopeItem {
            id,
            room_id: self.room.room_id.to_string(),
            code: entry.code.clone(),
            description: entry.description.clone(),
            trade_code: entry.trade_code.clone(),
            activity: entry.activity.clone(),
            unit,
            quantity,
            derivation,
            waste_factor: entry.default_waste_factor,
            life_expectancy_years: entry.life_expectancy_years,
            provenance,
            parent_id,
            excludes: entry.companions.excludes.clone(),
            active: true,
        };
        self.outcome.items.push(item.clone());
        item
    }

    fn warn(&mut self, code: WarningCode, message: String) {
        self.outcome
            .warnings
            .push(EstimateWarning::new(code, self.room.room_id, message));
    }
}

/// Build the scope a damage observation implies for one room.
///
/// Curated trade codes are tried first, then catalog condition matching. When
/// neither yields anything the scope stays empty and a warning is raised.
pub async fn assemble_scope<S>(
    source: &S,
    damage: &DamageObservation,
    room: &RoomContext<'_>,
) -> AssemblyOutcome
where
    S: CatalogSource + ?Sized,
{
    let mut scope = RoomScope::new(room);

    let (strategy, primaries) = select_primary_entries(source, damage, room, &mut scope).await;
    scope.outcome.strategy = strategy;

    if primaries.is_empty() {
        scope.warn(
            WarningCode::NoCatalogMatch,
            format!(
                "no catalog items match {} {} damage in a {} ({})",
                damage.severity.label(),
                damage.damage_type.label(),
                room.room_type,
                damage.zone.label()
            ),
        );
        return scope.outcome;
    }

    let mut created = Vec::new();
    for entry in &primaries {
        if !scope.admits(&entry.code) {
            debug!(room = room.room_id, code = %entry.code, "skipping active or excluded code");
            continue;
        }
        let item = scope.create(entry, ScopeProvenance::DamageTriggered, None);
        created.push((item, entry.clone()));
    }

    for (parent, entry) in &created {
        for companion_code in &entry.companions.auto_adds {
            if !scope.admits(companion_code) {
                continue;
            }
            match source.lookup_catalog_item(companion_code).await {
                Ok(Some(companion)) => {
                    scope.create(
                        &companion,
                        ScopeProvenance::CompanionAuto,
                        Some(parent.id.clone()),
                    );
                }
                Ok(None) => scope.warn(
                    WarningCode::MissingCatalogEntry,
                    format!(
                        "companion '{}' of '{}' is not in the catalog",
                        companion_code, parent.code
                    ),
                ),
                Err(err) => {
                    warn!(code = %companion_code, error = %err, "companion lookup failed");
                    scope.warn(
                        WarningCode::CatalogUnavailable,
                        format!("could not look up companion '{}': {}", companion_code, err),
                    );
                }
            }
        }
    }

    for (parent, entry) in &created {
        for required in &entry.companions.requires {
            if !scope.active_codes.contains(&code_key(required)) {
                scope.warn(
                    WarningCode::MissingCompanion,
                    format!("'{}' requires '{}', which is not in scope", parent.code, required),
                );
            }
        }
    }

    scope.outcome
}

async fn select_primary_entries<S>(
    source: &S,
    damage: &DamageObservation,
    room: &RoomContext<'_>,
    scope: &mut RoomScope<'_>,
) -> (MatchStrategy, Vec<CatalogEntry>)
where
    S: CatalogSource + ?Sized,
{
    let mut curated = Vec::new();
    for code in curated_codes(damage.damage_type, damage.severity, damage.zone) {
        match source.lookup_catalog_item(code).await {
            Ok(Some(entry)) => curated.push(entry),
            Ok(None) => debug!(code, "curated code not present in catalog"),
            Err(err) => {
                warn!(code, error = %err, "catalog lookup failed");
                scope.warn(
                    WarningCode::CatalogUnavailable,
                    format!("could not look up '{}': {}", code, err),
                );
            }
        }
    }
    if !curated.is_empty() {
        return (MatchStrategy::Curated, curated);
    }

    let context = MatchContext {
        damage_type: damage.damage_type,
        severity: damage.severity,
        room_type: room.room_type,
        zone: damage.zone,
    };
    match source.catalog_entries().await {
        Ok(entries) => {
            let matched: Vec<CatalogEntry> = entries
                .into_iter()
                .filter(|entry| entry.conditions.matches(&context))
                .collect();
            if matched.is_empty() {
                (MatchStrategy::Unmatched, matched)
            } else {
                (MatchStrategy::Conditions, matched)
            }
        }
        Err(err) => {
            warn!(error = %err, "catalog listing failed");
            scope.warn(
                WarningCode::CatalogUnavailable,
                format!("could not list catalog entries: {}", err),
            );
            (MatchStrategy::Unmatched, Vec::new())
        }
    }
}
