//! Scope: which catalog items a room needs and how much of each.

pub mod assembly;
pub mod catalog;
pub mod damage;
pub mod quantity;
pub mod trade_map;

pub use assembly::{
    assemble_scope, AssemblyOutcome, ManualQuantity, MatchStrategy, RoomContext, ScopeItem,
    ScopeProvenance,
};
pub use catalog::{
    CatalogEntry, CatalogError, CatalogSource, CompanionRules, InMemoryCatalog, MatchConditions,
    MatchContext, RegionalPrice, UnitCosts,
};
pub use damage::{DamageObservation, DamageType, Severity, Zone};
pub use quantity::{derive_quantity, quantity_gap_reason, QuantityFormula, QuantityResult, Unit};
pub use trade_map::{curated_codes, CuratedTrade};
