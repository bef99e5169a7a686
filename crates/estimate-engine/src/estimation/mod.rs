//! Estimation and settlement: geometry → scope → pricing → depreciation →
//! settlement waterfall → interchange export.

pub mod depreciation;
mod diagnostics;
pub mod geometry;
pub mod inspection;
pub mod interchange;
pub mod line_item;
pub mod money;
pub mod pipeline;
pub mod pricing;
pub mod scope;
pub mod settlement;

pub use diagnostics::{EstimateWarning, FieldViolation, WarningCode};
pub use inspection::Room;
pub use line_item::LineItem;
