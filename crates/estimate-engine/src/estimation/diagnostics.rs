use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a non-fatal data-quality finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    DefaultedOpeningDimensions,
    OversizedOpening,
    OversizedOpeningArea,
    ExcessiveDeductionRatio,
    NoCatalogMatch,
    MissingCompanion,
    CatalogUnavailable,
    MissingCatalogEntry,
    MissingPrice,
    MissingPolicyRule,
    UnknownCarrier,
}

impl WarningCode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DefaultedOpeningDimensions => "defaulted_opening_dimensions",
            Self::OversizedOpening => "oversized_opening",
            Self::OversizedOpeningArea => "oversized_opening_area",
            Self::ExcessiveDeductionRatio => "excessive_deduction_ratio",
            Self::NoCatalogMatch => "no_catalog_match",
            Self::MissingCompanion => "missing_companion",
            Self::CatalogUnavailable => "catalog_unavailable",
            Self::MissingCatalogEntry => "missing_catalog_entry",
            Self::MissingPrice => "missing_price",
            Self::MissingPolicyRule => "missing_policy_rule",
            Self::UnknownCarrier => "unknown_carrier",
        }
    }
}

/// Advisory finding returned alongside a successful result; never blocks computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateWarning {
    pub code: WarningCode,
    pub subject: String,
    pub message: String,
}

impl EstimateWarning {
    pub fn new(code: WarningCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EstimateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.label(), self.subject, self.message)
    }
}

/// One offending field in a rejected configuration or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// `field: message; field: message` rendering used in error displays.
    pub fn join(violations: &[FieldViolation]) -> String {
        violations
            .iter()
            .map(|violation| violation.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
