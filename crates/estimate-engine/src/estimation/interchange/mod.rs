//! Estimate interchange export: a header document and a detail document packaged
//! into one deflated container the receiving estimate platform ingests.
//!
//! Output is a pure function of the document and [`ExportOptions`]. The options
//! carry the only volatile fields (generation timestamp and transaction id).

mod claim;
mod detail;
mod header;
mod package;
mod validation;
pub mod xml;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::estimation::diagnostics::FieldViolation;
use crate::estimation::inspection::Room;
use crate::estimation::settlement::{PolicyRule, SettlementSummary};

pub use claim::{Address, ClaimInfo, ControlPoint, ControlPointStatus, PerilDetail};
pub use detail::render_detail;
pub use header::render_header;
pub use package::{package_documents, DETAIL_ENTRY, HEADER_ENTRY};
pub use validation::validate_document;

/// Everything the serializer walks.
#[derive(Debug, Clone, Copy)]
pub struct InterchangeDocument<'a> {
    pub claim: &'a ClaimInfo,
    pub rooms: &'a [Room],
    pub policy_rules: &'a [PolicyRule],
    pub summary: &'a SettlementSummary,
}

/// Volatile header fields, excluded from replay equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub generated_at: DateTime<Utc>,
    pub transaction_id: String,
}

impl ExportOptions {
    pub fn new(generated_at: DateTime<Utc>, transaction_id: impl Into<String>) -> Self {
        Self {
            generated_at,
            transaction_id: transaction_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("interchange validation failed: {}", FieldViolation::join(.violations))]
    Validation { violations: Vec<FieldViolation> },
    #[error("failed to build interchange container: {0}")]
    Container(#[from] zip::result::ZipError),
    #[error("failed to write interchange entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate, render both documents and package them. Nothing is produced when validation fails.
pub fn export_interchange(
    document: &InterchangeDocument<'_>,
    options: &ExportOptions,
) -> Result<Vec<u8>, InterchangeError> {
    validate_document(document)?;

    let header = render_header(document, options);
    let detail = render_detail(document);
    let bytes = package_documents(&header, &detail)?;

    info!(
        claim = %document.claim.claim_number,
        transaction_id = %options.transaction_id,
        rooms = document.rooms.len(),
        items = document.summary.items.len(),
        bytes = bytes.len(),
        "interchange package written"
    );
    Ok(bytes)
}
