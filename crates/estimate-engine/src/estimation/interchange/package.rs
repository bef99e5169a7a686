use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::InterchangeError;

/// Header entry name fixed by the receiving platform.
pub const HEADER_ENTRY: &str = "XACTDOC.XML";
/// Detail entry name fixed by the receiving platform.
pub const DETAIL_ENTRY: &str = "GENERIC_ROUGHDRAFT.XML";

/// Package both documents into a deflated container, header first.
///
/// Entries carry a fixed modification time so identical documents produce identical bytes.
pub fn package_documents(header: &str, detail: &str) -> Result<Vec<u8>, InterchangeError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(HEADER_ENTRY, options)?;
    writer.write_all(header.as_bytes())?;
    writer.start_file(DETAIL_ENTRY, options)?;
    writer.write_all(detail.as_bytes())?;

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
