//! JSON Lines export of stored records

use crate::storage::Storage;
use crate::ScrapeError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every stored record as one JSON object per line
///
/// Absent fields are written as `null`. Returns the number of records
/// written.
pub fn write_records_jsonl<W: Write>(storage: &dyn Storage, out: W) -> Result<usize, ScrapeError> {
    let mut out = BufWriter::new(out);
    let records = storage.all_records()?;

    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(records.len())
}

/// Exports every stored record to a JSON Lines file at `path`
pub fn export_records(storage: &dyn Storage, path: &Path) -> Result<usize, ScrapeError> {
    let file = File::create(path)?;
    let count = write_records_jsonl(storage, file)?;
    tracing::info!("Exported {} records to {}", count, path.display());
    Ok(count)
}
