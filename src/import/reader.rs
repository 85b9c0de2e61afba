//! Reading observation.org CSV exports into record sets

use std::collections::HashSet;
use std::path::Path;

use crate::error::ImportError;
use crate::models::RecordSet;

/// Read one CSV file with a header row
///
/// Ragged rows are padded or truncated to the header width. Blank header
/// cells become `Unnamed: <index>` and repeated names get a `.<n>` suffix so
/// every column stays addressable.
pub fn read_csv_file(path: &Path) -> Result<RecordSet, ImportError> {
    let read_error = |reason: String| ImportError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_error(e.to_string()))?;

    let headers = reader.headers().map_err(|e| read_error(e.to_string()))?;
    let mut records = RecordSet::new(header_names(headers.iter()));

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| read_error(format!("record {}: {e}", index + 1)))?;
        records.push_row(record.iter().map(str::to_string).collect());
    }

    tracing::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn header_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (index, header) in headers.enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {index}"),
            name => name.to_string(),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.clone()) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }

    names
}
