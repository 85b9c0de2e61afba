//! Snapshot import of observation.org CSV exports
//!
//! Every import wholly replaces the stored table: importing the same files
//! twice leaves the same snapshot.

pub mod reader;

pub use reader::read_csv_file;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::ImportError;
use crate::models::{IMPORT_COLUMNS, RecordSet};
use crate::storage::ObservationStore;

/// Statistics from an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Number of files read
    pub files_processed: usize,
    /// Number of observation rows stored
    pub records_imported: usize,
    /// Time taken
    pub duration: Duration,
}

/// Resolve a comma-separated pattern list to files, in order
///
/// A pattern without a directory component is looked up in `base_dir`.
/// Matches of each pattern are sorted by path.
pub fn discover_files(patterns: &str, base_dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();

    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let full_pattern = resolve_pattern(pattern, base_dir);
        let entries = glob::glob(&full_pattern)
            .map_err(|e| ImportError::InvalidPattern(format!("{pattern}: {e}")))?;

        let mut matched = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => matched.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Error accessing path: {}", e),
            }
        }
        matched.sort();

        if matched.is_empty() {
            tracing::warn!("No file matches '{}'", full_pattern);
        }
        files.extend(matched);
    }

    Ok(files)
}

fn resolve_pattern(pattern: &str, base_dir: &Path) -> String {
    let path = Path::new(pattern);
    let has_directory = path.is_absolute()
        || path
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());
    if has_directory {
        pattern.to_string()
    } else {
        base_dir.join(pattern).to_string_lossy().into_owned()
    }
}

/// Read the matched files and replace `table` with their rows
pub fn import_observations(
    store: &mut dyn ObservationStore,
    table: &str,
    patterns: &str,
    base_dir: &Path,
) -> Result<ImportStats, ImportError> {
    let start = Instant::now();
    let files = discover_files(patterns, base_dir)?;
    if files.is_empty() {
        tracing::warn!(
            "No files matched '{}'; table '{}' will be emptied",
            patterns,
            table
        );
    }

    let mut records = RecordSet::new(IMPORT_COLUMNS);
    for path in &files {
        records.append(read_csv_file(path)?);
    }

    store.replace_table(table, &records)?;

    let stats = ImportStats {
        files_processed: files.len(),
        records_imported: records.len(),
        duration: start.elapsed(),
    };
    tracing::info!(
        "Imported {} observation(s) from {} file(s) into {} table '{}'",
        stats.records_imported,
        stats.files_processed,
        store.backend_name(),
        table
    );
    Ok(stats)
}
