//! eBird checklist export
//!
//! Query a date range, group the rows into visits, geocode each visit and
//! write the pivot document. The output file is written in one call once
//! the whole document is rendered; nothing is written on failure.

pub mod pivot;

pub use pivot::{METADATA_LABELS, render_pivot};

use std::fs;
use std::path::Path;

use crate::aggregate::{CountPolicy, aggregate_visits};
use crate::error::ExportError;
use crate::geocode::ReverseGeocoder;
use crate::models::Observation;
use crate::query::{DateRange, query_observations};
use crate::storage::ObservationStore;

/// Statistics from an export operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Number of visits (report columns)
    pub visits: usize,
    /// Number of distinct species (report rows after the metadata)
    pub species: usize,
    /// Number of observations in the range
    pub observations: usize,
}

/// Export the observations of `range` to an eBird pivot CSV at `output`
pub fn export_to_ebird(
    store: &mut dyn ObservationStore,
    table: &str,
    geocoder: &dyn ReverseGeocoder,
    output: &Path,
    range: &DateRange,
    policy: CountPolicy,
) -> Result<ExportStats, ExportError> {
    let records = query_observations(store, table, range)?;
    if records.is_empty() {
        return Err(ExportError::EmptyResult {
            start: range.start_text(),
            end: range.end_text().unwrap_or_else(|| "open end".to_string()),
        });
    }

    let observations = Observation::from_records(&records)?;
    let report = aggregate_visits(&observations, geocoder, policy)?;
    let document = render_pivot(&report)?;
    fs::write(output, document)?;

    let stats = ExportStats {
        visits: report.visits.len(),
        species: report.species.len(),
        observations: observations.len(),
    };
    tracing::info!(
        "Exported {} visit(s) with {} species to {}",
        stats.visits,
        stats.species,
        output.display()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodeError;
    use crate::models::{IMPORT_COLUMNS, RecordSet, Region};
    use crate::storage::SqliteStore;
    use tempfile::TempDir;

    struct Brussels;

    impl ReverseGeocoder for Brussels {
        fn reverse(&self, _lat: f64, _lng: f64) -> Result<Region, GeocodeError> {
            Ok(Region {
                state: "BRU".to_string(),
                country: "BE".to_string(),
            })
        }
    }

    fn store_with(rows: &[[&str; 9]]) -> SqliteStore {
        let mut records = RecordSet::new(IMPORT_COLUMNS);
        for row in rows {
            records.push_row(row.iter().map(|v| v.to_string()).collect());
        }
        let mut store = SqliteStore::memory().unwrap();
        store.replace_table("observations", &records).unwrap();
        store
    }

    #[test]
    fn test_export_writes_pivot() {
        let mut store = store_with(&[
            ["1", "2024-05-01", "08:00:00", "50.8466", "4.3528", "Park", "Robin", "", "2"],
            ["2", "2024-05-02", "09:00:00", "50.9", "4.4", "Dune", "Wren", "", "1"],
        ]);
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("ebird.csv");

        let range = DateRange::parse("2024-05-01", None).unwrap();
        let stats = export_to_ebird(
            &mut store,
            "observations",
            &Brussels,
            &output,
            &range,
            CountPolicy::Sum,
        )
        .unwrap();

        assert_eq!(
            stats,
            ExportStats {
                visits: 2,
                species: 2,
                observations: 2
            }
        );
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with(",,Park,Dune"));
        assert!(content.contains("Robin,,2,"));
    }

    #[test]
    fn test_empty_range_writes_nothing() {
        let mut store = store_with(&[[
            "1", "2024-05-01", "08:00:00", "50.8", "4.3", "Park", "Robin", "", "2",
        ]]);
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("ebird.csv");

        let range = DateRange::parse("2025-01-01", Some("2025-01-31")).unwrap();
        let result = export_to_ebird(
            &mut store,
            "observations",
            &Brussels,
            &output,
            &range,
            CountPolicy::Sum,
        );

        match result {
            Err(ExportError::EmptyResult { start, end }) => {
                assert_eq!(start, "2025-01-01");
                assert_eq!(end, "2025-01-31");
            }
            other => panic!("expected EmptyResult, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_malformed_row_writes_nothing() {
        let mut store = store_with(&[[
            "1", "2024-05-01", "late", "50.8", "4.3", "Park", "Robin", "", "2",
        ]]);
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("ebird.csv");

        let range = DateRange::parse("2024-05-01", None).unwrap();
        let result = export_to_ebird(
            &mut store,
            "observations",
            &Brussels,
            &output,
            &range,
            CountPolicy::Sum,
        );
        assert!(matches!(result, Err(ExportError::MalformedInput(_))));
        assert!(!output.exists());
    }
}
