//! eBird "record format" pivot CSV
//!
//! The document has no header. Each row is one attribute or species, each
//! column from the third on is one visit:
//!
//! ```text
//! ,,Brussels,Dune
//! Latitude,,50.8466,51.1
//! ...
//! Robin,,3,
//! ```

use crate::error::ExportError;
use crate::models::observation::TIME_FORMAT;
use crate::models::{Visit, VisitReport};

/// Labels of the metadata rows, in output order
pub const METADATA_LABELS: [&str; 14] = [
    "Location",
    "Latitude",
    "Longitude",
    "Date",
    "Start Time",
    "State",
    "Country",
    "Protocol",
    "Num Observers",
    "Duration (min)",
    "All Obs Reported (Y/N)",
    "Dist Traveled (Miles)",
    "Area Covered (Acres)",
    "Notes",
];

/// eBird date format
pub const EBIRD_DATE_FORMAT: &str = "%m/%d/%Y";

/// Render the whole pivot document
pub fn render_pivot(report: &VisitReport) -> Result<Vec<u8>, ExportError> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for (row, label) in METADATA_LABELS.iter().enumerate() {
        let mut record = Vec::with_capacity(report.visits.len() + 2);
        // the location row carries no label
        record.push(if row == 0 { String::new() } else { label.to_string() });
        record.push(String::new());
        for visit in &report.visits {
            record.push(metadata_value(visit, row));
        }
        writer.write_record(&record)?;
    }

    for species in &report.species {
        let mut record = Vec::with_capacity(report.visits.len() + 2);
        record.push(species.clone());
        record.push(String::new());
        for tally in &report.tallies {
            record.push(tally.count(species).unwrap_or_default().to_string());
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

fn metadata_value(visit: &Visit, row: usize) -> String {
    match row {
        0 => visit.location.clone(),
        1 => visit.latitude.clone(),
        2 => visit.longitude.clone(),
        3 => visit.date.format(EBIRD_DATE_FORMAT).to_string(),
        4 => visit.start_time.format(TIME_FORMAT).to_string(),
        5 => visit.region.state.clone(),
        6 => visit.region.country.clone(),
        7 => visit.protocol.to_string(),
        8 => visit.observer_count.to_string(),
        9 => visit.duration_minutes.to_string(),
        10 => (if visit.all_reported { "Y" } else { "N" }).to_string(),
        11 => visit.distance_miles.to_string(),
        12 => visit.area_covered.clone(),
        _ => visit.notes.clone(),
    }
}
