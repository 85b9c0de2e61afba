//! Date-range selection of the observation snapshot

use std::fmt;

use chrono::NaiveDate;

use crate::error::{ExportError, StoreError};
use crate::models::RecordSet;
use crate::models::observation::{DATE_FORMAT, parse_date};
use crate::storage::ObservationStore;

/// Inclusive date range; no end date means "from start onward"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Build a range from `yyyy-mm-dd` text; a blank end counts as absent
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, ExportError> {
        let start = parse_date(start).map_err(ExportError::MalformedInput)?;
        let end = match end.map(str::trim).filter(|e| !e.is_empty()) {
            Some(text) => Some(parse_date(text).map_err(ExportError::MalformedInput)?),
            None => None,
        };
        Ok(Self { start, end })
    }

    pub(crate) fn start_text(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub(crate) fn end_text(&self) -> Option<String> {
        self.end.map(|end| end.format(DATE_FORMAT).to_string())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end_text() {
            Some(end) => write!(f, "{} to {}", self.start_text(), end),
            None => write!(f, "{} onward", self.start_text()),
        }
    }
}

/// Read the observations of a date range from the store
///
/// An empty result is returned as an empty record set; deciding whether that
/// is an error belongs to the caller.
pub fn query_observations(
    store: &mut dyn ObservationStore,
    table: &str,
    range: &DateRange,
) -> Result<RecordSet, StoreError> {
    let records = store.query(table, range)?;
    tracing::info!(
        "Queried {} observation(s) for {} from {} table '{}'",
        records.len(),
        range,
        store.backend_name(),
        table
    );
    Ok(records)
}
