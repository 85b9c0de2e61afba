//! Visits: one checklist per date and site

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Observation protocol of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Stationary,
    Traveling,
}

impl Protocol {
    /// `Traveling` for any positive distance, `Stationary` otherwise
    pub fn from_distance(miles: f64) -> Self {
        if miles > 0.0 {
            Protocol::Traveling
        } else {
            Protocol::Stationary
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Stationary => write!(f, "stationary"),
            Protocol::Traveling => write!(f, "traveling"),
        }
    }
}

/// Administrative region of a coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Subdivision code without the country prefix, e.g. `BRU` for `BE-BRU`
    pub state: String,
    /// Upper-case ISO 3166-1 alpha-2 code
    pub country: String,
}

/// One checklist column of the report
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub date: NaiveDate,
    /// Normalized location
    pub location: String,
    /// Reference row latitude, verbatim
    pub latitude: String,
    /// Reference row longitude, verbatim
    pub longitude: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub distance_miles: f64,
    pub protocol: Protocol,
    pub observer_count: u32,
    pub region: Region,
    pub all_reported: bool,
    pub area_covered: String,
    pub notes: String,
}

/// Species counts of one visit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesTally {
    counts: HashMap<String, String>,
}

impl SpeciesTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell text for a species; `None` when it was not observed
    pub fn count(&self, species: &str) -> Option<&str> {
        self.counts.get(species).map(String::as_str)
    }

    pub fn set(&mut self, species: &str, count: String) {
        self.counts.insert(species.to_string(), count);
    }
}

/// Aggregated visits ready for the pivot writer
///
/// `visits[i]` and `tallies[i]` describe the same column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitReport {
    pub visits: Vec<Visit>,
    pub tallies: Vec<SpeciesTally>,
    /// Distinct species of the whole queried range, first-seen order
    pub species: Vec<String>,
}
