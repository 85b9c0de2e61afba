//! Grouping of observations into visits
//!
//! A visit is every observation sharing a date and a normalized location.
//! Visits are emitted in ascending `(date, location)` order, which is also
//! the column order of the species matrix.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::geocode::ReverseGeocoder;
use crate::models::{Observation, Protocol, SpeciesTally, Visit, VisitReport};

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// How duplicate species rows of one visit fold into one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Add up the numeric counts; blank counts add nothing
    #[default]
    Sum,
    /// Keep the raw count text of the latest row, unparsed
    Last,
}

/// Great-circle distance in miles (haversine)
pub fn great_circle_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().min(1.0).asin()
}

/// Whole minutes between two times plus one, so a single sighting lasts a minute
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    seconds / 60 + 1
}

/// Build the visit report of a set of observations
///
/// The geocoder is called once per visit with the reference (earliest)
/// row's coordinates. Any geocoding failure aborts the whole report.
pub fn aggregate_visits(
    observations: &[Observation],
    geocoder: &dyn ReverseGeocoder,
    policy: CountPolicy,
) -> Result<VisitReport, ExportError> {
    let mut groups: BTreeMap<(NaiveDate, &str), Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.date, obs.normalized_location()))
            .or_default()
            .push(obs);
    }

    let mut report = VisitReport {
        species: distinct_species(observations),
        ..VisitReport::default()
    };

    for ((date, location), mut group) in groups {
        // stable: rows sharing a time keep their query order
        group.sort_by_key(|obs| obs.time);
        let (Some(head), Some(tail)) = (group.first(), group.last()) else {
            continue;
        };

        let distance_miles: f64 = group
            .windows(2)
            .map(|pair| great_circle_miles(pair[0].lat, pair[0].lng, pair[1].lat, pair[1].lng))
            .sum();
        let region = geocoder.reverse(head.lat, head.lng)?;

        let visit = Visit {
            date,
            location: location.to_string(),
            latitude: head.lat_text.clone(),
            longitude: head.lng_text.clone(),
            start_time: head.time,
            end_time: tail.time,
            duration_minutes: duration_minutes(head.time, tail.time),
            distance_miles,
            protocol: Protocol::from_distance(distance_miles),
            observer_count: 1,
            region,
            all_reported: true,
            area_covered: String::new(),
            notes: String::new(),
        };
        tracing::debug!(
            "Visit {} '{}': {} observation(s), {} min, {} mi",
            visit.date,
            visit.location,
            group.len(),
            visit.duration_minutes,
            visit.distance_miles
        );

        report.tallies.push(tally(&group, policy)?);
        report.visits.push(visit);
    }

    Ok(report)
}

fn distinct_species(observations: &[Observation]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut species = Vec::new();
    for obs in observations {
        if seen.insert(obs.species.as_str()) {
            species.push(obs.species.clone());
        }
    }
    species
}

/// Species cells of one visit; `group` is sorted by time
fn tally(group: &[&Observation], policy: CountPolicy) -> Result<SpeciesTally, ExportError> {
    let mut sums: BTreeMap<&str, Option<u64>> = BTreeMap::new();
    let mut tally = SpeciesTally::new();

    for obs in group {
        match policy {
            CountPolicy::Sum => {
                let count = parse_count(obs)?;
                let cell = sums.entry(obs.species.as_str()).or_default();
                if let Some(n) = count {
                    let total = cell.unwrap_or(0).checked_add(n).ok_or_else(|| {
                        ExportError::MalformedInput(format!(
                            "count overflow for {} on {}",
                            obs.species, obs.date
                        ))
                    })?;
                    *cell = Some(total);
                }
            }
            // raw text, no parsing
            CountPolicy::Last => tally.set(&obs.species, obs.number.clone()),
        }
    }

    for (species, sum) in sums {
        tally.set(species, sum.map(|n| n.to_string()).unwrap_or_default());
    }
    Ok(tally)
}

fn parse_count(obs: &Observation) -> Result<Option<u64>, ExportError> {
    if obs.number.is_empty() {
        return Ok(None);
    }
    obs.number.parse::<u64>().map(Some).map_err(|_| {
        ExportError::MalformedInput(format!(
            "invalid count '{}' for {} on {}",
            obs.number, obs.species, obs.date
        ))
    })
}
