//! Typed sighting rows

use chrono::{NaiveDate, NaiveTime};

use super::record_set::RecordSet;
use crate::error::ExportError;

/// Columns every observation.org export carries
pub const IMPORT_COLUMNS: [&str; 9] = [
    "id",
    "date",
    "time",
    "lat",
    "lng",
    "location",
    "species name",
    "scientific name",
    "number",
];

/// ISO date format of the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of the `time` column
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// One sighting
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub lat: f64,
    pub lng: f64,
    /// Latitude as stored, reproduced verbatim in the report
    pub lat_text: String,
    /// Longitude as stored, reproduced verbatim in the report
    pub lng_text: String,
    pub location: String,
    pub species: String,
    /// Observed count as stored; may be blank
    pub number: String,
}

impl Observation {
    /// Parse every row of a query result
    pub fn from_records(records: &RecordSet) -> Result<Vec<Observation>, ExportError> {
        let column = |name: &str| {
            records.column_index(name).ok_or_else(|| {
                ExportError::MalformedInput(format!("missing column '{name}'"))
            })
        };
        let date = column("date")?;
        let time = column("time")?;
        let lat = column("lat")?;
        let lng = column("lng")?;
        let location = column("location")?;
        let species = column("species name")?;
        let number = column("number")?;
        let id = records.column_index("id");

        records
            .rows()
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let lat_text = row[lat].trim().to_string();
                let lng_text = row[lng].trim().to_string();
                Ok(Observation {
                    id: id.map(|i| row[i].clone()).unwrap_or_default(),
                    date: parse_date(&row[date])
                        .map_err(|e| ExportError::MalformedInput(format!("row {index}: {e}")))?,
                    time: parse_time(&row[time])
                        .map_err(|e| ExportError::MalformedInput(format!("row {index}: {e}")))?,
                    lat: parse_degrees(&lat_text, "lat")
                        .map_err(|e| ExportError::MalformedInput(format!("row {index}: {e}")))?,
                    lng: parse_degrees(&lng_text, "lng")
                        .map_err(|e| ExportError::MalformedInput(format!("row {index}: {e}")))?,
                    lat_text,
                    lng_text,
                    location: row[location].clone(),
                    species: row[species].clone(),
                    number: row[number].trim().to_string(),
                })
            })
            .collect()
    }

    /// Location up to its first `-`, identifying the visit site
    pub fn normalized_location(&self) -> &str {
        normalize_location(&self.location)
    }
}

/// Truncate a location at its first `-`
pub fn normalize_location(location: &str) -> &str {
    location.split('-').next().unwrap_or(location)
}

/// Parse a `yyyy-mm-dd` date
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {e}", text))
}

/// Parse a `HH:MM:SS` time
pub fn parse_time(text: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text.trim(), TIME_FORMAT)
        .map_err(|e| format!("invalid time '{}': {e}", text))
}

fn parse_degrees(text: &str, field: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid {field} '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[[&str; 9]]) -> RecordSet {
        let mut set = RecordSet::new(IMPORT_COLUMNS);
        for r in rows {
            set.push_row(r.iter().map(|v| v.to_string()).collect());
        }
        set
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("Brussels-Park"), "Brussels");
        assert_eq!(normalize_location("Brussels-Park-North"), "Brussels");
        assert_eq!(normalize_location("Brussels"), "Brussels");
        assert_eq!(normalize_location("-Park"), "");
    }

    #[test]
    fn test_from_records_parses_fields() {
        let set = records(&[[
            "42",
            "2024-05-01",
            "08:10:00",
            "50.8466",
            " 4.3528",
            "Brussels-Park",
            "Robin",
            "Erithacus rubecula",
            " 3 ",
        ]]);
        let observations = Observation::from_records(&set).unwrap();
        let obs = &observations[0];

        assert_eq!(obs.id, "42");
        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(obs.time, NaiveTime::from_hms_opt(8, 10, 0).unwrap());
        assert_eq!(obs.lng_text, "4.3528");
        assert!((obs.lat - 50.8466).abs() < 1e-9);
        assert_eq!(obs.number, "3");
        assert_eq!(obs.normalized_location(), "Brussels");
    }

    #[test]
    fn test_from_records_rejects_bad_time() {
        let set = records(&[[
            "1", "2024-05-01", "8h10", "50.0", "4.0", "Here", "Robin", "", "1",
        ]]);
        let result = Observation::from_records(&set);
        assert!(matches!(result, Err(ExportError::MalformedInput(_))));
    }

    #[test]
    fn test_from_records_rejects_bad_coordinate() {
        let set = records(&[[
            "1", "2024-05-01", "08:00:00", "", "4.0", "Here", "Robin", "", "1",
        ]]);
        assert!(Observation::from_records(&set).is_err());
    }

    #[test]
    fn test_from_records_requires_columns() {
        let set = RecordSet::new(["date", "time"]);
        let result = Observation::from_records(&set);
        assert!(matches!(result, Err(ExportError::MalformedInput(msg)) if msg.contains("lat")));
    }
}
