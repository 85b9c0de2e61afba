//! Models module
//!
//! Tabular rows as they move through the store, typed sightings parsed from
//! them, and the visit-level report derived for export.

pub mod observation;
pub mod record_set;
pub mod visit;

pub use observation::{IMPORT_COLUMNS, Observation, normalize_location};
pub use record_set::RecordSet;
pub use visit::{Protocol, Region, SpeciesTally, Visit, VisitReport};
