//! obs2ebird - observation.org to eBird checklist converter
//!
//! Imports observation.org CSV exports into a SQLite or MySQL snapshot and
//! exports a date range of it as an eBird "record format" pivot CSV:
//! - `import`: CSV discovery and snapshot replacement
//! - `query`: date-range selection
//! - `aggregate`: grouping into visits, duration, distance and species tallies
//! - `geocode`: reverse geocoding of each visit
//! - `export`: pivot rendering and file output
//! - `pipeline`: the `Obs2Ebird` façade used by front-ends

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod geocode;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod secrets;
pub mod storage;

pub use aggregate::{CountPolicy, aggregate_visits};
pub use config::{AppConfig, DatabaseConfig, Dialect};
pub use error::{
    ConfigError, CredentialError, ExportError, GeocodeError, ImportError, PipelineError,
    StoreError,
};
pub use export::{ExportStats, export_to_ebird};
pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use import::{ImportStats, import_observations};
pub use models::{Observation, RecordSet, Region, Visit, VisitReport};
pub use pipeline::Obs2Ebird;
pub use query::{DateRange, query_observations};
pub use secrets::{CredentialProvider, Credentials, StaticCredentials, VaultCredentialProvider};
pub use storage::{ObservationStore, SqliteStore, open_store};
