//! Error types for the import/export pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or saving the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing or serialization error
    #[error("YAML error in {path}: {reason}")]
    Yaml { path: PathBuf, reason: String },

    /// No home directory to derive the default config path from
    #[error("HOME is not set; cannot locate the configuration directory")]
    NoHomeDirectory,

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while fetching database credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The local secrets file could not be read or lacks a key
    #[error("Secrets file {path}: {reason}")]
    SecretsFile { path: PathBuf, reason: String },

    /// The secret store could not be reached
    #[error("Secret request failed: {0}")]
    Request(String),

    /// The secret store answered with an unexpected payload
    #[error("Malformed secret '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

/// Errors raised by the observation store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store unreachable (open, authentication, network)
    #[error("Cannot connect to database: {0}")]
    Connection(String),

    /// Statement failed on a reachable store
    #[error("Query error: {0}")]
    Query(String),

    /// Backend configuration cannot be used
    #[error("Invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by the reverse geocoder
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// Transport failure
    #[error("Geocoding request failed for ({lat}, {lng}): {reason}")]
    Request { lat: f64, lng: f64, reason: String },

    /// Non-success HTTP status
    #[error("Geocoding service answered HTTP {status} for ({lat}, {lng})")]
    Status { lat: f64, lng: f64, status: u16 },

    /// The response lacks the region or country fields
    #[error("Unparseable address for ({lat}, {lng}): {reason}")]
    UnparseableAddress { lat: f64, lng: f64, reason: String },
}

/// Errors raised while importing observation files
#[derive(Error, Debug)]
pub enum ImportError {
    /// Pattern matching error
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// File could not be read or is not valid CSV
    #[error("Cannot read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// Store error wrapper
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while exporting an eBird checklist file
#[derive(Error, Debug)]
pub enum ExportError {
    /// The store was reachable but the range matched no observation
    #[error("Nothing to export between {start} and {end}")]
    EmptyResult { start: String, end: String },

    /// A date, time, coordinate or count field failed to parse
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Store error wrapper
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Geocoder error wrapper
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Error surfaced by the pipeline façade
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl StoreError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Connection(msg) => {
                format!("Cannot connect to database: {msg}\n\nHint: Check if the database is running.")
            }
            StoreError::InvalidConfig(msg) => {
                format!(
                    "Invalid database configuration: {msg}\n\nHint: Check ~/.config/o2eb.yml."
                )
            }
            _ => self.to_string(),
        }
    }
}

impl ImportError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ImportError::InvalidPattern(pattern) => {
                format!(
                    "Invalid file pattern: {pattern}\n\n\
                    Hint: Use comma-separated paths or glob syntax like 'obs_*.csv'."
                )
            }
            ImportError::Read { path, reason } => {
                format!(
                    "Cannot read {}\nReason: {reason}\n\nHint: Ensure the file is an observation.org CSV export.",
                    path.display()
                )
            }
            ImportError::Store(err) => err.user_message(),
        }
    }
}

impl ExportError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ExportError::EmptyResult { start, end } => {
                format!(
                    "Nothing to export between {start} and {end}.\n\n\
                    Hint: Check the date range and that observations were imported."
                )
            }
            ExportError::Store(err) => err.user_message(),
            ExportError::Geocode(err) => {
                format!("{err}\n\nHint: The geocoding service may be unreachable; retry later.")
            }
            _ => self.to_string(),
        }
    }
}

impl PipelineError {
    /// Get a user-friendly error message for CLI or GUI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Config(err) => err.to_string(),
            PipelineError::Import(err) => err.user_message(),
            PipelineError::Export(err) => err.user_message(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

#[cfg(feature = "mysql-backend")]
impl From<mysql::Error> for StoreError {
    fn from(err: mysql::Error) -> Self {
        match err {
            mysql::Error::IoError(_) | mysql::Error::DriverError(_) => {
                StoreError::Connection(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}
