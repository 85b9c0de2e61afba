//! Front-end façade over import and export
//!
//! Holds the configuration and the external collaborators explicitly. Each
//! call opens its own store connection and closes it on return.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{ExportError, ImportError, PipelineError};
use crate::export::{self, ExportStats};
use crate::geocode::{NominatimGeocoder, ReverseGeocoder};
use crate::import::{self, ImportStats};
use crate::query::DateRange;
use crate::secrets::{CredentialProvider, VaultCredentialProvider};
use crate::storage::{ObservationStore, open_store};

/// observation.org to eBird converter
pub struct Obs2Ebird {
    config: AppConfig,
    credentials: Box<dyn CredentialProvider>,
    geocoder: Box<dyn ReverseGeocoder>,
}

impl Obs2Ebird {
    /// Wire the Vault credential provider and the Nominatim geocoder
    pub fn from_config(config: AppConfig) -> Self {
        let credentials = VaultCredentialProvider::new(&config.vault);
        let geocoder = NominatimGeocoder::from_config(&config.geocoder);
        Self::new(config, Box::new(credentials), Box::new(geocoder))
    }

    pub fn new(
        config: AppConfig,
        credentials: Box<dyn CredentialProvider>,
        geocoder: Box<dyn ReverseGeocoder>,
    ) -> Self {
        Self {
            config,
            credentials,
            geocoder,
        }
    }

    /// Replace the stored snapshot with the files matching `patterns`
    ///
    /// `patterns` is a comma-separated list of paths or glob patterns; bare
    /// file names are looked up in `base_dir`.
    pub fn import_obs(
        &self,
        patterns: &str,
        base_dir: &Path,
    ) -> Result<ImportStats, PipelineError> {
        let table = self.config.database().table_name()?;
        let mut store = self.open().map_err(ImportError::from)?;
        Ok(import::import_observations(
            store.as_mut(),
            &table,
            patterns,
            base_dir,
        )?)
    }

    /// Write the eBird pivot CSV for `start_date` to `end_date` (inclusive)
    ///
    /// Dates are `yyyy-mm-dd`; without an end date everything from the start
    /// date onward is exported.
    pub fn export_to_ebird(
        &self,
        output: &Path,
        start_date: &str,
        end_date: Option<&str>,
    ) -> Result<ExportStats, PipelineError> {
        let range = DateRange::parse(start_date, end_date)?;
        let table = self.config.database().table_name()?;
        let mut store = self.open().map_err(ExportError::from)?;
        Ok(export::export_to_ebird(
            store.as_mut(),
            &table,
            self.geocoder.as_ref(),
            output,
            &range,
            self.config.export.count_policy,
        )?)
    }

    fn open(&self) -> Result<Box<dyn ObservationStore>, crate::error::StoreError> {
        let database = self.config.database();
        tracing::debug!("Opening {} store", database.dialect);
        open_store(&database, self.credentials.as_ref())
    }
}
