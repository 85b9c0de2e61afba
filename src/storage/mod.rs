//! Observation store abstraction
//!
//! Defines the `ObservationStore` trait and its two backends:
//! - `SqliteStore`: embedded single-file database (default)
//! - `MysqlStore`: networked MySQL server (feature `mysql-backend`)
//!
//! The backend is chosen once by `open_store`; callers never branch on the
//! dialect. Identifier quoting and parameter binding stay inside this module.

use crate::config::{DatabaseConfig, Dialect};
use crate::error::StoreError;
use crate::models::RecordSet;
use crate::query::DateRange;
use crate::secrets::CredentialProvider;

/// Trait for observation store backends
pub trait ObservationStore {
    /// Short backend name for log lines
    fn backend_name(&self) -> &'static str;

    /// Replace the whole content of `table` with `records`
    ///
    /// Any previous table of that name is dropped first.
    fn replace_table(&mut self, table: &str, records: &RecordSet) -> Result<(), StoreError>;

    /// Rows of `table` whose `date` falls in `range`
    fn query(&mut self, table: &str, range: &DateRange) -> Result<RecordSet, StoreError>;
}

pub mod sqlite;
pub use sqlite::SqliteStore;

#[cfg(feature = "mysql-backend")]
pub mod mysql;
#[cfg(feature = "mysql-backend")]
pub use self::mysql::MysqlStore;

/// Open the store selected by the configuration
///
/// Credentials are requested only for the networked backend.
pub fn open_store(
    config: &DatabaseConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Box<dyn ObservationStore>, StoreError> {
    match config.dialect {
        Dialect::Sqlite => Ok(Box::new(SqliteStore::open(&config.sqlite.db)?)),
        Dialect::Mysql => open_mysql(config, credentials),
    }
}

#[cfg(feature = "mysql-backend")]
fn open_mysql(
    config: &DatabaseConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Box<dyn ObservationStore>, StoreError> {
    let account = credentials
        .credentials(&config.mysql.secret_key)
        .map_err(|e| StoreError::Connection(format!("cannot obtain credentials: {e}")))?;
    Ok(Box::new(MysqlStore::connect(&config.mysql, &account)?))
}

#[cfg(not(feature = "mysql-backend"))]
fn open_mysql(
    _config: &DatabaseConfig,
    _credentials: &dyn CredentialProvider,
) -> Result<Box<dyn ObservationStore>, StoreError> {
    Err(StoreError::InvalidConfig(
        "MySQL support not enabled. Build with --features mysql-backend".to_string(),
    ))
}

/// Quote an identifier, doubling any embedded quote character
pub(crate) fn quote_ident(ident: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!("{quote}{}{quote}", ident.replace(quote, &doubled))
}

pub(crate) fn drop_table_sql(table: &str, quote: char) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table, quote))
}

pub(crate) fn create_table_sql(
    table: &str,
    records: &RecordSet,
    quote: char,
) -> Result<String, StoreError> {
    if records.columns().is_empty() {
        return Err(StoreError::Query(format!(
            "cannot create table '{table}' without columns"
        )));
    }
    let columns: Vec<String> = records
        .columns()
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c, quote)))
        .collect();
    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_ident(table, quote),
        columns.join(", ")
    ))
}

pub(crate) fn insert_sql(table: &str, records: &RecordSet, quote: char) -> String {
    let columns: Vec<String> = records
        .columns()
        .iter()
        .map(|c| quote_ident(c, quote))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table, quote),
        columns.join(", "),
        placeholders
    )
}

/// Select statement and bound parameters for a date range
///
/// No end date selects everything from the start date onward; an end date
/// selects the inclusive interval.
pub(crate) fn select_sql(table: &str, range: &DateRange, quote: char) -> (String, Vec<String>) {
    let table = quote_ident(table, quote);
    let date = quote_ident("date", quote);
    match range.end_text() {
        None => (
            format!("SELECT * FROM {table} WHERE {date} >= ?"),
            vec![range.start_text()],
        ),
        Some(end) => (
            format!("SELECT * FROM {table} WHERE {date} BETWEEN ? AND ?"),
            vec![range.start_text(), end],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_per_dialect() {
        assert_eq!(quote_ident("species name", '"'), "\"species name\"");
        assert_eq!(quote_ident("species name", '`'), "`species name`");
        assert_eq!(quote_ident("odd\"name", '"'), "\"odd\"\"name\"");
        assert_eq!(quote_ident("odd`name", '`'), "`odd``name`");
    }

    #[test]
    fn test_create_and_insert_sql() {
        let records = RecordSet::new(["id", "species name"]);
        assert_eq!(
            create_table_sql("observations", &records, '`').unwrap(),
            "CREATE TABLE `observations` (`id` TEXT, `species name` TEXT)"
        );
        assert_eq!(
            insert_sql("observations", &records, '"'),
            "INSERT INTO \"observations\" (\"id\", \"species name\") VALUES (?, ?)"
        );
        assert!(create_table_sql("observations", &RecordSet::default(), '"').is_err());
    }

    #[test]
    fn test_select_sql_open_ended_and_bounded() {
        let open = DateRange::parse("2024-05-01", None).unwrap();
        let (sql, params) = select_sql("obs", &open, '"');
        assert_eq!(sql, "SELECT * FROM \"obs\" WHERE \"date\" >= ?");
        assert_eq!(params, vec!["2024-05-01".to_string()]);

        let bounded = DateRange::parse("2024-05-01", Some("2024-05-31")).unwrap();
        let (sql, params) = select_sql("obs", &bounded, '`');
        assert_eq!(sql, "SELECT * FROM `obs` WHERE `date` BETWEEN ? AND ?");
        assert_eq!(params, vec!["2024-05-01".to_string(), "2024-05-31".to_string()]);
    }
}
