//! SQLite observation store

use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use super::{ObservationStore, create_table_sql, drop_table_sql, insert_sql, select_sql};
use crate::error::StoreError;
use crate::models::RecordSet;
use crate::query::DateRange;

const QUOTE: char = '"';

/// Observation store backed by a single SQLite file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl ObservationStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn replace_table(&mut self, table: &str, records: &RecordSet) -> Result<(), StoreError> {
        let create = create_table_sql(table, records, QUOTE)?;
        let insert = insert_sql(table, records, QUOTE);

        let tx = self.conn.transaction()?;
        tx.execute_batch(&drop_table_sql(table, QUOTE))?;
        tx.execute_batch(&create)?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in records.rows() {
                stmt.execute(rusqlite::params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        tracing::debug!("Replaced sqlite table '{}' with {} rows", table, records.len());
        Ok(())
    }

    fn query(&mut self, table: &str, range: &DateRange) -> Result<RecordSet, StoreError> {
        let (sql, params) = select_sql(table, range, QUOTE);
        let mut stmt = self.conn.prepare(&sql)?;

        let column_count = stmt.column_count();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut records = RecordSet::new(columns);

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_to_text(row.get_ref(i)?));
            }
            records.push_row(values);
        }

        Ok(records)
    }
}

fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RecordSet {
        let mut records = RecordSet::new(["id", "date", "species name"]);
        for (id, date, species) in [
            ("1", "2024-04-30", "Robin"),
            ("2", "2024-05-01", "Wren"),
            ("3", "2024-05-15", "Blackbird"),
            ("4", "2024-06-01", "Jay"),
        ] {
            records.push_row(vec![id.to_string(), date.to_string(), species.to_string()]);
        }
        records
    }

    #[test]
    fn test_replace_then_query_open_ended() {
        let mut store = SqliteStore::memory().unwrap();
        store.replace_table("observations", &sample()).unwrap();

        let range = DateRange::parse("2024-05-01", None).unwrap();
        let result = store.query("observations", &range).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result.columns()[2], "species name");
        assert_eq!(result.get(0, "species name"), Some("Wren"));
    }

    #[test]
    fn test_query_inclusive_range() {
        let mut store = SqliteStore::memory().unwrap();
        store.replace_table("observations", &sample()).unwrap();

        let range = DateRange::parse("2024-05-01", Some("2024-05-15")).unwrap();
        let result = store.query("observations", &range).unwrap();
        assert_eq!(result.distinct("id"), vec!["2".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_replace_discards_previous_snapshot() {
        let mut store = SqliteStore::memory().unwrap();
        store.replace_table("observations", &sample()).unwrap();

        let mut smaller = RecordSet::new(["date", "note"]);
        smaller.push_row(vec!["2024-05-02".to_string(), "only".to_string()]);
        store.replace_table("observations", &smaller).unwrap();

        let range = DateRange::parse("2000-01-01", None).unwrap();
        let result = store.query("observations", &range).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.columns(), &["date".to_string(), "note".to_string()][..]);
    }

    #[test]
    fn test_query_missing_table_is_query_error() {
        let mut store = SqliteStore::memory().unwrap();
        let range = DateRange::parse("2024-05-01", None).unwrap();
        assert!(matches!(
            store.query("observations", &range),
            Err(StoreError::Query(_))
        ));
    }

    #[test]
    fn test_open_in_missing_directory_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("observations.sqlite");
        assert!(matches!(
            SqliteStore::open(&path),
            Err(StoreError::Connection(_))
        ));
    }

    #[test]
    fn test_reads_numeric_columns_as_text() {
        let mut store = SqliteStore::memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TABLE obs (\"date\" TEXT, lat REAL, number INTEGER, note TEXT);
                 INSERT INTO obs VALUES ('2024-05-01', 50.5, 3, NULL);",
            )
            .unwrap();

        let range = DateRange::parse("2024-05-01", None).unwrap();
        let result = store.query("obs", &range).unwrap();
        assert_eq!(result.get(0, "lat"), Some("50.5"));
        assert_eq!(result.get(0, "number"), Some("3"));
        assert_eq!(result.get(0, "note"), Some(""));
    }
}
