//! MySQL observation store

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Row, TxOpts, Value};

use super::{ObservationStore, create_table_sql, drop_table_sql, insert_sql, select_sql};
use crate::config::MysqlConfig;
use crate::error::StoreError;
use crate::models::RecordSet;
use crate::query::DateRange;
use crate::secrets::Credentials;

const QUOTE: char = '`';

/// Observation store on a MySQL server
pub struct MysqlStore {
    conn: Conn,
}

impl MysqlStore {
    /// Connect with the given account
    pub fn connect(config: &MysqlConfig, credentials: &Credentials) -> Result<Self, StoreError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .db_name(Some(config.db.clone()))
            .user(Some(credentials.username.clone()))
            .pass(Some(credentials.password.clone()));

        let conn = Conn::new(opts).map_err(|e| {
            StoreError::Connection(format!("{}:{}/{}: {e}", config.host, config.port, config.db))
        })?;
        tracing::debug!("Connected to mysql {}:{}", config.host, config.port);

        Ok(Self { conn })
    }
}

impl ObservationStore for MysqlStore {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    // DDL commits implicitly in MySQL, so only the inserts share a transaction.
    fn replace_table(&mut self, table: &str, records: &RecordSet) -> Result<(), StoreError> {
        let create = create_table_sql(table, records, QUOTE)?;
        let insert = insert_sql(table, records, QUOTE);

        self.conn.query_drop(drop_table_sql(table, QUOTE))?;
        self.conn.query_drop(create)?;

        let mut tx = self.conn.start_transaction(TxOpts::default())?;
        tx.exec_batch(insert.as_str(), records.rows().iter().map(|row| text_params(row)))?;
        tx.commit()?;

        tracing::debug!("Replaced mysql table '{}' with {} rows", table, records.len());
        Ok(())
    }

    fn query(&mut self, table: &str, range: &DateRange) -> Result<RecordSet, StoreError> {
        let (sql, params) = select_sql(table, range, QUOTE);
        let rows: Vec<Row> = self.conn.exec(sql.as_str(), text_params(&params))?;

        let Some(first) = rows.first() else {
            return Ok(RecordSet::default());
        };
        let columns: Vec<String> = first
            .columns_ref()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();
        let mut records = RecordSet::new(columns);

        for row in &rows {
            let values = (0..row.len())
                .map(|i| row.as_ref(i).map(value_to_text).unwrap_or_default())
                .collect();
            records.push_row(values);
        }

        Ok(records)
    }
}

fn text_params(values: &[String]) -> Params {
    Params::Positional(
        values
            .iter()
            .map(|v| Value::Bytes(v.as_bytes().to_vec()))
            .collect(),
    )
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => {
            format!("{year:04}-{month:02}-{day:02}")
        }
        Value::Date(year, month, day, hour, minute, second, _) => {
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
        }
        Value::Time(negative, days, hours, minutes, seconds, _) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}
