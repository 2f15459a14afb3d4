// MySQL store
// Runs assembled statements as prepared statements with positional parameters

use super::RelationalStore;
use crate::config::MySqlConfig;
use crate::error::{QueryError, Result};
use crate::query::SqlStatement;
use crate::row::{Row, RowSet, Value};
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params};
use std::time::Duration;

pub struct MySqlStore {
    conn: Conn,
}

impl MySqlStore {
    /// Open a single connection. Any driver error is reported as a connection error.
    pub fn open(config: &MySqlConfig, timeout: Duration) -> Result<Self> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.as_str()))
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            .db_name(Some(config.db.as_str()))
            .tcp_connect_timeout(Some(timeout));

        let conn = Conn::new(opts).map_err(|e| QueryError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl RelationalStore for MySqlStore {
    fn query(&mut self, statement: &SqlStatement) -> Result<RowSet> {
        let params = if statement.params().is_empty() {
            Params::Empty
        } else {
            Params::Positional(
                statement
                    .params()
                    .iter()
                    .map(|p| mysql::Value::from(p.as_str()))
                    .collect(),
            )
        };

        let rows: Vec<mysql::Row> = self
            .conn
            .exec(statement.sql(), params)
            .map_err(|e| QueryError::BackendExecution(e.to_string()))?;

        let column_names = rows
            .first()
            .map(|row| {
                row.columns_ref()
                    .iter()
                    .map(|c| c.name_str().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows
            .iter()
            .map(|row| {
                Row::new(
                    (0..row.len())
                        .map(|i| row.as_ref(i).map(Value::from).unwrap_or(Value::Null))
                        .collect(),
                )
            })
            .collect();

        Ok(RowSet::new(column_names, rows))
    }
}

impl From<&mysql::Value> for Value {
    fn from(value: &mysql::Value) -> Self {
        use mysql::Value as My;

        match value {
            My::NULL => Value::Null,
            My::Bytes(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            My::Int(i) => Value::Integer(*i),
            My::UInt(u) => i64::try_from(*u)
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(u.to_string())),
            My::Float(f) => Value::Float(f64::from(*f)),
            My::Double(d) => Value::Float(*d),
            My::Date(year, month, day, hour, minute, second, micros) => {
                let mut text = format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                );
                if *micros > 0 {
                    text.push_str(&format!(".{:06}", micros));
                }
                Value::Text(text)
            }
            My::Time(negative, days, hours, minutes, seconds, micros) => {
                let hours = u32::from(*hours) + days * 24;
                let mut text = format!(
                    "{}{:02}:{:02}:{:02}",
                    if *negative { "-" } else { "" },
                    hours,
                    minutes,
                    seconds
                );
                if *micros > 0 {
                    text.push_str(&format!(".{:06}", micros));
                }
                Value::Text(text)
            }
        }
    }
}
