//! Read-only access to a simulation output database
//!
//! A `SimDatabase` owns its connection for the whole run. Dropping it closes
//! the connection on every exit path; `close` reports close errors explicitly.

pub mod models;

use std::path::Path;
use std::str::FromStr;

use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Row, ToSql};

use crate::config::DatabaseConfig;
use crate::error::{config_error, Result};
use crate::sql::{BuiltinQuery, QueryCatalog, SqlQuery};
pub use models::{FileSize, ReplicaLifetime, TransferTimes, TransferTraffic};

/// A named query parameter given as `name=value` on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    /// Placeholder name including its `:` prefix
    pub name: String,
    pub value: Value,
}

impl FromStr for QueryParam {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
        let name = name.trim().trim_start_matches(':');
        if name.is_empty() {
            return Err(format!("missing parameter name in '{}'", s));
        }

        let raw = raw.trim();
        let value = if let Ok(int) = raw.parse::<i64>() {
            Value::Integer(int)
        } else if let Ok(real) = raw.parse::<f64>() {
            Value::Real(real)
        } else {
            Value::Text(raw.to_string())
        };

        Ok(QueryParam {
            name: format!(":{}", name),
            value,
        })
    }
}

pub struct SimDatabase {
    conn: Connection,
    source: String,
}

impl std::fmt::Debug for SimDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimDatabase")
            .field("source", &self.source)
            .finish()
    }
}

impl SimDatabase {
    /// Open the database named by `config` read-only
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let source = config.connection_str.trim();
        if !source.starts_with("file:") && !Path::new(source).is_file() {
            return Err(config_error(
                format!("Database file does not exist: {}", source),
                Some("connectionStr"),
            ));
        }

        let conn = Connection::open_with_flags(
            source,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!("Connected to {}", source);

        Ok(Self {
            conn,
            source: source.to_string(),
        })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection, source: impl Into<String>) -> Self {
        Self {
            conn,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn transfer_times(&self, catalog: &QueryCatalog) -> Result<Vec<TransferTimes>> {
        let query = catalog.get(BuiltinQuery::TransferTimes)?;
        self.fetch(&query, |row| {
            Ok(TransferTimes {
                queued_at: row.get(0)?,
                started_at: row.get(1)?,
                finished_at: row.get(2)?,
            })
        })
    }

    pub fn file_sizes(&self, catalog: &QueryCatalog) -> Result<Vec<FileSize>> {
        let query = catalog.get(BuiltinQuery::FileSizes)?;
        self.fetch(&query, |row| Ok(FileSize { bytes: row.get(0)? }))
    }

    pub fn replica_lifetimes(&self, catalog: &QueryCatalog) -> Result<Vec<ReplicaLifetime>> {
        let query = catalog.get(BuiltinQuery::ReplicaLifetimes)?;
        self.fetch(&query, |row| {
            Ok(ReplicaLifetime {
                storage_element: row.get(0)?,
                created_at: row.get(1)?,
                removed_at: row.get(2)?,
            })
        })
    }

    pub fn transfer_traffic(&self, catalog: &QueryCatalog) -> Result<Vec<TransferTraffic>> {
        let query = catalog.get(BuiltinQuery::TransferTraffic)?;
        self.fetch(&query, |row| {
            let traffic: Option<f64> = row.get(2)?;
            Ok(TransferTraffic {
                storage_element: row.get(0)?,
                finished_at: row.get(1)?,
                traffic: traffic.unwrap_or(0.0),
            })
        })
    }

    /// Run a user query and return its first column as numbers. NULLs are
    /// skipped. Every placeholder must be bound and every parameter used.
    pub fn query_values(&self, query: &SqlQuery, params: &[QueryParam]) -> Result<Vec<f64>> {
        for placeholder in &query.placeholders {
            if !params.iter().any(|p| &p.name == placeholder) {
                return Err(config_error(
                    format!("No value given for query parameter {}", placeholder),
                    Some("param"),
                ));
            }
        }
        for param in params {
            if !query.placeholders.contains(&param.name) {
                return Err(config_error(
                    format!("Query has no parameter {}", param.name),
                    Some("param"),
                ));
            }
        }

        let bound: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|p| (p.name.as_str(), &p.value as &dyn ToSql))
            .collect();

        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt.query_map(bound.as_slice(), |row| row.get::<_, Option<f64>>(0))?;
        let values = rows.collect::<rusqlite::Result<Vec<Option<f64>>>>()?;

        let total = values.len();
        let values: Vec<f64> = values.into_iter().flatten().collect();
        if values.len() < total {
            warn!("Skipped {} NULL values", total - values.len());
        }
        Ok(values)
    }

    /// Close the connection, reporting any error from SQLite
    pub fn close(self) -> Result<()> {
        debug!("Closing {}", self.source);
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn fetch<T, F>(&self, query: &SqlQuery, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt.query_map([], map)?;
        let values = rows.collect::<rusqlite::Result<Vec<T>>>()?;
        debug!("Fetched {} rows", values.len());
        Ok(values)
    }
}
