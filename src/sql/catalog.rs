//! Built-in queries against the simulator output schema

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{config_error, Result};
use crate::sql::query::SqlQuery;

/// Queries the plot subcommands run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinQuery {
    TransferTimes,
    FileSizes,
    ReplicaLifetimes,
    TransferTraffic,
}

impl BuiltinQuery {
    pub fn file_name(self) -> &'static str {
        match self {
            BuiltinQuery::TransferTimes => "transfer_times.sql",
            BuiltinQuery::FileSizes => "file_sizes.sql",
            BuiltinQuery::ReplicaLifetimes => "replica_lifetimes.sql",
            BuiltinQuery::TransferTraffic => "transfer_traffic.sql",
        }
    }

    fn builtin_sql(self) -> &'static str {
        match self {
            BuiltinQuery::TransferTimes => include_str!("../../queries/transfer_times.sql"),
            BuiltinQuery::FileSizes => include_str!("../../queries/file_sizes.sql"),
            BuiltinQuery::ReplicaLifetimes => include_str!("../../queries/replica_lifetimes.sql"),
            BuiltinQuery::TransferTraffic => include_str!("../../queries/transfer_traffic.sql"),
        }
    }
}

/// Resolves built-in queries, optionally overridden by `.sql` files on disk
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    dir: Option<PathBuf>,
}

impl QueryCatalog {
    /// Catalog serving the compiled-in queries
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// Catalog reading every query from `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(config_error(
                format!("Query directory does not exist: {}", dir.display()),
                Some("queries_dir"),
            ));
        }
        Ok(Self {
            dir: Some(dir.to_path_buf()),
        })
    }

    /// The validated query text. A configured directory missing the file is
    /// an error rather than a silent fallback.
    pub fn get(&self, query: BuiltinQuery) -> Result<SqlQuery> {
        match &self.dir {
            Some(dir) => {
                let path = dir.join(query.file_name());
                debug!("Loading query from {}", path.display());
                SqlQuery::from_file(&path)
            }
            None => SqlQuery::from_sql(query.builtin_sql()),
        }
    }
}
