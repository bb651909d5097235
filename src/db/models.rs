//! Typed rows returned by the built-in queries

use serde::Serialize;

/// Timestamps of a single transfer. A transfer still queued or running when
/// the simulation ended has no start or finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferTimes {
    pub queued_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileSize {
    pub bytes: i64,
}

/// Lifetime of one replica at a storage element. `removed_at` is the deletion
/// time, falling back to the expiry time; `None` means it outlived the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaLifetime {
    pub storage_element: String,
    pub created_at: i64,
    pub removed_at: Option<i64>,
}

/// Bytes moved into a destination storage element by a finished transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferTraffic {
    pub storage_element: String,
    pub finished_at: i64,
    pub traffic: f64,
}
