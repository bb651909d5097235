//! Error types for simstats

use thiserror::Error;

/// Errors produced while querying, aggregating, rendering or merging
#[derive(Debug, Error)]
pub enum SimStatsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        line_content: Option<String>,
    },

    #[error("no data: {context}")]
    NoData { context: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("pricing error: {message}")]
    Pricing { message: String },

    #[error("render error: {message}")]
    Render { message: String },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimStatsError>;

/// Build a configuration error, optionally naming the offending field
pub fn config_error(message: impl Into<String>, field: Option<&str>) -> SimStatsError {
    SimStatsError::Configuration {
        message: message.into(),
        field: field.map(str::to_string),
    }
}

/// Build a no-data error for the given context
pub fn no_data(context: impl Into<String>) -> SimStatsError {
    SimStatsError::NoData {
        context: context.into(),
    }
}

pub fn invalid_input(message: impl Into<String>) -> SimStatsError {
    SimStatsError::InvalidInput {
        message: message.into(),
    }
}

pub fn render_error(err: impl std::fmt::Display) -> SimStatsError {
    SimStatsError::Render {
        message: err.to_string(),
    }
}
