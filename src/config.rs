//! Configuration for the database connection and chart output

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_error, Result};

/// Where the default connection config lives, relative to the working directory
pub const DEFAULT_DB_CONFIG: &str = "config/psql_connection.json";

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Database connection settings, read from a JSON file like
/// `{"connectionStr": "output/sim.db"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "connectionStr")]
    pub connection_str: String,
}

impl DatabaseConfig {
    pub fn new(connection_str: impl Into<String>) -> Self {
        Self {
            connection_str: connection_str.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(
                format!("Cannot read connection config {}: {}", path.display(), e),
                Some("db_config"),
            )
        })?;
        let config: DatabaseConfig = serde_json::from_str(&content)?;
        if config.connection_str.trim().is_empty() {
            return Err(config_error(
                format!("Empty connectionStr in {}", path.display()),
                Some("connectionStr"),
            ));
        }
        Ok(config)
    }
}

/// Output location and size of rendered charts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSettings {
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl PlotSettings {
    pub fn new(out_dir: impl Into<PathBuf>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(config_error(
                format!("Chart size must be non-zero, got {}x{}", width, height),
                Some("width"),
            ));
        }
        Ok(Self {
            out_dir: out_dir.into(),
            width,
            height,
        })
    }

    /// SVG path for the chart called `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{}.svg", name))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
