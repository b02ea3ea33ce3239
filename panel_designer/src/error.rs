use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Missing required configuration key '{key}' in {source_file}")]
    Configuration { key: String, source_file: String },

    #[error("Invalid value for configuration key '{key}': {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("Missing required column '{column}' in {table}")]
    DataShape { column: String, table: String },

    #[error("Invalid mutation record: {0}")]
    InvalidRecord(String),

    #[error("Invalid coordinate string '{0}', expected chr<N>:<start>-<end>")]
    InvalidCoordinate(String),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PanelError {
    pub fn config(key: &str, source_file: &str) -> Self {
        PanelError::Configuration {
            key: key.to_string(),
            source_file: source_file.to_string(),
        }
    }

    pub fn shape(column: &str, table: &str) -> Self {
        PanelError::DataShape {
            column: column.to_string(),
            table: table.to_string(),
        }
    }
}
