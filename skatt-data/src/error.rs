use std::path::PathBuf;

use rust_decimal::Decimal;
use skatt_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading configuration or rate files.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The underlying CSV deserialisation failed (bad structure, missing
    /// column, type mismatch).
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid municipality code '{code}' on row {row}; expected four digits")]
    InvalidMunicipalityCode { code: String, row: usize },

    #[error("rate {rate} for municipality {code} on row {row} is outside 0..=100")]
    InvalidRate {
        code: String,
        rate: Decimal,
        row: usize,
    },

    #[error("municipality {code} is listed more than once (row {row})")]
    DuplicateMunicipality { code: String, row: usize },

    #[error("resolved configuration is invalid: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
