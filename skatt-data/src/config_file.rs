//! TOML rate overrides and the one-shot configuration resolution.
//!
//! Every key is optional; anything missing, zero or negative falls back to
//! the built-in 2024 defaults.
//!
//! ```toml
//! tax_year = 2024
//!
//! [social_contribution]
//! self_employed_rate = 11.1
//!
//! [vat]
//! rounding = "Down"
//!
//! [industry_rates]
//! IT = 15000
//! ```

use std::path::Path;

use skatt_core::{RateConfiguration, RateOverrides};
use tracing::info;

use crate::error::LoaderError;
use crate::municipal::MunicipalRateLoader;

/// Parse overrides from TOML text.
pub fn parse_overrides(input: &str) -> Result<RateOverrides, LoaderError> {
    Ok(toml::from_str(input)?)
}

/// Read a TOML file from disk and delegate to [`parse_overrides`].
pub fn load_overrides(path: &Path) -> Result<RateOverrides, LoaderError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_overrides(&contents)
}

/// Builds the effective configuration from optional override and municipal
/// rate files.
///
/// Municipal rates from the CSV file are merged on top of the table the
/// overrides resolve to, replacing entries with the same code.
///
/// # Errors
///
/// Any [`LoaderError`] from reading either file, or
/// [`LoaderError::InvalidConfiguration`] if the result breaks a
/// configuration invariant.
pub fn load_configuration(
    overrides: Option<&Path>,
    municipal_rates: Option<&Path>,
) -> Result<RateConfiguration, LoaderError> {
    let overrides = match overrides {
        Some(path) => {
            info!(path = %path.display(), "loading rate overrides");
            load_overrides(path)?
        }
        None => RateOverrides::default(),
    };
    let mut config = overrides.resolve();

    if let Some(path) = municipal_rates {
        info!(path = %path.display(), "loading municipal rates");
        let records = MunicipalRateLoader::load_from_file(path)?;
        config
            .municipal
            .rates
            .extend(MunicipalRateLoader::into_table(records));
    }

    config.validate()?;
    Ok(config)
}
