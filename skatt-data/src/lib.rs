pub mod config_file;
pub mod error;
pub mod municipal;

pub use config_file::{load_configuration, load_overrides, parse_overrides};
pub use error::LoaderError;
pub use municipal::{MunicipalRateLoader, MunicipalRateRecord};
