pub mod calculations;
pub mod error;
pub mod models;
pub mod service;

pub use error::{ConfigError, TaxError};
pub use models::*;
pub use service::{
    Clock, ComputationObserver, EnkTaxService, FixedClock, PersonalTaxService, SystemClock,
    TaxEngine, TaxEngineBuilder,
};
