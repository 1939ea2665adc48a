//! Async service façade over the calculators.
//!
//! [`TaxEngine`] is the composition root: it owns the shared configuration,
//! the observers and the clock, and implements both service traits.

pub mod clock;
pub mod engine;
pub mod observer;
pub mod orchestrator;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{TaxEngine, TaxEngineBuilder};
pub use observer::{
    ComputationFailedEvent, ComputationObserver, EnkComputationEvent, ExpenseValidationEvent,
    PersonalTaxEvent,
};
pub use orchestrator::{ENK_COMPLETED, EnkStage};
pub use traits::{EnkTaxService, PersonalTaxService};
