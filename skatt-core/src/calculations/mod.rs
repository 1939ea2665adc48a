//! Pure calculators for Norwegian personal and sole-proprietorship tax.
//!
//! Every calculator borrows the part of the
//! [`RateConfiguration`](crate::RateConfiguration) it needs and performs no
//! I/O. The ENK orchestration on top of them lives in [`crate::service`].

pub mod business;
pub mod common;
pub mod expenses;
pub mod optimizer;
pub mod personal;
pub mod planning;
pub mod social_contribution;
pub mod vat;

pub use business::{BusinessFigures, BusinessResultCalculator, standard_deduction};
pub use expenses::{ExpenseValidator, max_deduction_limits};
pub use optimizer::{SalaryDividendOptimizer, SalaryProposal, risk_level};
pub use personal::PersonalTaxCalculator;
pub use planning::TaxPlanningAdvisor;
pub use social_contribution::SocialContributionCalculator;
pub use vat::VatCalculator;
