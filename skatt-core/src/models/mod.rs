mod config;
mod overrides;
mod request;
mod result;

pub use config::{
    DEFAULT_TAX_YEAR, ExpenseCaps, IncomeBands, LossCarryForward, MunicipalRates,
    PlanningHeuristics, RateConfiguration, SalaryStrategy, SocialContributionRates,
    StandardDeductionRules, ValidationBounds, VatRates, VatRounding,
};
pub use overrides::{
    ExpenseCapOverrides, MunicipalOverrides, RateOverrides, SocialContributionOverrides,
    StandardDeductionOverrides, ValidationOverrides, VatOverrides,
};
pub use request::{
    BusinessType, ContributionClass, EnkRequest, SocialContributionRequest, TaxExtension,
    TaxRequest, VatCategory, VatRequest,
};
pub use result::{
    EnkAdvice, EnkResult, ExpenseCategory, ExpenseValidationResult, MUNICIPAL_TAX,
    PlanningResult, Priority, RiskLevel, SELF_EMPLOYED_CONTRIBUTION, SOCIAL_CONTRIBUTION,
    SocialContributionResult, TaxResult, VatResult,
};
