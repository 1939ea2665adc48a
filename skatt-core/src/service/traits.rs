use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::TaxError;
use crate::models::{
    EnkRequest, EnkResult, ExpenseValidationResult, PlanningResult, SocialContributionRequest,
    SocialContributionResult, TaxRequest, TaxResult, VatRequest, VatResult,
};

/// Personal income tax, social contribution and VAT.
#[async_trait]
pub trait PersonalTaxService: Send + Sync {
    async fn compute_personal_tax(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxResult, TaxError>;

    async fn compute_social_contribution(
        &self,
        request: &SocialContributionRequest,
    ) -> Result<SocialContributionResult, TaxError>;

    async fn compute_vat(
        &self,
        request: &VatRequest,
    ) -> Result<VatResult, TaxError>;
}

/// Sole-proprietorship (ENK) computations and advice.
#[async_trait]
pub trait EnkTaxService: Send + Sync {
    /// Full computation: business result, self-employed contribution,
    /// personal tax and advice.
    async fn compute_enk_tax(
        &self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError>;

    /// Salary/dividend split for the request's business result. Only the
    /// business figures, the proposal and the advice are populated.
    async fn optimize_salary(
        &self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError>;

    async fn validate_expenses(
        &self,
        request: &EnkRequest,
    ) -> Result<ExpenseValidationResult, TaxError>;

    async fn max_deduction_limits(
        &self,
        industry_code: &str,
        year: i32,
    ) -> BTreeMap<String, Decimal>;

    async fn propose_tax_planning_strategy(
        &self,
        request: &EnkRequest,
    ) -> Result<PlanningResult, TaxError>;

    async fn estimate_prepayment_tax(
        &self,
        request: &EnkRequest,
    ) -> Result<Decimal, TaxError>;
}
