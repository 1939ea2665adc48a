use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::calculations::business::validate_request;
use crate::calculations::{
    BusinessResultCalculator, ExpenseValidator, PersonalTaxCalculator, SalaryDividendOptimizer,
    SocialContributionCalculator, TaxPlanningAdvisor, VatCalculator, max_deduction_limits,
};
use crate::error::TaxError;
use crate::models::{
    EnkAdvice, EnkRequest, EnkResult, ExpenseValidationResult, PlanningResult, RateConfiguration,
    SocialContributionRequest, SocialContributionResult, TaxRequest, TaxResult, VatRequest,
    VatResult,
};
use crate::service::clock::{Clock, SystemClock};
use crate::service::observer::{
    ComputationFailedEvent, ComputationObserver, ExpenseValidationEvent, ObserverList,
    PersonalTaxEvent,
};
use crate::service::orchestrator::EnkOrchestrator;
use crate::service::traits::{EnkTaxService, PersonalTaxService};

pub const SALARY_OPTIMIZATION_COMPLETED: &str = "Salary optimization completed";

/// Composition root of the engine.
///
/// Cheap to clone; clones share the configuration, observers and clock.
///
/// ```
/// use skatt_core::{RateConfiguration, TaxEngine};
///
/// let engine = TaxEngine::builder()
///     .config(RateConfiguration::norway_2024())
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.config().tax_year, 2024);
/// ```
#[derive(Clone)]
pub struct TaxEngine {
    config: Arc<RateConfiguration>,
    observers: ObserverList,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TaxEngine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaxEngine")
            .field("tax_year", &self.config.tax_year)
            .field("observers", &self.observers.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl TaxEngine {
    pub fn builder() -> TaxEngineBuilder {
        TaxEngineBuilder::default()
    }

    pub fn config(&self) -> &RateConfiguration {
        &self.config
    }

    fn failed(
        &self,
        operation: &'static str,
        err: TaxError,
        timestamp: DateTime<Utc>,
    ) -> TaxError {
        error!(operation, error = %err, "computation failed");
        let event = ComputationFailedEvent {
            operation,
            stage: None,
            error: &err,
            timestamp,
        };
        self.observers.notify("computation_failed", |observer| {
            observer.computation_failed(&event)
        });
        err
    }
}

/// Builder for [`TaxEngine`].
///
/// Typical lifetime:
/// 1. Start with [`TaxEngine::builder`].
/// 2. Supply the rate configuration (required).
/// 3. Register observers and optionally a clock.
/// 4. Call [`build`](Self::build).
#[derive(Default)]
pub struct TaxEngineBuilder {
    config: Option<Arc<RateConfiguration>>,
    observers: Vec<Arc<dyn ComputationObserver>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TaxEngineBuilder {
    pub fn config(
        self,
        config: RateConfiguration,
    ) -> Self {
        self.shared_config(Arc::new(config))
    }

    /// Uses a configuration already shared with other engines.
    pub fn shared_config(
        mut self,
        config: Arc<RateConfiguration>,
    ) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn observer(
        mut self,
        observer: Arc<dyn ComputationObserver>,
    ) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn clock(
        mut self,
        clock: impl Clock + 'static,
    ) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Validates the configuration and assembles the engine.
    ///
    /// # Errors
    ///
    /// - [`TaxError::ConfigurationMissing`] if no configuration was supplied.
    /// - [`TaxError::InvalidConfiguration`] if the configuration violates
    ///   one of its invariants.
    pub fn build(self) -> Result<TaxEngine, TaxError> {
        let config = self
            .config
            .ok_or(TaxError::ConfigurationMissing("rate configuration"))?;
        config.validate()?;

        debug!(
            tax_year = config.tax_year,
            observers = self.observers.len(),
            "tax engine ready"
        );

        Ok(TaxEngine {
            config,
            observers: ObserverList::new(self.observers),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

#[async_trait]
impl PersonalTaxService for TaxEngine {
    async fn compute_personal_tax(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxResult, TaxError> {
        let now = self.clock.now();
        let calculator = PersonalTaxCalculator::new(&self.config);
        calculator
            .validate(request)
            .map_err(|err| self.failed("compute_personal_tax", err, now))?;

        let pending = TaxResult {
            computed_at: now,
            ..Default::default()
        };
        let before = PersonalTaxEvent {
            request,
            result: &pending,
            timestamp: now,
        };
        self.observers.notify("before_personal_tax", |observer| {
            observer.before_personal_tax(&before)
        });

        let result = calculator
            .compute(request, now)
            .map_err(|err| self.failed("compute_personal_tax", err, now))?;

        info!(
            income = %result.gross_income,
            total_tax = %result.total_tax,
            "personal tax computed"
        );
        let after = PersonalTaxEvent {
            request,
            result: &result,
            timestamp: now,
        };
        self.observers.notify("after_personal_tax", |observer| {
            observer.after_personal_tax(&after)
        });

        Ok(result)
    }

    async fn compute_social_contribution(
        &self,
        request: &SocialContributionRequest,
    ) -> Result<SocialContributionResult, TaxError> {
        SocialContributionCalculator::new(&self.config.social_contribution)
            .compute(request.income, request.class)
            .map_err(|err| self.failed("compute_social_contribution", err, self.clock.now()))
    }

    async fn compute_vat(
        &self,
        request: &VatRequest,
    ) -> Result<VatResult, TaxError> {
        VatCalculator::new(&self.config.vat)
            .compute(request.amount, request.category, request.includes_vat)
            .map_err(|err| self.failed("compute_vat", err, self.clock.now()))
    }
}

#[async_trait]
impl EnkTaxService for TaxEngine {
    async fn compute_enk_tax(
        &self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError> {
        EnkOrchestrator::new(&self.config, &self.observers, self.clock.now()).run(request)
    }

    async fn optimize_salary(
        &self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError> {
        let now = self.clock.now();
        let figures = BusinessResultCalculator::new(&self.config)
            .compute(request)
            .map_err(|err| self.failed("optimize_salary", err, now))?;
        let proposal = SalaryDividendOptimizer::new(&self.config).optimize(figures.business_result);

        Ok(EnkResult {
            tax: TaxResult {
                success: true,
                message: SALARY_OPTIMIZATION_COMPLETED.to_string(),
                computed_at: now,
                ..Default::default()
            },
            business_result: figures.business_result,
            total_expenses: figures.total_expenses,
            taxable_business_income: figures.taxable_income,
            standard_deduction: figures.deduction_applied,
            loss_carried_forward: figures.loss_carried,
            proposed_salary: proposal.proposed_salary,
            proposed_dividend: proposal.proposed_dividend,
            advice: EnkAdvice {
                recommended_actions: proposal.recommendations,
                estimated_optimal_salary: proposal.proposed_salary,
                risk_level: proposal.risk,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn validate_expenses(
        &self,
        request: &EnkRequest,
    ) -> Result<ExpenseValidationResult, TaxError> {
        let now = self.clock.now();
        let result = ExpenseValidator::new(&self.config)
            .validate(request)
            .map_err(|err| self.failed("validate_expenses", err, now))?;

        let event = ExpenseValidationEvent {
            request,
            result: &result,
            category_count: result.category_count,
            flagged_count: result.flagged_count,
            timestamp: now,
        };
        self.observers.notify("expenses_validated", |observer| {
            observer.expenses_validated(&event)
        });

        Ok(result)
    }

    async fn max_deduction_limits(
        &self,
        industry_code: &str,
        year: i32,
    ) -> BTreeMap<String, Decimal> {
        max_deduction_limits(&self.config, industry_code, year)
    }

    async fn propose_tax_planning_strategy(
        &self,
        request: &EnkRequest,
    ) -> Result<PlanningResult, TaxError> {
        validate_request(request, &self.config)
            .map_err(|err| self.failed("propose_tax_planning_strategy", err, self.clock.now()))?;
        Ok(TaxPlanningAdvisor::new(&self.config).plan(request))
    }

    async fn estimate_prepayment_tax(
        &self,
        request: &EnkRequest,
    ) -> Result<Decimal, TaxError> {
        validate_request(request, &self.config)
            .map_err(|err| self.failed("estimate_prepayment_tax", err, self.clock.now()))?;
        Ok(TaxPlanningAdvisor::new(&self.config).estimate_prepayment(request))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn build_without_config_is_configuration_missing() {
        let result = TaxEngine::builder().build();

        assert_eq!(
            result.err(),
            Some(TaxError::ConfigurationMissing("rate configuration"))
        );
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = RateConfiguration::norway_2024();
        config.vat.standard_rate = dec!(125);

        let result = TaxEngine::builder().config(config).build();

        assert!(matches!(
            result.err(),
            Some(TaxError::InvalidConfiguration(ConfigError::InvalidPercentage { .. }))
        ));
    }

    #[test]
    fn clones_share_configuration() {
        let shared = Arc::new(RateConfiguration::norway_2024());
        let engine = TaxEngine::builder()
            .shared_config(shared.clone())
            .build()
            .unwrap();
        let clone = engine.clone();

        assert!(std::ptr::eq(engine.config(), clone.config()));
        assert!(std::ptr::eq(engine.config(), shared.as_ref()));
    }

    #[test]
    fn debug_output_omits_configuration_details() {
        let engine = TaxEngine::builder()
            .config(RateConfiguration::norway_2024())
            .build()
            .unwrap();

        let rendered = format!("{engine:?}");

        assert!(rendered.contains("tax_year: 2024"));
        assert!(rendered.contains("observers: 0"));
    }
}
