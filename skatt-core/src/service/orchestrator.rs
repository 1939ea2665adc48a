//! Sequencing of a full ENK computation.
//!
//! ```text
//! Validating -> ComputingBusinessResult -> ComputingContribution
//!            -> ComputingPersonalTax -> GeneratingAdvice -> Done
//! ```
//!
//! Any error moves the run to `Failed` and is returned unchanged. The
//! "before" event fires once validation has passed; the "after" event fires
//! only when the run reaches `Done`.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::calculations::business::validate_request;
use crate::calculations::common::{format_nok, percent_of};
use crate::calculations::optimizer::CONSULT_ACCOUNTANT;
use crate::calculations::{
    BusinessFigures, BusinessResultCalculator, ExpenseValidator, PersonalTaxCalculator,
    SalaryDividendOptimizer, SocialContributionCalculator, TaxPlanningAdvisor, risk_level,
};
use crate::error::TaxError;
use crate::models::{
    ContributionClass, EnkAdvice, EnkRequest, EnkResult, RateConfiguration,
    SELF_EMPLOYED_CONTRIBUTION, TaxRequest, TaxResult,
};
use crate::service::observer::{
    ComputationFailedEvent, ComputationObserver, EnkComputationEvent, ObserverList,
};

pub const ENK_COMPLETED: &str = "ENK tax computation completed";

/// Stage of an ENK computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnkStage {
    Validating,
    ComputingBusinessResult,
    ComputingContribution,
    ComputingPersonalTax,
    GeneratingAdvice,
    Done,
    Failed,
}

impl EnkStage {
    /// The stage that follows a successful `self`. Terminal stages map to
    /// themselves.
    pub fn next(self) -> Self {
        match self {
            Self::Validating => Self::ComputingBusinessResult,
            Self::ComputingBusinessResult => Self::ComputingContribution,
            Self::ComputingContribution => Self::ComputingPersonalTax,
            Self::ComputingPersonalTax => Self::GeneratingAdvice,
            Self::GeneratingAdvice => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for EnkStage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One ENK computation run against a shared configuration.
pub(crate) struct EnkOrchestrator<'a> {
    config: &'a RateConfiguration,
    observers: &'a ObserverList,
    computed_at: DateTime<Utc>,
    stage: EnkStage,
}

impl<'a> EnkOrchestrator<'a> {
    pub(crate) fn new(
        config: &'a RateConfiguration,
        observers: &'a ObserverList,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            observers,
            computed_at,
            stage: EnkStage::Validating,
        }
    }

    /// Runs every stage in order and returns the assembled result.
    pub(crate) fn run(
        mut self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError> {
        match self.execute(request) {
            Ok(result) => Ok(result),
            Err(err) => {
                let failed_in = self.stage;
                error!(stage = %failed_in, error = %err, "ENK computation failed");
                self.transition(EnkStage::Failed);

                let event = ComputationFailedEvent {
                    operation: "compute_enk_tax",
                    stage: Some(failed_in),
                    error: &err,
                    timestamp: self.computed_at,
                };
                self.observers.notify("computation_failed", |observer| {
                    observer.computation_failed(&event)
                });
                Err(err)
            }
        }
    }

    fn execute(
        &mut self,
        request: &EnkRequest,
    ) -> Result<EnkResult, TaxError> {
        validate_request(request, self.config)?;

        let mut result = EnkResult::default();
        result.tax.computed_at = self.computed_at;
        self.notify_enk("before_enk_computation", request, &result, |observer, event| {
            observer.before_enk_computation(event)
        });
        self.advance();

        let figures = BusinessResultCalculator::new(self.config).compute(request)?;
        result.business_result = figures.business_result;
        result.total_expenses = figures.total_expenses;
        result.taxable_business_income = figures.taxable_income;
        result.standard_deduction = figures.deduction_applied;
        result.loss_carried_forward = figures.loss_carried;
        result.expense_breakdown = ExpenseValidator::new(self.config)
            .validate(request)?
            .categories;
        self.advance();

        let contribution_base = figures.taxable_income.max(Decimal::ZERO);
        let contribution = SocialContributionCalculator::new(&self.config.social_contribution)
            .compute(contribution_base, ContributionClass::SelfEmployed)?
            .amount;
        result.social_contribution = contribution;
        result.self_employed_tax = contribution;
        self.advance();

        result.tax = self.personal_tax(request, &figures, contribution)?;
        self.advance();

        result.advice = self.advice(request, &figures);
        result.proposed_salary = result.advice.estimated_optimal_salary;
        result.proposed_dividend =
            (figures.business_result - result.proposed_salary).max(Decimal::ZERO);
        self.advance();

        result.tax.success = true;
        result.tax.message = ENK_COMPLETED.to_string();

        info!(
            business_result = %result.business_result,
            total_tax = %result.tax.total_tax,
            "ENK computation completed"
        );
        self.notify_enk("after_enk_computation", request, &result, |observer, event| {
            observer.after_enk_computation(event)
        });

        Ok(result)
    }

    /// Personal tax on the taxable business income plus salary drawn,
    /// combined with the self-employed contribution.
    fn personal_tax(
        &self,
        request: &EnkRequest,
        figures: &BusinessFigures,
        contribution: Decimal,
    ) -> Result<TaxResult, TaxError> {
        let taxable = figures.taxable_income;
        let personal_request = TaxRequest {
            income: taxable.max(Decimal::ZERO) + request.salary_withdrawn,
            ..request.person.clone()
        };
        let personal =
            PersonalTaxCalculator::new(self.config).compute(&personal_request, self.computed_at)?;

        let total_tax = personal.total_tax + contribution;
        let mut breakdown = personal.breakdown;
        breakdown.insert(SELF_EMPLOYED_CONTRIBUTION.to_string(), contribution);

        Ok(TaxResult {
            gross_income: personal.gross_income,
            net_income: taxable - total_tax,
            total_tax,
            effective_rate: percent_of(total_tax, taxable),
            breakdown,
            success: false,
            message: String::new(),
            computed_at: self.computed_at,
        })
    }

    fn advice(
        &self,
        request: &EnkRequest,
        figures: &BusinessFigures,
    ) -> EnkAdvice {
        let bands = &self.config.income_bands;
        let business_result = figures.business_result;

        let mut actions = Vec::new();
        if business_result < bands.low {
            actions.push("Focus on increasing income rather than tax optimization".to_string());
            actions.push("Document all expenses carefully for the maximum deduction".to_string());
        } else if business_result > bands.medium {
            actions.push("Consider equipment investments for increased depreciation".to_string());
            actions.push("Plan the salary/dividend split for tax optimization".to_string());
        }

        let proposal = SalaryDividendOptimizer::new(self.config).optimize(business_result);
        actions.extend(
            proposal
                .recommendations
                .into_iter()
                .filter(|recommendation| recommendation != CONSULT_ACCOUNTANT),
        );
        actions.push(CONSULT_ACCOUNTANT.to_string());

        let plan = TaxPlanningAdvisor::new(self.config).plan(request);

        EnkAdvice {
            recommended_actions: actions,
            potential_deductions: self.potential_deductions(request, figures),
            estimated_optimal_salary: proposal.proposed_salary,
            risk_level: risk_level(business_result, bands),
            estimated_savings: plan.estimated_savings,
            recommended_timeframe: plan.timeframe,
        }
    }

    fn potential_deductions(
        &self,
        request: &EnkRequest,
        figures: &BusinessFigures,
    ) -> Vec<String> {
        let caps = &self.config.expense_caps;
        let mut deductions = vec![format!(
            "Standard deduction (minifradrag) of {} NOK applied",
            format_nok(figures.deduction_applied)
        )];

        if request.office_expenses.is_zero() {
            deductions.push(format!(
                "Home office deduction of up to {} NOK",
                format_nok(caps.home_office)
            ));
        }
        if request.business_kilometers == 0 {
            deductions.push(format!(
                "Mileage deduction at {} NOK per business kilometre",
                caps.mileage_per_km
            ));
        }
        if figures.loss_carried > Decimal::ZERO {
            deductions.push(format!(
                "Prior-year loss of {} NOK offset against this year's result",
                format_nok(figures.loss_carried)
            ));
        }

        deductions
    }

    fn notify_enk<F>(
        &self,
        hook: &'static str,
        request: &EnkRequest,
        result: &EnkResult,
        call: F,
    ) where
        F: Fn(&dyn ComputationObserver, &EnkComputationEvent<'_>) -> anyhow::Result<()>,
    {
        let event = EnkComputationEvent {
            request,
            result,
            timestamp: self.computed_at,
        };
        self.observers
            .notify(hook, |observer| call(observer, &event));
    }

    fn advance(&mut self) {
        self.transition(self.stage.next());
    }

    fn transition(
        &mut self,
        to: EnkStage,
    ) {
        debug!(from = %self.stage, to = %to, "ENK stage transition");
        self.stage = to;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{MUNICIPAL_TAX, RiskLevel, SOCIAL_CONTRIBUTION};

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_243_200, 0).unwrap_or_default()
    }

    fn request() -> EnkRequest {
        EnkRequest {
            person: TaxRequest::new(dec!(0), "0301"),
            business_income: dec!(500000),
            general_expenses: dec!(100000),
            ..Default::default()
        }
    }

    #[test]
    fn stages_advance_in_order() {
        let mut stage = EnkStage::Validating;
        let mut visited = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            visited.push(stage);
        }

        assert_eq!(
            visited,
            vec![
                EnkStage::Validating,
                EnkStage::ComputingBusinessResult,
                EnkStage::ComputingContribution,
                EnkStage::ComputingPersonalTax,
                EnkStage::GeneratingAdvice,
                EnkStage::Done,
            ]
        );
        assert_eq!(EnkStage::Failed.next(), EnkStage::Failed);
    }

    #[test]
    fn full_run_combines_every_component() {
        let config = RateConfiguration::norway_2024();
        let observers = ObserverList::default();

        let result = EnkOrchestrator::new(&config, &observers, at())
            .run(&request())
            .unwrap();

        assert_eq!(result.business_result, dec!(314000));
        assert_eq!(result.standard_deduction, dec!(86000));
        assert_eq!(result.social_contribution, dec!(35796));
        assert_eq!(result.self_employed_tax, dec!(35796));

        // personal tax on 314 000: 25 748 contribution + 69 080 municipal
        assert_eq!(result.tax.breakdown[SOCIAL_CONTRIBUTION], dec!(25748));
        assert_eq!(result.tax.breakdown[MUNICIPAL_TAX], dec!(69080));
        assert_eq!(result.tax.breakdown[SELF_EMPLOYED_CONTRIBUTION], dec!(35796));
        assert_eq!(result.tax.total_tax, dec!(130624));
        assert_eq!(result.tax.net_income, dec!(183376));
        assert_eq!(result.tax.effective_rate, dec!(41.60));

        assert_eq!(result.proposed_salary, dec!(200000));
        assert_eq!(result.proposed_dividend, dec!(114000));
        assert_eq!(result.advice.risk_level, RiskLevel::Medium);
        assert_eq!(result.advice.estimated_savings, dec!(22500));
        assert!(result.tax.success);
        assert_eq!(result.tax.message, ENK_COMPLETED);
        assert_eq!(result.tax.computed_at, at());
    }

    #[test]
    fn salary_withdrawn_is_added_to_personal_income() {
        let config = RateConfiguration::norway_2024();
        let observers = ObserverList::default();
        let mut request = request();
        request.salary_withdrawn = dec!(100000);

        let result = EnkOrchestrator::new(&config, &observers, at())
            .run(&request)
            .unwrap();

        assert_eq!(result.tax.gross_income, dec!(414000));
        assert_eq!(result.tax.breakdown[MUNICIPAL_TAX], dec!(91080));
    }

    #[test]
    fn loss_making_business_pays_no_contribution() {
        let config = RateConfiguration::norway_2024();
        let observers = ObserverList::default();
        let request = EnkRequest {
            business_income: dec!(0),
            general_expenses: dec!(25000),
            ..Default::default()
        };

        let result = EnkOrchestrator::new(&config, &observers, at())
            .run(&request)
            .unwrap();

        assert_eq!(result.business_result, dec!(-25000));
        assert_eq!(result.social_contribution, dec!(0));
        assert_eq!(result.tax.total_tax, dec!(0));
        assert_eq!(result.tax.effective_rate, dec!(0));
        assert_eq!(result.proposed_salary, dec!(0));
        assert_eq!(result.advice.risk_level, RiskLevel::Low);
    }

    #[test]
    fn negative_business_income_fails_fast() {
        let config = RateConfiguration::norway_2024();
        let observers = ObserverList::default();
        let mut request = request();
        request.business_income = dec!(-1);

        let result = EnkOrchestrator::new(&config, &observers, at()).run(&request);

        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn advice_always_ends_with_accountant() {
        let config = RateConfiguration::norway_2024();
        let observers = ObserverList::default();

        let result = EnkOrchestrator::new(&config, &observers, at())
            .run(&request())
            .unwrap();

        let actions = &result.advice.recommended_actions;
        assert_eq!(actions.last().map(String::as_str), Some(CONSULT_ACCOUNTANT));
        assert_eq!(
            actions
                .iter()
                .filter(|action| action.as_str() == CONSULT_ACCOUNTANT)
                .count(),
            1
        );
    }
}
