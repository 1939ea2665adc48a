//! Business result for a sole proprietorship (ENK).
//!
//! ```text
//! total_expenses  = sum of the itemized expense fields
//! deduction       = min(income × rate, cap)   if income <= threshold
//!                 = cap                       otherwise
//! business_result = income - total_expenses - deduction
//! ```
//!
//! A prior-year loss, when carry-forward is enabled, is then consumed in
//! full against the result, which is floored at zero. Without a prior loss a
//! negative result is reported unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::error::{TaxError, ensure_at_most, ensure_non_negative};
use crate::models::{EnkRequest, LossCarryForward, RateConfiguration, StandardDeductionRules};

/// Figures produced by [`BusinessResultCalculator::compute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BusinessFigures {
    pub business_result: Decimal,
    pub total_expenses: Decimal,
    pub taxable_income: Decimal,
    pub deduction_applied: Decimal,
    /// Prior-year loss consumed against this year's result.
    pub loss_carried: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct BusinessResultCalculator<'a> {
    config: &'a RateConfiguration,
}

impl<'a> BusinessResultCalculator<'a> {
    pub fn new(config: &'a RateConfiguration) -> Self {
        Self { config }
    }

    /// Computes the business result for `request`.
    ///
    /// # Errors
    ///
    /// - [`TaxError::NegativeAmount`] for a negative business income, expense
    ///   field, salary or prior-year loss.
    /// - [`TaxError::AboveMaximum`] if the business income, salary or
    ///   prior-year loss exceeds the maximum income, or an expense field
    ///   exceeds the maximum expense.
    pub fn compute(
        &self,
        request: &EnkRequest,
    ) -> Result<BusinessFigures, TaxError> {
        validate_request(request, self.config)?;

        let income = request.business_income;
        let total_expenses = request.total_expenses();
        let deduction = standard_deduction(income, &self.config.standard_deduction);

        let before_loss = income - total_expenses - deduction;
        let (business_result, loss_carried) = apply_prior_loss(
            before_loss,
            request.prior_year_loss,
            &self.config.loss_carry_forward,
        );

        if business_result < Decimal::ZERO {
            warn!(
                business_result = %business_result,
                "business result is negative; reporting the loss unchanged"
            );
        }

        debug!(
            income = %income,
            total_expenses = %total_expenses,
            deduction = %deduction,
            business_result = %business_result,
            loss_carried = %loss_carried,
            "computed business result"
        );

        Ok(BusinessFigures {
            business_result,
            total_expenses,
            taxable_income: business_result,
            deduction_applied: deduction,
            loss_carried,
        })
    }
}

/// Sliding-scale standard deduction ("minifradrag").
///
/// At or below the income threshold the deduction is `income × rate`,
/// limited to the cap. Above the threshold the flat cap applies.
pub fn standard_deduction(
    business_income: Decimal,
    rules: &StandardDeductionRules,
) -> Decimal {
    if business_income <= rules.income_threshold {
        round_half_up(business_income * rules.rate).min(rules.cap)
    } else {
        rules.cap
    }
}

/// Returns the result after offsetting the prior-year loss, and the part of
/// the loss that was consumed.
fn apply_prior_loss(
    result: Decimal,
    prior_year_loss: Decimal,
    rules: &LossCarryForward,
) -> (Decimal, Decimal) {
    if prior_year_loss <= Decimal::ZERO || !rules.enabled {
        return (result, Decimal::ZERO);
    }

    let available = round_half_up(prior_year_loss * rules.share);
    let consumed = available.min(result.max(Decimal::ZERO));
    ((result - available).max(Decimal::ZERO), consumed)
}

/// Input checks shared by every ENK operation.
///
/// Income, salary and prior-year loss are bounded by the maximum income;
/// each expense field by the maximum expense.
pub(crate) fn validate_request(
    request: &EnkRequest,
    config: &RateConfiguration,
) -> Result<(), TaxError> {
    let bounds = &config.validation;

    ensure_non_negative("business income", request.business_income)?;
    ensure_at_most("business income", request.business_income, bounds.max_income)?;

    for (field, amount) in request.itemized_expenses() {
        ensure_non_negative(field, amount)?;
        ensure_at_most(field, amount, bounds.max_expense)?;
    }

    ensure_non_negative("salary withdrawn", request.salary_withdrawn)?;
    ensure_at_most("salary withdrawn", request.salary_withdrawn, bounds.max_income)?;
    ensure_non_negative("prior year loss", request.prior_year_loss)?;
    ensure_at_most("prior year loss", request.prior_year_loss, bounds.max_income)?;

    Ok(())
}
