//! Expense validation against the configured caps, and the deduction limit
//! table.
//!
//! Only soft limits exist for most categories: going over a cap produces a
//! warning, not an error. Errors are reserved for inputs outside the
//! validation bounds (kilometres driven, total expenses).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::business::validate_request;
use crate::calculations::common::{format_nok, percent_of, round_half_up};
use crate::error::TaxError;
use crate::models::{EnkRequest, ExpenseCategory, ExpenseValidationResult, RateConfiguration};

pub const HOME_OFFICE: &str = "HomeOffice";
pub const TRAVEL: &str = "Travel";
pub const OTHER: &str = "Other";
pub const MILEAGE: &str = "Mileage";

#[derive(Debug, Clone, Copy)]
pub struct ExpenseValidator<'a> {
    config: &'a RateConfiguration,
}

impl<'a> ExpenseValidator<'a> {
    pub fn new(config: &'a RateConfiguration) -> Self {
        Self { config }
    }

    /// Validates the itemized expenses of `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::NegativeAmount`] or [`TaxError::AboveMaximum`]
    /// when the request itself is out of bounds.
    pub fn validate(
        &self,
        request: &EnkRequest,
    ) -> Result<ExpenseValidationResult, TaxError> {
        validate_request(request, self.config)?;

        let mut result = ExpenseValidationResult::default();

        if request.office_expenses > Decimal::ZERO {
            self.check_home_office(request.office_expenses, &mut result);
        }
        if request.travel_expenses > Decimal::ZERO {
            self.check_travel(request.travel_expenses, &mut result);
        }
        if request.other_expenses > Decimal::ZERO {
            check_other(request.other_expenses, &mut result);
        }
        if request.business_kilometers > 0 {
            self.check_mileage(request.business_kilometers, &mut result);
        }

        let total = request.total_expenses();
        let max_expense = self.config.validation.max_expense;
        if total > max_expense {
            result.errors.push(format!(
                "Total expenses of {} NOK exceed the maximum of {} NOK.",
                format_nok(total),
                format_nok(max_expense)
            ));
        }

        let max_employees = self.config.validation.max_employees;
        if request.employee_count > max_employees {
            result.recommendations.push(format!(
                "With more than {max_employees} employees, consider converting to a limited company (AS)."
            ));
        }

        result.total_expenses = total;
        result.category_count = result.categories.len();
        result.flagged_count = result
            .categories
            .iter()
            .filter(|category| category.is_flagged())
            .count();
        result.is_valid = result.warnings.is_empty() && result.errors.is_empty();

        debug!(
            categories = result.category_count,
            flagged = result.flagged_count,
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            "validated expenses"
        );

        Ok(result)
    }

    fn check_home_office(
        &self,
        amount: Decimal,
        result: &mut ExpenseValidationResult,
    ) {
        let cap = self.config.expense_caps.home_office;
        let within_cap = amount <= cap;
        let warning = (!within_cap).then(|| {
            format!(
                "Home office deduction exceeds the maximum of {} NOK. The tax authority may refuse the excess.",
                format_nok(cap)
            )
        });

        if let Some(warning) = &warning {
            result.warnings.push(warning.clone());
        }
        result.categories.push(ExpenseCategory {
            category: HOME_OFFICE.to_string(),
            amount,
            cap: Some(cap),
            within_cap,
            percent_of_cap: Some(percent_of(amount, cap)),
            warning,
        });
    }

    fn check_travel(
        &self,
        amount: Decimal,
        result: &mut ExpenseValidationResult,
    ) {
        let advisory = self.config.expense_caps.travel;
        let warning = (amount > advisory).then(|| {
            "Travel expenses look high. Be prepared to document every trip.".to_string()
        });

        if let Some(warning) = &warning {
            result.warnings.push(warning.clone());
        }
        result.categories.push(uncapped(TRAVEL, amount, warning));
    }

    fn check_mileage(
        &self,
        kilometers: u32,
        result: &mut ExpenseValidationResult,
    ) {
        let caps = &self.config.expense_caps;
        let max_kilometers = self.config.validation.max_kilometers;
        let amount = round_half_up(Decimal::from(kilometers) * caps.mileage_per_km);

        let mut category = uncapped(MILEAGE, amount, None);
        if kilometers > max_kilometers {
            result.errors.push(format!(
                "{kilometers} business kilometres exceeds the maximum of {max_kilometers}."
            ));
            category.within_cap = false;
        } else if kilometers > caps.mileage_documentation_km {
            let warning = format!(
                "More than {} business kilometres requires a complete driving log.",
                caps.mileage_documentation_km
            );
            result.warnings.push(warning.clone());
            category.warning = Some(warning);
        }

        result.categories.push(category);
    }
}

fn check_other(
    amount: Decimal,
    result: &mut ExpenseValidationResult,
) {
    result
        .recommendations
        .push("Keep receipts for all other expenses so they can be documented.".to_string());
    result.categories.push(uncapped(OTHER, amount, None));
}

fn uncapped(
    category: &str,
    amount: Decimal,
    warning: Option<String>,
) -> ExpenseCategory {
    ExpenseCategory {
        category: category.to_string(),
        amount,
        cap: None,
        within_cap: true,
        percent_of_cap: None,
        warning,
    }
}

/// Maximum deduction amounts by category for `industry_code` and `year`.
///
/// Keys: `HomeOffice`, `CarPerKm`, `Travel`, `Courses`, `Supplies`,
/// `Subscriptions`, `Representation`, `GiftsPerEmployee`, plus
/// `IndustrySpecific` when the industry has a configured rate. Only the
/// configured tax year is known; other years get the same table.
pub fn max_deduction_limits(
    config: &RateConfiguration,
    industry_code: &str,
    year: i32,
) -> BTreeMap<String, Decimal> {
    if year != config.tax_year {
        warn!(
            requested = year,
            configured = config.tax_year,
            "no limits configured for the requested year; using configured year"
        );
    }

    let caps = &config.expense_caps;
    let mut limits: BTreeMap<String, Decimal> = [
        (HOME_OFFICE, caps.home_office),
        ("CarPerKm", caps.mileage_per_km),
        (TRAVEL, caps.travel),
        ("Courses", caps.courses),
        ("Supplies", caps.supplies),
        ("Subscriptions", caps.subscriptions),
        ("Representation", caps.representation),
        ("GiftsPerEmployee", caps.gifts_per_employee),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();

    if let Some(rate) = config.industry_rates.get(industry_code) {
        limits.insert("IndustrySpecific".to_string(), *rate);
    }

    limits
}
