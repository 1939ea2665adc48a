//! Personal income tax: employee social contribution plus municipal tax.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Social contribution on the income at the employee rate |
//! | 2    | Municipal rate from the table, or the standard rate |
//! | 3    | Municipal tax: income × rate / 100 |
//! | 4    | Total tax, net income and effective rate |
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//! use skatt_core::{RateConfiguration, TaxRequest};
//! use skatt_core::calculations::PersonalTaxCalculator;
//!
//! let config = RateConfiguration::norway_2024();
//! let request = TaxRequest::new(dec!(500000), "0301");
//!
//! let result = PersonalTaxCalculator::new(&config)
//!     .compute(&request, Utc::now())
//!     .unwrap();
//!
//! assert_eq!(result.total_tax, dec!(151000));
//! assert_eq!(result.net_income, dec!(349000));
//! assert_eq!(result.effective_rate, dec!(30.2));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::calculations::SocialContributionCalculator;
use crate::calculations::common::{apply_percent, percent_of};
use crate::error::{TaxError, ensure_at_most, ensure_non_negative};
use crate::models::{
    ContributionClass, MUNICIPAL_TAX, RateConfiguration, SOCIAL_CONTRIBUTION, TaxRequest,
    TaxResult,
};

pub const PERSONAL_TAX_COMPLETED: &str = "Personal tax computation completed";

#[derive(Debug, Clone, Copy)]
pub struct PersonalTaxCalculator<'a> {
    config: &'a RateConfiguration,
}

impl<'a> PersonalTaxCalculator<'a> {
    pub fn new(config: &'a RateConfiguration) -> Self {
        Self { config }
    }

    /// Computes personal tax for `request`.
    ///
    /// # Errors
    ///
    /// - [`TaxError::NegativeAmount`] if the income is negative.
    /// - [`TaxError::AboveMaximum`] if the income exceeds the configured maximum.
    pub fn compute(
        &self,
        request: &TaxRequest,
        computed_at: DateTime<Utc>,
    ) -> Result<TaxResult, TaxError> {
        self.validate(request)?;
        let income = request.income;

        let contribution = SocialContributionCalculator::new(&self.config.social_contribution)
            .compute(income, ContributionClass::Employee)?
            .amount;

        let municipal_rate = self.config.municipal.rate_for(&request.municipality);
        let municipal_tax = apply_percent(income, municipal_rate);

        let total_tax = contribution + municipal_tax;

        let mut breakdown = BTreeMap::new();
        breakdown.insert(SOCIAL_CONTRIBUTION.to_string(), contribution);
        breakdown.insert(MUNICIPAL_TAX.to_string(), municipal_tax);

        Ok(TaxResult {
            gross_income: income,
            net_income: income - total_tax,
            total_tax,
            effective_rate: percent_of(total_tax, income),
            breakdown,
            success: true,
            message: PERSONAL_TAX_COMPLETED.to_string(),
            computed_at,
        })
    }

    /// Input checks run before any computation step.
    ///
    /// # Errors
    ///
    /// Same as [`compute`](Self::compute).
    pub fn validate(
        &self,
        request: &TaxRequest,
    ) -> Result<(), TaxError> {
        ensure_non_negative("income", request.income)?;
        ensure_at_most("income", request.income, self.config.validation.max_income)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn oslo_resident_with_500k_income() {
        let config = RateConfiguration::norway_2024();
        let request = TaxRequest::new(dec!(500000), "0301");

        let result = PersonalTaxCalculator::new(&config)
            .compute(&request, at())
            .unwrap();

        assert_eq!(result.breakdown[SOCIAL_CONTRIBUTION], dec!(41000));
        assert_eq!(result.breakdown[MUNICIPAL_TAX], dec!(110000));
        assert_eq!(result.total_tax, dec!(151000));
        assert_eq!(result.net_income, dec!(349000));
        assert_eq!(result.effective_rate, dec!(30.2));
        assert!(result.success);
        assert_eq!(result.computed_at, at());
    }

    #[test]
    fn unknown_municipality_uses_standard_rate() {
        let mut config = RateConfiguration::norway_2024();
        config.municipal.standard_rate = dec!(20);
        let request = TaxRequest::new(dec!(100000), "9999");

        let result = PersonalTaxCalculator::new(&config)
            .compute(&request, at())
            .unwrap();

        assert_eq!(result.breakdown[MUNICIPAL_TAX], dec!(20000));
    }

    #[test]
    fn configured_municipality_rate_is_used() {
        let mut config = RateConfiguration::norway_2024();
        config.municipal.rates.insert("4601".to_string(), dec!(21.5));
        let request = TaxRequest::new(dec!(100000), "4601");

        let result = PersonalTaxCalculator::new(&config)
            .compute(&request, at())
            .unwrap();

        assert_eq!(result.breakdown[MUNICIPAL_TAX], dec!(21500));
    }

    #[test]
    fn zero_income_has_zero_effective_rate() {
        let config = RateConfiguration::norway_2024();
        let request = TaxRequest::new(dec!(0), "0301");

        let result = PersonalTaxCalculator::new(&config)
            .compute(&request, at())
            .unwrap();

        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
    }

    #[test]
    fn negative_income_is_rejected() {
        let config = RateConfiguration::norway_2024();
        let request = TaxRequest::new(dec!(-500), "0301");

        let result = PersonalTaxCalculator::new(&config).compute(&request, at());

        assert_eq!(
            result,
            Err(TaxError::NegativeAmount {
                field: "income",
                value: dec!(-500),
            })
        );
    }

    #[test]
    fn income_above_configured_maximum_is_rejected() {
        let config = RateConfiguration::norway_2024();
        let request = TaxRequest::new(dec!(10000000.01), "0301");

        let result = PersonalTaxCalculator::new(&config).compute(&request, at());

        assert!(result.unwrap_err().is_invalid_argument());
    }
}
