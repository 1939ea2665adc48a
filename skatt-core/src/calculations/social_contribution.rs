//! Social security contribution ("trygdeavgift").
//!
//! The contribution base is the income clamped into the configured band:
//!
//! | Income                        | Base          |
//! |-------------------------------|---------------|
//! | below `lower_bound`           | 0             |
//! | `lower_bound ..= upper_bound` | income        |
//! | above `upper_bound`           | `upper_bound` |
//!
//! The amount is `base × rate / 100`, where the rate depends on the
//! [`ContributionClass`] and is scaled by the configured adjustment factor.
//! With `stepped = false` the band is ignored and the full income is used.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use skatt_core::RateConfiguration;
//! use skatt_core::calculations::SocialContributionCalculator;
//! use skatt_core::models::ContributionClass;
//!
//! let config = RateConfiguration::norway_2024();
//! let calculator = SocialContributionCalculator::new(&config.social_contribution);
//!
//! let result = calculator.compute(dec!(500000), ContributionClass::Employee).unwrap();
//! assert_eq!(result.amount, dec!(41000.00));
//! ```

use rust_decimal::Decimal;
use tracing::warn;

use crate::calculations::common::apply_percent;
use crate::error::{TaxError, ensure_non_negative};
use crate::models::{ContributionClass, SocialContributionRates, SocialContributionResult};

/// Calculator for the bracket-clamped social contribution.
#[derive(Debug, Clone, Copy)]
pub struct SocialContributionCalculator<'a> {
    rates: &'a SocialContributionRates,
}

impl<'a> SocialContributionCalculator<'a> {
    pub fn new(rates: &'a SocialContributionRates) -> Self {
        Self { rates }
    }

    /// Computes the contribution on `income`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::NegativeAmount`] if `income` is negative.
    pub fn compute(
        &self,
        income: Decimal,
        class: ContributionClass,
    ) -> Result<SocialContributionResult, TaxError> {
        ensure_non_negative("income", income)?;

        let base = self.base(income);
        let rate = self.rate(class);
        let amount = apply_percent(base, rate);

        Ok(SocialContributionResult {
            income,
            base,
            rate,
            amount,
        })
    }

    /// Income clamped into the contribution band.
    pub fn base(
        &self,
        income: Decimal,
    ) -> Decimal {
        if !self.rates.stepped {
            return income;
        }

        if income < self.rates.lower_bound {
            warn!(
                income = %income,
                lower_bound = %self.rates.lower_bound,
                "income below contribution band; no contribution due"
            );
            return Decimal::ZERO;
        }

        income.min(self.rates.upper_bound)
    }

    /// Rate in percent for `class`, after the adjustment factor.
    pub fn rate(
        &self,
        class: ContributionClass,
    ) -> Decimal {
        let statutory = match class {
            ContributionClass::Employee => self.rates.employee_rate,
            ContributionClass::SelfEmployed => self.rates.self_employed_rate,
            ContributionClass::Pensioner => self.rates.pensioner_rate,
        };
        statutory * self.rates.adjustment_factor
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex, MutexGuard};

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::RateConfiguration;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    struct CapturedWriter<'a>(MutexGuard<'a, Vec<u8>>);

    impl Write for CapturedWriter<'_> {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = CapturedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            CapturedWriter(self.0.lock().unwrap())
        }
    }

    impl Captured {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn rates() -> SocialContributionRates {
        RateConfiguration::norway_2024().social_contribution
    }

    #[test]
    fn employee_contribution_inside_band() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(500000), ContributionClass::Employee)
            .unwrap();

        assert_eq!(result.base, dec!(500000));
        assert_eq!(result.rate, dec!(8.2));
        assert_eq!(result.amount, dec!(41000));
    }

    #[test]
    fn self_employed_contribution_uses_higher_rate() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(314000), ContributionClass::SelfEmployed)
            .unwrap();

        assert_eq!(result.amount, dec!(35796));
    }

    #[test]
    fn pensioner_contribution_uses_pension_rate() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(100000), ContributionClass::Pensioner)
            .unwrap();

        assert_eq!(result.amount, dec!(5100));
    }

    #[test]
    fn income_below_lower_bound_pays_nothing() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(69899.99), ContributionClass::Employee)
            .unwrap();

        assert_eq!(result.base, dec!(0));
        assert_eq!(result.amount, dec!(0));
    }

    #[test]
    fn income_below_lower_bound_logs_a_warning() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(captured.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let rates = rates();

        SocialContributionCalculator::new(&rates)
            .compute(dec!(50000), ContributionClass::Employee)
            .unwrap();

        let output = captured.output();
        assert!(output.contains("WARN"), "output was: {output}");
        assert!(output.contains("income below contribution band"));
    }

    #[test]
    fn income_at_lower_bound_is_inside_band() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(69900), ContributionClass::Employee)
            .unwrap();

        assert_eq!(result.amount, dec!(5731.80));
    }

    #[test]
    fn income_above_upper_bound_is_capped() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let just_above = calculator
            .compute(dec!(750001), ContributionClass::Employee)
            .unwrap();
        let far_above = calculator
            .compute(dec!(5000000), ContributionClass::Employee)
            .unwrap();

        assert_eq!(just_above.amount, dec!(61500));
        assert_eq!(far_above.amount, dec!(61500));
    }

    #[test]
    fn contribution_is_non_decreasing_within_band() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let mut previous = Decimal::ZERO;
        for income in [dec!(0), dec!(69900), dec!(100000), dec!(400000), dec!(750000), dec!(900000)] {
            let amount = calculator
                .compute(income, ContributionClass::SelfEmployed)
                .unwrap()
                .amount;
            assert!(amount >= previous, "{amount} < {previous} at {income}");
            previous = amount;
        }
    }

    #[test]
    fn non_stepped_mode_ignores_band() {
        let rates = SocialContributionRates {
            stepped: false,
            ..rates()
        };
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(1000000), ContributionClass::Employee)
            .unwrap();

        assert_eq!(result.base, dec!(1000000));
        assert_eq!(result.amount, dec!(82000));
    }

    #[test]
    fn adjustment_factor_scales_rate() {
        let rates = SocialContributionRates {
            adjustment_factor: dec!(0.5),
            ..rates()
        };
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator
            .compute(dec!(100000), ContributionClass::Employee)
            .unwrap();

        assert_eq!(result.rate, dec!(4.1));
        assert_eq!(result.amount, dec!(4100));
    }

    #[test]
    fn negative_income_is_rejected() {
        let rates = rates();
        let calculator = SocialContributionCalculator::new(&rates);

        let result = calculator.compute(dec!(-1), ContributionClass::Employee);

        assert_eq!(
            result,
            Err(TaxError::NegativeAmount {
                field: "income",
                value: dec!(-1),
            })
        );
    }
}
