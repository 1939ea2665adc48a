//! VAT ("MVA") gross/net conversion.
//!
//! Exactly one amount is rounded per conversion; the other is derived by
//! subtraction or addition so that `gross == net + vat` always holds.
//!
//! - **Amount includes VAT**: `net = round(gross / (1 + rate / 100))`,
//!   `vat = gross - net`.
//! - **Amount excludes VAT**: `vat = round(net × rate / 100)`,
//!   `gross = net + vat`.
//!
//! With [`VatRounding::Normal`] converting net→gross→net reproduces the
//! original net amount for any amount already expressed in whole øre.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{TaxError, ensure_non_negative};
use crate::models::{VatCategory, VatRates, VatResult, VatRounding};

#[derive(Debug, Clone, Copy)]
pub struct VatCalculator<'a> {
    rates: &'a VatRates,
}

impl<'a> VatCalculator<'a> {
    pub fn new(rates: &'a VatRates) -> Self {
        Self { rates }
    }

    /// Splits `amount` into net, VAT and gross for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::NegativeAmount`] if `amount` is negative.
    pub fn compute(
        &self,
        amount: Decimal,
        category: VatCategory,
        includes_vat: bool,
    ) -> Result<VatResult, TaxError> {
        ensure_non_negative("amount", amount)?;

        let rate_used = self.rates.rate_for(category);
        let (net, vat, gross) = if includes_vat {
            let gross = amount;
            let net = self.round(gross / (Decimal::ONE + rate_used / Decimal::ONE_HUNDRED));
            (net, gross - net, gross)
        } else {
            let net = amount;
            let vat = self.round(net * rate_used / Decimal::ONE_HUNDRED);
            (net, vat, net + vat)
        };

        Ok(VatResult {
            net,
            vat,
            gross,
            rate_used,
            category,
        })
    }

    fn round(
        &self,
        value: Decimal,
    ) -> Decimal {
        let strategy = match self.rates.rounding {
            VatRounding::Normal => RoundingStrategy::MidpointAwayFromZero,
            VatRounding::Up => RoundingStrategy::AwayFromZero,
            VatRounding::Down => RoundingStrategy::ToZero,
        };
        value.round_dp_with_strategy(self.rates.decimals, strategy)
    }
}
