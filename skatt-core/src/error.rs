//! Error types shared by every calculator in the crate.
//!
//! Calculators fail fast with a [`TaxError`] before any computation step
//! runs. Input problems (negative amounts, amounts above the configured
//! maximum, an absent request) are the *invalid argument* class; the
//! configuration variants are only ever raised while building a
//! [`TaxEngine`](crate::service::TaxEngine).

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the tax computation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// No request was supplied.
    #[error("request is missing")]
    MissingRequest,

    /// A monetary input that must be non-negative was negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    /// An input exceeded the configured validation maximum.
    #[error("{field} {value} exceeds the configured maximum of {maximum}")]
    AboveMaximum {
        field: &'static str,
        value: Decimal,
        maximum: Decimal,
    },

    /// A required configuration section was not supplied at construction time.
    #[error("required configuration section '{0}' is missing")]
    ConfigurationMissing(&'static str),

    /// The supplied configuration violates one of its invariants.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

impl TaxError {
    /// Returns `true` for the input-validation class of errors.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::MissingRequest | Self::NegativeAmount { .. } | Self::AboveMaximum { .. }
        )
    }

    pub(crate) fn negative(
        field: &'static str,
        value: Decimal,
    ) -> Self {
        Self::NegativeAmount { field, value }
    }
}

/// Violations of the [`RateConfiguration`](crate::RateConfiguration) invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A percentage rate must lie in `[0, 100]`.
    #[error("{field} must be a percentage between 0 and 100, got {value}")]
    InvalidPercentage { field: &'static str, value: Decimal },

    /// A fraction must lie in `[0, 1]`.
    #[error("{field} must be a fraction between 0 and 1, got {value}")]
    InvalidFraction { field: &'static str, value: Decimal },

    /// Caps, thresholds and bounds must be non-negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeLimit { field: &'static str, value: Decimal },

    /// A bracket's lower bound exceeds its upper bound.
    #[error("{bracket} lower bound {lower} exceeds upper bound {upper}")]
    InvertedBracket {
        bracket: &'static str,
        lower: Decimal,
        upper: Decimal,
    },
}

/// Rejects negative amounts with [`TaxError::NegativeAmount`].
pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), TaxError> {
    if value < Decimal::ZERO {
        return Err(TaxError::negative(field, value));
    }
    Ok(())
}

/// Rejects amounts above `maximum` with [`TaxError::AboveMaximum`].
pub(crate) fn ensure_at_most(
    field: &'static str,
    value: Decimal,
    maximum: Decimal,
) -> Result<(), TaxError> {
    if value > maximum {
        return Err(TaxError::AboveMaximum {
            field,
            value,
            maximum,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn input_errors_are_invalid_arguments() {
        assert!(TaxError::MissingRequest.is_invalid_argument());
        assert!(TaxError::negative("income", dec!(-1)).is_invalid_argument());
        assert!(
            TaxError::AboveMaximum {
                field: "income",
                value: dec!(20000000),
                maximum: dec!(10000000),
            }
            .is_invalid_argument()
        );
    }

    #[test]
    fn ensure_at_most_accepts_the_maximum_itself() {
        assert_eq!(ensure_at_most("income", dec!(100), dec!(100)), Ok(()));
    }

    #[test]
    fn ensure_at_most_rejects_larger_values() {
        let result = ensure_at_most("income", dec!(100.01), dec!(100));

        assert_eq!(
            result,
            Err(TaxError::AboveMaximum {
                field: "income",
                value: dec!(100.01),
                maximum: dec!(100),
            })
        );
    }

    #[test]
    fn configuration_errors_are_not_invalid_arguments() {
        assert!(!TaxError::ConfigurationMissing("rate configuration").is_invalid_argument());
    }

    #[test]
    fn ensure_non_negative_accepts_zero() {
        assert_eq!(ensure_non_negative("income", dec!(0)), Ok(()));
    }

    #[test]
    fn ensure_non_negative_rejects_negative_values() {
        let result = ensure_non_negative("income", dec!(-0.01));

        assert_eq!(
            result,
            Err(TaxError::NegativeAmount {
                field: "income",
                value: dec!(-0.01),
            })
        );
    }

    #[test]
    fn error_messages_name_the_field() {
        let error = TaxError::negative("business income", dec!(-1000));

        assert_eq!(
            error.to_string(),
            "business income cannot be negative, got -1000"
        );
    }
}
