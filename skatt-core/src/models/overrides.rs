//! Caller-supplied overrides resolved against the built-in defaults.
//!
//! Every numeric override is taken only when it is present and greater than
//! zero; anything else falls back to the named default from
//! [`RateConfiguration::norway_2024`]. Resolution happens exactly once,
//! producing a plain [`RateConfiguration`] that calculators read directly.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{MunicipalRates, RateConfiguration, VatRounding};

/// Partial configuration, typically deserialized from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateOverrides {
    pub tax_year: Option<i32>,
    pub social_contribution: SocialContributionOverrides,
    pub vat: VatOverrides,
    pub standard_deduction: StandardDeductionOverrides,
    pub expense_caps: ExpenseCapOverrides,
    pub municipal: MunicipalOverrides,
    pub validation: ValidationOverrides,
    pub loss_carry_forward: Option<bool>,
    pub industry_rates: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialContributionOverrides {
    pub employee_rate: Option<Decimal>,
    pub self_employed_rate: Option<Decimal>,
    pub pensioner_rate: Option<Decimal>,
    pub lower_bound: Option<Decimal>,
    pub upper_bound: Option<Decimal>,
    pub stepped: Option<bool>,
    pub adjustment_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatOverrides {
    pub standard_rate: Option<Decimal>,
    pub reduced_rate: Option<Decimal>,
    pub food_rate: Option<Decimal>,
    pub rounding: Option<VatRounding>,
    pub decimals: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardDeductionOverrides {
    pub rate: Option<Decimal>,
    pub cap: Option<Decimal>,
    pub income_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseCapOverrides {
    pub home_office: Option<Decimal>,
    pub travel: Option<Decimal>,
    pub mileage_per_km: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MunicipalOverrides {
    pub standard_rate: Option<Decimal>,
    pub rates: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOverrides {
    pub max_income: Option<Decimal>,
    pub max_expense: Option<Decimal>,
}

impl RateOverrides {
    /// Resolves the overrides against the 2024 defaults.
    pub fn resolve(self) -> RateConfiguration {
        self.resolve_onto(RateConfiguration::norway_2024())
    }

    /// Resolves the overrides against an explicit base configuration.
    pub fn resolve_onto(
        self,
        base: RateConfiguration,
    ) -> RateConfiguration {
        let mut config = base;

        if let Some(year) = self.tax_year.filter(|year| *year > 0) {
            config.tax_year = year;
        }

        let sc = self.social_contribution;
        let target = &mut config.social_contribution;
        target.employee_rate = positive_or(sc.employee_rate, target.employee_rate);
        target.self_employed_rate = positive_or(sc.self_employed_rate, target.self_employed_rate);
        target.pensioner_rate = positive_or(sc.pensioner_rate, target.pensioner_rate);
        target.lower_bound = positive_or(sc.lower_bound, target.lower_bound);
        target.upper_bound = positive_or(sc.upper_bound, target.upper_bound);
        target.adjustment_factor = positive_or(sc.adjustment_factor, target.adjustment_factor);
        if let Some(stepped) = sc.stepped {
            target.stepped = stepped;
        }

        let vat = self.vat;
        config.vat.standard_rate = positive_or(vat.standard_rate, config.vat.standard_rate);
        config.vat.reduced_rate = positive_or(vat.reduced_rate, config.vat.reduced_rate);
        config.vat.food_rate = positive_or(vat.food_rate, config.vat.food_rate);
        if let Some(rounding) = vat.rounding {
            config.vat.rounding = rounding;
        }
        if let Some(decimals) = vat.decimals {
            config.vat.decimals = decimals;
        }

        let sd = self.standard_deduction;
        let target = &mut config.standard_deduction;
        target.rate = positive_or(sd.rate, target.rate);
        target.cap = positive_or(sd.cap, target.cap);
        target.income_threshold = positive_or(sd.income_threshold, target.income_threshold);

        let caps = self.expense_caps;
        let target = &mut config.expense_caps;
        target.home_office = positive_or(caps.home_office, target.home_office);
        target.travel = positive_or(caps.travel, target.travel);
        target.mileage_per_km = positive_or(caps.mileage_per_km, target.mileage_per_km);

        let municipal = self.municipal;
        let rate_override = municipal.standard_rate.filter(|rate| *rate > Decimal::ZERO);
        if !municipal.rates.is_empty() {
            config.municipal.rates = municipal.rates;
        } else if let Some(rate) = rate_override {
            config.municipal.rates = MunicipalRates::seeded(rate);
        }
        if let Some(rate) = rate_override {
            config.municipal.standard_rate = rate;
        }

        let bounds = self.validation;
        config.validation.max_income = positive_or(bounds.max_income, config.validation.max_income);
        config.validation.max_expense =
            positive_or(bounds.max_expense, config.validation.max_expense);

        if let Some(enabled) = self.loss_carry_forward {
            config.loss_carry_forward.enabled = enabled;
        }
        config.industry_rates.extend(self.industry_rates);

        config
    }
}

/// The override when it is present and positive, the default otherwise.
fn positive_or(
    value: Option<Decimal>,
    default: Decimal,
) -> Decimal {
    value.filter(|v| *v > Decimal::ZERO).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_overrides_resolve_to_defaults() {
        let config = RateOverrides::default().resolve();

        assert_eq!(config, RateConfiguration::norway_2024());
    }

    #[test]
    fn positive_override_replaces_default() {
        let overrides = RateOverrides {
            social_contribution: SocialContributionOverrides {
                self_employed_rate: Some(dec!(10.9)),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = overrides.resolve();

        assert_eq!(config.social_contribution.self_employed_rate, dec!(10.9));
        assert_eq!(config.social_contribution.employee_rate, dec!(8.2));
    }

    #[test]
    fn zero_or_negative_override_falls_back_to_default() {
        let overrides = RateOverrides {
            standard_deduction: StandardDeductionOverrides {
                rate: Some(dec!(0)),
                cap: Some(dec!(-5)),
                income_threshold: None,
            },
            ..Default::default()
        };

        let config = overrides.resolve();

        assert_eq!(config.standard_deduction.rate, dec!(0.43));
        assert_eq!(config.standard_deduction.cap, dec!(86000));
    }

    #[test]
    fn municipal_rates_replace_seeded_table() {
        let mut rates = BTreeMap::new();
        rates.insert("0301".to_string(), dec!(21.7));
        let overrides = RateOverrides {
            municipal: MunicipalOverrides {
                standard_rate: None,
                rates,
            },
            ..Default::default()
        };

        let config = overrides.resolve();

        assert_eq!(config.municipal.rates.len(), 1);
        assert_eq!(config.municipal.rate_for("0301"), dec!(21.7));
        assert_eq!(config.municipal.rate_for("4601"), dec!(22));
    }

    #[test]
    fn standard_rate_override_reseeds_default_table() {
        let overrides = RateOverrides {
            municipal: MunicipalOverrides {
                standard_rate: Some(dec!(23)),
                rates: BTreeMap::new(),
            },
            ..Default::default()
        };

        let config = overrides.resolve();

        assert_eq!(config.municipal.rate_for("5001"), dec!(23));
    }

    #[test]
    fn boolean_overrides_apply_even_when_false() {
        let overrides = RateOverrides {
            loss_carry_forward: Some(false),
            social_contribution: SocialContributionOverrides {
                stepped: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = overrides.resolve();

        assert!(!config.loss_carry_forward.enabled);
        assert!(!config.social_contribution.stepped);
    }

    #[test]
    fn missing_municipal_section_keeps_base_table() {
        let mut base = RateConfiguration::norway_2024();
        base.municipal.rates.insert("3201".to_string(), dec!(21.5));

        let config = RateOverrides::default().resolve_onto(base.clone());

        assert_eq!(config.municipal, base.municipal);
    }

    #[test]
    fn standard_rate_override_reseeds_custom_base_table() {
        let mut base = RateConfiguration::norway_2024();
        base.municipal.rates.insert("3201".to_string(), dec!(21.5));
        let overrides = RateOverrides {
            municipal: MunicipalOverrides {
                standard_rate: Some(dec!(21)),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = overrides.resolve_onto(base);

        assert_eq!(config.municipal.standard_rate, dec!(21));
        assert_eq!(config.municipal.rates, MunicipalRates::seeded(dec!(21)));
    }
}
