//! Rate, threshold and cap configuration for Norwegian tax computations.
//!
//! A [`RateConfiguration`] is built once (usually from
//! [`RateConfiguration::norway_2024`] plus any
//! [`RateOverrides`](crate::RateOverrides)), validated, and then shared
//! read-only between computations. Percentages are stored as whole-number
//! percentages (`8.2` means 8.2 %); shares and factors are stored as
//! fractions (`0.43` means 43 %). Each field documents which form it uses.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::VatCategory;

/// The tax year the built-in defaults describe.
pub const DEFAULT_TAX_YEAR: i32 = 2024;

/// Complete set of rates, thresholds and caps used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfiguration {
    /// Tax year the values apply to.
    pub tax_year: i32,
    pub social_contribution: SocialContributionRates,
    pub vat: VatRates,
    pub standard_deduction: StandardDeductionRules,
    pub expense_caps: ExpenseCaps,
    pub income_bands: IncomeBands,
    pub salary_strategy: SalaryStrategy,
    pub validation: ValidationBounds,
    pub municipal: MunicipalRates,
    pub loss_carry_forward: LossCarryForward,
    /// Industry-specific deduction amounts keyed by industry code (e.g. `"IT"`).
    pub industry_rates: BTreeMap<String, Decimal>,
    pub heuristics: PlanningHeuristics,
}

/// Social security contribution ("trygdeavgift") rates and income band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialContributionRates {
    /// Employee rate in percent.
    pub employee_rate: Decimal,
    /// Self-employed rate in percent.
    pub self_employed_rate: Decimal,
    /// Pension income rate in percent.
    pub pensioner_rate: Decimal,
    /// Income below this amount carries no contribution.
    pub lower_bound: Decimal,
    /// Income above this amount is not subject to contribution.
    pub upper_bound: Decimal,
    /// When `false` the rate is applied to the full income, ignoring the band.
    pub stepped: bool,
    /// Multiplier applied to every rate (`1.0` = statutory rate).
    pub adjustment_factor: Decimal,
}

/// How VAT amounts are rounded to the configured number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VatRounding {
    /// Midpoint away from zero.
    #[default]
    Normal,
    Up,
    Down,
}

/// VAT ("MVA") rates in percent per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRates {
    pub standard_rate: Decimal,
    pub reduced_rate: Decimal,
    pub food_rate: Decimal,
    pub fish_rate: Decimal,
    pub passenger_transport_rate: Decimal,
    pub accommodation_rate: Decimal,
    pub low_rate: Decimal,
    pub rounding: VatRounding,
    /// Decimal places kept on VAT amounts.
    pub decimals: u32,
}

impl VatRates {
    /// Resolves the rate used for `category`.
    pub fn rate_for(
        &self,
        category: VatCategory,
    ) -> Decimal {
        match category {
            VatCategory::Standard => self.standard_rate,
            VatCategory::Reduced => self.reduced_rate,
            VatCategory::Food => self.food_rate,
            VatCategory::Fish => self.fish_rate,
            VatCategory::PassengerTransport => self.passenger_transport_rate,
            VatCategory::Accommodation => self.accommodation_rate,
            VatCategory::Low => self.low_rate,
        }
    }
}

/// Sliding-scale standard deduction ("minifradrag") for sole proprietorships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardDeductionRules {
    /// Share of business income deducted, as a fraction.
    pub rate: Decimal,
    /// Maximum deduction.
    pub cap: Decimal,
    /// Above this business income the flat cap applies.
    pub income_threshold: Decimal,
}

/// Per-category expense caps and advisory thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCaps {
    pub home_office: Decimal,
    /// Advisory threshold; travel has no hard cap.
    pub travel: Decimal,
    pub courses: Decimal,
    pub supplies: Decimal,
    pub subscriptions: Decimal,
    pub representation: Decimal,
    pub gifts_per_employee: Decimal,
    /// Deductible amount per business kilometre driven.
    pub mileage_per_km: Decimal,
    /// Above this many kilometres extra documentation is expected.
    pub mileage_documentation_km: u32,
}

/// Income bands shared by the optimization and planning heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBands {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
    pub pensioner_threshold: Decimal,
    pub low_income_deduction_threshold: Decimal,
}

/// Parameters for the salary/dividend split heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryStrategy {
    /// Share of the business result paid as salary in the low band, as a fraction.
    pub low_income_salary_share: Decimal,
    pub medium_income_salary: Decimal,
    pub high_income_salary: Decimal,
    pub minimum_salary_for_benefits: Decimal,
    pub optimal_pension_salary: Decimal,
    pub corporate_conversion_threshold: Decimal,
    pub min_salary_share: Decimal,
    pub max_salary_share: Decimal,
}

/// Plausibility bounds for inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationBounds {
    pub min_income: Decimal,
    pub max_income: Decimal,
    pub max_expense: Decimal,
    pub max_kilometers: u32,
    pub max_employees: u32,
    pub min_age: u32,
    pub max_age: u32,
}

/// Municipal income tax rates in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalRates {
    /// Used for municipalities missing from `rates`.
    pub standard_rate: Decimal,
    /// Keyed by four-digit municipality code.
    pub rates: BTreeMap<String, Decimal>,
}

impl MunicipalRates {
    /// Rate for `municipality`, falling back to the standard rate.
    pub fn rate_for(
        &self,
        municipality: &str,
    ) -> Decimal {
        self.rates
            .get(municipality)
            .copied()
            .unwrap_or(self.standard_rate)
    }

    /// The table every configuration starts from: the five largest
    /// municipalities at the standard rate.
    pub fn seeded(standard_rate: Decimal) -> BTreeMap<String, Decimal> {
        ["0301", "4601", "5001", "1101", "5401"]
            .into_iter()
            .map(|code| (code.to_string(), standard_rate))
            .collect()
    }
}

/// Rules for offsetting prior-year losses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossCarryForward {
    pub enabled: bool,
    pub max_years: u32,
    /// Share of the loss that may be carried, as a fraction.
    pub share: Decimal,
}

/// Coarse constants behind the savings and prepayment estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningHeuristics {
    /// Assumed overall effective tax rate, as a fraction.
    pub baseline_effective_rate: Decimal,
    /// Assumed improvement from following a strategy, as a fraction.
    pub improvement_factor: Decimal,
    /// Share of the estimated tax collected as prepayment.
    pub prepayment_share: Decimal,
    /// Share of a prior-year loss that reduces the prepayment base.
    pub prior_loss_weight: Decimal,
}

impl RateConfiguration {
    /// Statutory values for the 2024 income year.
    pub fn norway_2024() -> Self {
        let standard_municipal_rate = Decimal::from(22);

        Self {
            tax_year: DEFAULT_TAX_YEAR,
            social_contribution: SocialContributionRates {
                employee_rate: Decimal::new(82, 1),
                self_employed_rate: Decimal::new(114, 1),
                pensioner_rate: Decimal::new(51, 1),
                lower_bound: Decimal::from(69_900),
                upper_bound: Decimal::from(750_000),
                stepped: true,
                adjustment_factor: Decimal::ONE,
            },
            vat: VatRates {
                standard_rate: Decimal::from(25),
                reduced_rate: Decimal::from(15),
                food_rate: Decimal::from(15),
                fish_rate: Decimal::from(15),
                passenger_transport_rate: Decimal::from(15),
                accommodation_rate: Decimal::from(15),
                low_rate: Decimal::from(12),
                rounding: VatRounding::Normal,
                decimals: 2,
            },
            standard_deduction: StandardDeductionRules {
                rate: Decimal::new(43, 2),
                cap: Decimal::from(86_000),
                income_threshold: Decimal::from(200_000),
            },
            expense_caps: ExpenseCaps {
                home_office: Decimal::from(5_000),
                travel: Decimal::from(50_000),
                courses: Decimal::from(30_000),
                supplies: Decimal::from(10_000),
                subscriptions: Decimal::from(15_000),
                representation: Decimal::from(20_000),
                gifts_per_employee: Decimal::from(5_000),
                mileage_per_km: Decimal::new(370, 2),
                mileage_documentation_km: 50_000,
            },
            income_bands: IncomeBands {
                low: Decimal::from(200_000),
                medium: Decimal::from(500_000),
                high: Decimal::from(1_000_000),
                pensioner_threshold: Decimal::from(200_000),
                low_income_deduction_threshold: Decimal::from(70_000),
            },
            salary_strategy: SalaryStrategy {
                low_income_salary_share: Decimal::new(6, 1),
                medium_income_salary: Decimal::from(200_000),
                high_income_salary: Decimal::from(300_000),
                minimum_salary_for_benefits: Decimal::from(69_900),
                optimal_pension_salary: Decimal::from(250_000),
                corporate_conversion_threshold: Decimal::from(750_000),
                min_salary_share: Decimal::new(25, 2),
                max_salary_share: Decimal::new(75, 2),
            },
            validation: ValidationBounds {
                min_income: Decimal::ZERO,
                max_income: Decimal::from(10_000_000),
                max_expense: Decimal::from(5_000_000),
                max_kilometers: 100_000,
                max_employees: 20,
                min_age: 0,
                max_age: 150,
            },
            municipal: MunicipalRates {
                standard_rate: standard_municipal_rate,
                rates: MunicipalRates::seeded(standard_municipal_rate),
            },
            loss_carry_forward: LossCarryForward {
                enabled: true,
                max_years: 5,
                share: Decimal::ONE,
            },
            industry_rates: BTreeMap::new(),
            heuristics: PlanningHeuristics {
                baseline_effective_rate: Decimal::new(30, 2),
                improvement_factor: Decimal::new(15, 2),
                prepayment_share: Decimal::new(50, 2),
                prior_loss_weight: Decimal::new(50, 2),
            },
        }
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: a percentage outside
    /// `[0, 100]`, a fraction outside `[0, 1]`, a negative cap or bound,
    /// or a bracket whose lower bound exceeds its upper bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sc = &self.social_contribution;
        percentage("social_contribution.employee_rate", sc.employee_rate)?;
        percentage("social_contribution.self_employed_rate", sc.self_employed_rate)?;
        percentage("social_contribution.pensioner_rate", sc.pensioner_rate)?;
        non_negative("social_contribution.adjustment_factor", sc.adjustment_factor)?;
        non_negative("social_contribution.lower_bound", sc.lower_bound)?;
        bracket("social_contribution", sc.lower_bound, sc.upper_bound)?;

        for category in VatCategory::ALL {
            percentage("vat rate", self.vat.rate_for(category))?;
        }

        let sd = &self.standard_deduction;
        fraction("standard_deduction.rate", sd.rate)?;
        non_negative("standard_deduction.cap", sd.cap)?;
        non_negative("standard_deduction.income_threshold", sd.income_threshold)?;

        let caps = &self.expense_caps;
        for (field, value) in [
            ("expense_caps.home_office", caps.home_office),
            ("expense_caps.travel", caps.travel),
            ("expense_caps.courses", caps.courses),
            ("expense_caps.supplies", caps.supplies),
            ("expense_caps.subscriptions", caps.subscriptions),
            ("expense_caps.representation", caps.representation),
            ("expense_caps.gifts_per_employee", caps.gifts_per_employee),
            ("expense_caps.mileage_per_km", caps.mileage_per_km),
        ] {
            non_negative(field, value)?;
        }

        let bands = &self.income_bands;
        non_negative("income_bands.low", bands.low)?;
        bracket("income_bands.low..medium", bands.low, bands.medium)?;
        bracket("income_bands.medium..high", bands.medium, bands.high)?;

        let strategy = &self.salary_strategy;
        fraction(
            "salary_strategy.low_income_salary_share",
            strategy.low_income_salary_share,
        )?;
        fraction("salary_strategy.min_salary_share", strategy.min_salary_share)?;
        fraction("salary_strategy.max_salary_share", strategy.max_salary_share)?;
        bracket(
            "salary_strategy shares",
            strategy.min_salary_share,
            strategy.max_salary_share,
        )?;
        non_negative(
            "salary_strategy.medium_income_salary",
            strategy.medium_income_salary,
        )?;
        non_negative(
            "salary_strategy.high_income_salary",
            strategy.high_income_salary,
        )?;

        let bounds = &self.validation;
        non_negative("validation.min_income", bounds.min_income)?;
        bracket("validation income", bounds.min_income, bounds.max_income)?;
        non_negative("validation.max_expense", bounds.max_expense)?;

        percentage("municipal.standard_rate", self.municipal.standard_rate)?;
        for rate in self.municipal.rates.values() {
            percentage("municipal rate", *rate)?;
        }

        fraction("loss_carry_forward.share", self.loss_carry_forward.share)?;

        let heuristics = &self.heuristics;
        fraction(
            "heuristics.baseline_effective_rate",
            heuristics.baseline_effective_rate,
        )?;
        fraction("heuristics.improvement_factor", heuristics.improvement_factor)?;
        fraction("heuristics.prepayment_share", heuristics.prepayment_share)?;
        fraction("heuristics.prior_loss_weight", heuristics.prior_loss_weight)?;

        Ok(())
    }
}

impl Default for RateConfiguration {
    fn default() -> Self {
        Self::norway_2024()
    }
}

fn percentage(
    field: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ConfigError::InvalidPercentage { field, value });
    }
    Ok(())
}

fn fraction(
    field: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::InvalidFraction { field, value });
    }
    Ok(())
}

fn non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value < Decimal::ZERO {
        return Err(ConfigError::NegativeLimit { field, value });
    }
    Ok(())
}

fn bracket(
    bracket: &'static str,
    lower: Decimal,
    upper: Decimal,
) -> Result<(), ConfigError> {
    if lower > upper {
        return Err(ConfigError::InvertedBracket {
            bracket,
            lower,
            upper,
        });
    }
    Ok(())
}
