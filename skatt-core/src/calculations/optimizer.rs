//! Salary/dividend split heuristic for a given business result.
//!
//! | Business result          | Proposed salary                     | Risk   |
//! |--------------------------|-------------------------------------|--------|
//! | `<= low`                 | result × `low_income_salary_share`  | Low*   |
//! | `low < r <= medium`      | `medium_income_salary`              | Medium |
//! | `> medium`               | `high_income_salary`                | High   |
//!
//! \* The risk rating is evaluated independently: exactly `low` already
//! rates Medium.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{format_nok, round_half_up};
use crate::models::{IncomeBands, RateConfiguration, RiskLevel, SalaryStrategy};

pub const CONSULT_ACCOUNTANT: &str =
    "Consult an accountant for advice tailored to your situation.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryProposal {
    pub proposed_salary: Decimal,
    pub proposed_dividend: Decimal,
    pub recommendations: Vec<String>,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy)]
pub struct SalaryDividendOptimizer<'a> {
    bands: &'a IncomeBands,
    strategy: &'a SalaryStrategy,
}

impl<'a> SalaryDividendOptimizer<'a> {
    pub fn new(config: &'a RateConfiguration) -> Self {
        Self {
            bands: &config.income_bands,
            strategy: &config.salary_strategy,
        }
    }

    pub fn optimize(
        &self,
        business_result: Decimal,
    ) -> SalaryProposal {
        let proposed_salary = self.proposed_salary(business_result);

        SalaryProposal {
            proposed_salary,
            proposed_dividend: (business_result - proposed_salary).max(Decimal::ZERO),
            recommendations: self.recommendations(business_result, proposed_salary),
            risk: risk_level(business_result, self.bands),
        }
    }

    fn proposed_salary(
        &self,
        business_result: Decimal,
    ) -> Decimal {
        let salary = if business_result <= self.bands.low {
            round_half_up(business_result * self.strategy.low_income_salary_share)
        } else if business_result <= self.bands.medium {
            self.strategy.medium_income_salary
        } else {
            self.strategy.high_income_salary
        };
        // a loss never yields a negative salary
        salary.max(Decimal::ZERO)
    }

    fn recommendations(
        &self,
        business_result: Decimal,
        proposed_salary: Decimal,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if business_result < self.bands.low / Decimal::TWO {
            recommendations.push(
                "Consider taking most of the profit as salary to benefit from the lower brackets."
                    .to_string(),
            );
        } else if business_result > self.bands.medium {
            recommendations.push(
                "Consider establishing a limited company (AS) for better tax optimization at high income."
                    .to_string(),
            );
            recommendations.push(
                "Maximize salary up to the social contribution ceiling to secure benefits."
                    .to_string(),
            );
        }

        let minimum = self.strategy.minimum_salary_for_benefits;
        if proposed_salary < minimum {
            recommendations.push(format!(
                "Raise salary to at least {} NOK to qualify for social security benefits.",
                format_nok(minimum)
            ));
        }

        recommendations.push(CONSULT_ACCOUNTANT.to_string());
        recommendations
    }
}

/// Three-level rating of a business result against the income bands.
pub fn risk_level(
    business_result: Decimal,
    bands: &IncomeBands,
) -> RiskLevel {
    if business_result < bands.low {
        RiskLevel::Low
    } else if business_result <= bands.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}
