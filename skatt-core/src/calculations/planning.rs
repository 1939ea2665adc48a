//! Planning strategy bundles and the prepayment estimate.
//!
//! Both are coarse heuristics driven by [`PlanningHeuristics`], not
//! recomputations of the full tax model.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::calculations::common::round_half_up;
use crate::models::{
    EnkRequest, IncomeBands, PlanningHeuristics, PlanningResult, Priority, RateConfiguration,
    RiskLevel,
};

const LOW_BAND_STRATEGIES: [&str; 3] = [
    "Document every expense to claim the maximum deduction",
    "Consider taking most of the profit as salary to use the personal allowance",
    "Plan tax prepayments based on expected income",
];

const MEDIUM_BAND_STRATEGIES: [&str; 3] = [
    "Consider equipment investments to increase depreciation",
    "Plan the salary/dividend split for tax optimization",
    "Consider pension savings for the self-employed",
];

const HIGH_BAND_STRATEGIES: [&str; 3] = [
    "Consider converting to a limited company (AS) for better tax planning",
    "Plan dividend payments to shareholders",
    "Consider investing in other businesses to diversify",
];

#[derive(Debug, Clone, Copy)]
pub struct TaxPlanningAdvisor<'a> {
    bands: &'a IncomeBands,
    heuristics: &'a PlanningHeuristics,
}

impl<'a> TaxPlanningAdvisor<'a> {
    pub fn new(config: &'a RateConfiguration) -> Self {
        Self {
            bands: &config.income_bands,
            heuristics: &config.heuristics,
        }
    }

    /// Selects a strategy bundle by the band of the gross business income.
    pub fn plan(
        &self,
        request: &EnkRequest,
    ) -> PlanningResult {
        let income = request.business_income;

        let (strategies, timeframe) = if income < self.bands.low {
            (LOW_BAND_STRATEGIES, "Quarterly follow-up")
        } else if income <= self.bands.medium {
            (MEDIUM_BAND_STRATEGIES, "Monthly follow-up")
        } else {
            (HIGH_BAND_STRATEGIES, "Continuous follow-up with a tax advisor")
        };

        let priorities = strategies
            .iter()
            .enumerate()
            .map(|(i, strategy)| {
                let priority = match i {
                    0 => Priority::High,
                    1 => Priority::Medium,
                    _ => Priority::Low,
                };
                (strategy.to_string(), priority)
            })
            .collect::<BTreeMap<_, _>>();

        PlanningResult {
            strategies: strategies.iter().map(|s| s.to_string()).collect(),
            timeframe: timeframe.to_string(),
            estimated_savings: self.estimated_savings(income),
            risk: RiskLevel::Medium,
            investment_requirement: Decimal::ZERO,
            payback_years: Decimal::ZERO,
            priorities,
        }
    }

    /// `income × baseline effective rate × improvement factor`.
    pub fn estimated_savings(
        &self,
        business_income: Decimal,
    ) -> Decimal {
        round_half_up(
            business_income
                * self.heuristics.baseline_effective_rate
                * self.heuristics.improvement_factor,
        )
    }

    /// Estimated tax prepayment.
    ///
    /// The business income is reduced by a weighted share of any prior-year
    /// loss (floored at zero), then taxed at the baseline rate, of which the
    /// prepayment share is due in advance.
    pub fn estimate_prepayment(
        &self,
        request: &EnkRequest,
    ) -> Decimal {
        let mut income = request.business_income;
        if request.prior_year_loss > Decimal::ZERO {
            income = (income - request.prior_year_loss * self.heuristics.prior_loss_weight)
                .max(Decimal::ZERO);
        }

        round_half_up(
            income * self.heuristics.baseline_effective_rate * self.heuristics.prepayment_share,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn request(income: Decimal) -> EnkRequest {
        EnkRequest {
            business_income: income,
            ..Default::default()
        }
    }

    // =========================================================================
    // Strategy selection tests
    // =========================================================================

    #[test]
    fn low_income_gets_quarterly_plan() {
        let config = RateConfiguration::norway_2024();

        let plan = TaxPlanningAdvisor::new(&config).plan(&request(dec!(150000)));

        assert_eq!(plan.strategies.len(), 3);
        assert_eq!(plan.strategies[0], LOW_BAND_STRATEGIES[0]);
        assert_eq!(plan.timeframe, "Quarterly follow-up");
        assert_eq!(plan.risk, RiskLevel::Medium);
    }

    #[test]
    fn income_at_low_band_is_medium_plan() {
        let config = RateConfiguration::norway_2024();

        let plan = TaxPlanningAdvisor::new(&config).plan(&request(dec!(200000)));

        assert_eq!(plan.timeframe, "Monthly follow-up");
    }

    #[test]
    fn high_income_gets_continuous_plan() {
        let config = RateConfiguration::norway_2024();

        let plan = TaxPlanningAdvisor::new(&config).plan(&request(dec!(500001)));

        assert_eq!(plan.strategies[0], HIGH_BAND_STRATEGIES[0]);
        assert_eq!(plan.timeframe, "Continuous follow-up with a tax advisor");
    }

    #[test]
    fn priorities_follow_strategy_order() {
        let config = RateConfiguration::norway_2024();

        let plan = TaxPlanningAdvisor::new(&config).plan(&request(dec!(300000)));

        assert_eq!(plan.priorities.len(), 3);
        assert_eq!(plan.priorities[MEDIUM_BAND_STRATEGIES[0]], Priority::High);
        assert_eq!(plan.priorities[MEDIUM_BAND_STRATEGIES[1]], Priority::Medium);
        assert_eq!(plan.priorities[MEDIUM_BAND_STRATEGIES[2]], Priority::Low);
    }

    #[test]
    fn estimated_savings_is_coarse_heuristic() {
        let config = RateConfiguration::norway_2024();

        let plan = TaxPlanningAdvisor::new(&config).plan(&request(dec!(500000)));

        // 500 000 × 0.30 × 0.15
        assert_eq!(plan.estimated_savings, dec!(22500));
    }

    // =========================================================================
    // Prepayment tests
    // =========================================================================

    #[test]
    fn prepayment_without_prior_loss() {
        let config = RateConfiguration::norway_2024();

        let amount = TaxPlanningAdvisor::new(&config).estimate_prepayment(&request(dec!(400000)));

        assert_eq!(amount, dec!(60000));
    }

    #[test]
    fn prepayment_reduced_by_half_of_prior_loss() {
        let config = RateConfiguration::norway_2024();
        let mut request = request(dec!(400000));
        request.prior_year_loss = dec!(100000);

        let amount = TaxPlanningAdvisor::new(&config).estimate_prepayment(&request);

        // (400 000 - 50 000) × 0.30 × 0.50
        assert_eq!(amount, dec!(52500));
    }

    #[test]
    fn prepayment_floors_income_at_zero() {
        let config = RateConfiguration::norway_2024();
        let mut request = request(dec!(10000));
        request.prior_year_loss = dec!(100000);

        let amount = TaxPlanningAdvisor::new(&config).estimate_prepayment(&request);

        assert_eq!(amount, dec!(0));
    }
}
