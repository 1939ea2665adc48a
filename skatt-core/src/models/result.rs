use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::VatCategory;

/// Breakdown key for the employee social contribution.
pub const SOCIAL_CONTRIBUTION: &str = "SocialContribution";
/// Breakdown key for the self-employed social contribution.
pub const SELF_EMPLOYED_CONTRIBUTION: &str = "SelfEmployedContribution";
/// Breakdown key for municipal income tax.
pub const MUNICIPAL_TAX: &str = "MunicipalTax";

/// Qualitative risk rating attached to advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Priority label for a planning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialContributionResult {
    pub income: Decimal,
    /// Income after clamping into the contribution band.
    pub base: Decimal,
    /// Effective rate in percent, after the adjustment factor.
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatResult {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
    /// Rate in percent.
    pub rate_used: Decimal,
    pub category: VatCategory,
}

/// Result of a personal income tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxResult {
    pub gross_income: Decimal,
    pub net_income: Decimal,
    pub total_tax: Decimal,
    /// Total tax as a percentage of gross income.
    pub effective_rate: Decimal,
    /// Amount per tax component, keyed by the constants in this module.
    pub breakdown: BTreeMap<String, Decimal>,
    pub success: bool,
    pub message: String,
    pub computed_at: DateTime<Utc>,
}

/// One validated expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub category: String,
    pub amount: Decimal,
    /// `None` means the category has no fixed cap.
    pub cap: Option<Decimal>,
    pub within_cap: bool,
    /// `None` when there is no cap to compare against.
    pub percent_of_cap: Option<Decimal>,
    pub warning: Option<String>,
}

impl ExpenseCategory {
    pub fn is_flagged(&self) -> bool {
        !self.within_cap || self.warning.is_some()
    }
}

/// Advice bundle attached to an ENK computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnkAdvice {
    pub recommended_actions: Vec<String>,
    pub potential_deductions: Vec<String>,
    pub estimated_optimal_salary: Decimal,
    pub risk_level: RiskLevel,
    pub estimated_savings: Decimal,
    pub recommended_timeframe: String,
}

/// Result of a sole-proprietorship computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnkResult {
    /// Totals over the taxable business income plus the owner's salary.
    pub tax: TaxResult,
    /// Profit after expenses, standard deduction and loss carry-forward.
    pub business_result: Decimal,
    pub total_expenses: Decimal,
    pub taxable_business_income: Decimal,
    pub social_contribution: Decimal,
    pub self_employed_tax: Decimal,
    pub proposed_salary: Decimal,
    pub proposed_dividend: Decimal,
    pub expense_breakdown: Vec<ExpenseCategory>,
    pub advice: EnkAdvice,
    pub standard_deduction: Decimal,
    /// Prior-year loss consumed this year.
    pub loss_carried_forward: Decimal,
}

/// Result of validating itemized expenses against their caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExpenseValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
    pub categories: Vec<ExpenseCategory>,
    pub total_expenses: Decimal,
    pub category_count: usize,
    pub flagged_count: usize,
}

/// Tax planning strategy bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningResult {
    pub strategies: Vec<String>,
    pub timeframe: String,
    pub estimated_savings: Decimal,
    pub risk: RiskLevel,
    pub investment_requirement: Decimal,
    /// Years until an investment pays for itself.
    pub payback_years: Decimal,
    pub priorities: BTreeMap<String, Priority>,
}
