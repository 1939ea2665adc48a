use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// VAT category, selecting which configured rate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VatCategory {
    #[default]
    Standard,
    Reduced,
    Food,
    Fish,
    PassengerTransport,
    Accommodation,
    Low,
}

impl VatCategory {
    pub const ALL: [VatCategory; 7] = [
        Self::Standard,
        Self::Reduced,
        Self::Food,
        Self::Fish,
        Self::PassengerTransport,
        Self::Accommodation,
        Self::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Reduced => "reduced",
            Self::Food => "food",
            Self::Fish => "fish",
            Self::PassengerTransport => "passenger-transport",
            Self::Accommodation => "accommodation",
            Self::Low => "low",
        }
    }

    /// Unknown names resolve to [`VatCategory::Standard`].
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_default()
    }
}

/// Which social contribution rate applies to an income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContributionClass {
    #[default]
    Employee,
    SelfEmployed,
    Pensioner,
}

/// Legal form of a business. Carried on requests, not used in computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BusinessType {
    /// Sole proprietorship ("enkeltpersonforetak").
    #[default]
    Enk,
    /// Limited company ("aksjeselskap").
    As,
    /// General partnership ("ansvarlig selskap").
    Ans,
    Cooperative,
    Foundation,
    Other,
}

/// Typed extension parameters carried on a request.
///
/// None of these currently influence a computation; they are passed through
/// so callers can attach data without widening the request types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxExtension {
    /// Estimated private use of business assets.
    PrivateUse(Decimal),
    /// Member of the Church of Norway.
    ChurchMember(bool),
    /// Untyped key/value pair from callers that predate the typed variants.
    Opaque { key: String, value: String },
}

/// Input for a personal income tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxRequest {
    pub income: Decimal,
    /// Four-digit municipality code, e.g. `"0301"` for Oslo.
    pub municipality: String,
    pub age: u32,
    pub is_pensioner: bool,
    pub extensions: Vec<TaxExtension>,
}

impl TaxRequest {
    pub fn new(
        income: Decimal,
        municipality: impl Into<String>,
    ) -> Self {
        Self {
            income,
            municipality: municipality.into(),
            ..Default::default()
        }
    }
}

/// Input for a standalone social contribution computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SocialContributionRequest {
    pub income: Decimal,
    pub class: ContributionClass,
}

/// Input for a VAT conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VatRequest {
    pub amount: Decimal,
    pub category: VatCategory,
    /// `true` when `amount` is gross (VAT included).
    pub includes_vat: bool,
}

/// Input for a sole-proprietorship (ENK) computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnkRequest {
    /// Municipality, age and extensions of the owner. `person.income` is not
    /// used; the taxable income is derived from the business figures.
    pub person: TaxRequest,
    pub business_type: BusinessType,
    /// Gross business income before any deduction.
    pub business_income: Decimal,
    pub general_expenses: Decimal,
    pub payroll_costs: Decimal,
    pub depreciation: Decimal,
    /// Office costs, including home office.
    pub office_expenses: Decimal,
    pub travel_expenses: Decimal,
    pub equipment_expenses: Decimal,
    pub other_expenses: Decimal,
    /// Salary the owner has already drawn from the business.
    pub salary_withdrawn: Decimal,
    pub has_employees: bool,
    pub employee_count: u32,
    pub prior_year_loss: Decimal,
    pub is_first_year: bool,
    pub industry_code: Option<String>,
    pub business_kilometers: u32,
}

impl EnkRequest {
    /// Itemized expense fields paired with the name used in error messages.
    pub fn itemized_expenses(&self) -> [(&'static str, Decimal); 7] {
        [
            ("general expenses", self.general_expenses),
            ("payroll costs", self.payroll_costs),
            ("depreciation", self.depreciation),
            ("office expenses", self.office_expenses),
            ("travel expenses", self.travel_expenses),
            ("equipment expenses", self.equipment_expenses),
            ("other expenses", self.other_expenses),
        ]
    }

    /// Sum of all itemized expense fields.
    pub fn total_expenses(&self) -> Decimal {
        self.itemized_expenses()
            .iter()
            .map(|(_, amount)| *amount)
            .sum()
    }
}
