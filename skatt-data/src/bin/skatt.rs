use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use skatt_core::calculations::common::format_nok;
use skatt_core::service::{EnkComputationEvent, ExpenseValidationEvent, PersonalTaxEvent};
use skatt_core::{
    ComputationObserver, ContributionClass, DEFAULT_TAX_YEAR, EnkRequest, EnkResult,
    EnkTaxService, PersonalTaxService, SocialContributionRequest, TaxEngine, TaxRequest,
    VatCategory, VatRequest,
};
use skatt_data::load_configuration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Norwegian personal and sole-proprietorship (ENK) tax calculator.
#[derive(Debug, Parser)]
#[command(name = "skatt", version, about, long_about = None)]
struct Cli {
    /// TOML file with rate overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV file with municipal tax rates (`municipality_code,name,rate`).
    #[arg(long, global = true)]
    municipal_rates: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Personal income tax: social contribution plus municipal tax.
    Personal {
        #[arg(long)]
        income: Decimal,
        #[arg(long, default_value = "0301")]
        municipality: String,
        #[arg(long, default_value_t = 0)]
        age: u32,
        #[arg(long)]
        pensioner: bool,
    },
    /// Social security contribution alone.
    Contribution {
        #[arg(long)]
        income: Decimal,
        #[arg(long, value_enum, default_value_t = ClassArg::Employee)]
        class: ClassArg,
    },
    /// VAT gross/net conversion.
    Vat {
        #[arg(long)]
        amount: Decimal,
        /// standard, reduced, food, fish, passenger-transport, accommodation or low.
        #[arg(long, default_value = "standard")]
        category: String,
        /// The amount already includes VAT.
        #[arg(long)]
        includes_vat: bool,
    },
    /// Full ENK computation with advice.
    Enk(EnkArgs),
    /// Salary/dividend split for an ENK.
    Optimize(EnkArgs),
    /// Validate ENK expenses against the configured caps.
    ValidateExpenses(EnkArgs),
    /// Maximum deduction limits.
    Limits {
        #[arg(long, default_value = "")]
        industry: String,
        #[arg(long, default_value_t = DEFAULT_TAX_YEAR)]
        year: i32,
    },
    /// Tax planning strategy for an ENK.
    Plan(EnkArgs),
    /// Estimated tax prepayment for an ENK.
    Prepayment(EnkArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClassArg {
    Employee,
    SelfEmployed,
    Pensioner,
}

impl From<ClassArg> for ContributionClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Employee => Self::Employee,
            ClassArg::SelfEmployed => Self::SelfEmployed,
            ClassArg::Pensioner => Self::Pensioner,
        }
    }
}

#[derive(Debug, Args)]
struct EnkArgs {
    /// Gross business income.
    #[arg(long)]
    income: Decimal,
    #[arg(long, default_value = "0301")]
    municipality: String,
    #[arg(long, default_value = "0")]
    general_expenses: Decimal,
    #[arg(long, default_value = "0")]
    payroll_costs: Decimal,
    #[arg(long, default_value = "0")]
    depreciation: Decimal,
    #[arg(long, default_value = "0")]
    office_expenses: Decimal,
    #[arg(long, default_value = "0")]
    travel_expenses: Decimal,
    #[arg(long, default_value = "0")]
    equipment_expenses: Decimal,
    #[arg(long, default_value = "0")]
    other_expenses: Decimal,
    #[arg(long, default_value = "0")]
    salary_withdrawn: Decimal,
    #[arg(long, default_value_t = 0)]
    employees: u32,
    #[arg(long, default_value = "0")]
    prior_year_loss: Decimal,
    #[arg(long)]
    first_year: bool,
    #[arg(long)]
    industry: Option<String>,
    /// Business kilometres driven.
    #[arg(long, default_value_t = 0)]
    kilometers: u32,
}

impl From<EnkArgs> for EnkRequest {
    fn from(args: EnkArgs) -> Self {
        Self {
            person: TaxRequest::new(Decimal::ZERO, args.municipality),
            business_income: args.income,
            general_expenses: args.general_expenses,
            payroll_costs: args.payroll_costs,
            depreciation: args.depreciation,
            office_expenses: args.office_expenses,
            travel_expenses: args.travel_expenses,
            equipment_expenses: args.equipment_expenses,
            other_expenses: args.other_expenses,
            salary_withdrawn: args.salary_withdrawn,
            has_employees: args.employees > 0,
            employee_count: args.employees,
            prior_year_loss: args.prior_year_loss,
            is_first_year: args.first_year,
            industry_code: args.industry,
            business_kilometers: args.kilometers,
            ..Default::default()
        }
    }
}

// ─── observers ───────────────────────────────────────────────────────────────

/// Logs completed computations at info level.
struct LogObserver;

impl ComputationObserver for LogObserver {
    fn after_personal_tax(
        &self,
        event: &PersonalTaxEvent<'_>,
    ) -> anyhow::Result<()> {
        info!(
            municipality = %event.request.municipality,
            total_tax = %event.result.total_tax,
            "personal tax computed"
        );
        Ok(())
    }

    fn after_enk_computation(
        &self,
        event: &EnkComputationEvent<'_>,
    ) -> anyhow::Result<()> {
        info!(
            business_result = %event.result.business_result,
            total_tax = %event.result.tax.total_tax,
            "ENK computed"
        );
        Ok(())
    }

    fn expenses_validated(
        &self,
        event: &ExpenseValidationEvent<'_>,
    ) -> anyhow::Result<()> {
        info!(
            categories = event.category_count,
            flagged = event.flagged_count,
            "expenses validated"
        );
        Ok(())
    }
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ─── output ──────────────────────────────────────────────────────────────────

fn print_list(
    title: &str,
    items: &[String],
) {
    if items.is_empty() {
        return;
    }
    println!("{title}:");
    for item in items {
        println!("  - {item}");
    }
}

fn print_enk(result: &EnkResult) {
    println!("Total expenses:        {} NOK", format_nok(result.total_expenses));
    println!("Standard deduction:    {} NOK", format_nok(result.standard_deduction));
    if result.loss_carried_forward > Decimal::ZERO {
        println!("Prior loss offset:     {} NOK", format_nok(result.loss_carried_forward));
    }
    println!("Business result:       {} NOK", format_nok(result.business_result));
    println!("Self-employed contrib: {} NOK", format_nok(result.social_contribution));
    for (component, amount) in &result.tax.breakdown {
        println!("  {component}: {} NOK", format_nok(*amount));
    }
    println!("Total tax:             {} NOK", format_nok(result.tax.total_tax));
    println!("Net income:            {} NOK", format_nok(result.tax.net_income));
    println!("Effective rate:        {} %", result.tax.effective_rate);
    println!("Proposed salary:       {} NOK", format_nok(result.proposed_salary));
    println!("Proposed dividend:     {} NOK", format_nok(result.proposed_dividend));
    println!("Risk level:            {}", result.advice.risk_level);
    if !result.advice.recommended_timeframe.is_empty() {
        println!("Follow-up:             {}", result.advice.recommended_timeframe);
    }
    print_list("Recommended actions", &result.advice.recommended_actions);
    print_list("Potential deductions", &result.advice.potential_deductions);
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref(), cli.municipal_rates.as_deref())
        .context("Failed to load rate configuration")?;
    debug!(tax_year = config.tax_year, "configuration resolved");

    let engine = TaxEngine::builder()
        .config(config)
        .observer(Arc::new(LogObserver))
        .build()
        .context("Failed to build tax engine")?;

    match cli.command {
        Command::Personal {
            income,
            municipality,
            age,
            pensioner,
        } => {
            let request = TaxRequest {
                age,
                is_pensioner: pensioner,
                ..TaxRequest::new(income, municipality)
            };
            let result = engine
                .compute_personal_tax(&request)
                .await
                .context("Personal tax computation failed")?;

            println!("Gross income:   {} NOK", format_nok(result.gross_income));
            for (component, amount) in &result.breakdown {
                println!("  {component}: {} NOK", format_nok(*amount));
            }
            println!("Total tax:      {} NOK", format_nok(result.total_tax));
            println!("Net income:     {} NOK", format_nok(result.net_income));
            println!("Effective rate: {} %", result.effective_rate);
        }
        Command::Contribution { income, class } => {
            let result = engine
                .compute_social_contribution(&SocialContributionRequest {
                    income,
                    class: class.into(),
                })
                .await
                .context("Social contribution computation failed")?;

            println!("Base:   {} NOK", format_nok(result.base));
            println!("Rate:   {} %", result.rate);
            println!("Amount: {} NOK", result.amount);
        }
        Command::Vat {
            amount,
            category,
            includes_vat,
        } => {
            let result = engine
                .compute_vat(&VatRequest {
                    amount,
                    category: VatCategory::parse(&category),
                    includes_vat,
                })
                .await
                .context("VAT computation failed")?;

            println!("Category: {} ({} %)", result.category.as_str(), result.rate_used);
            println!("Net:      {}", result.net);
            println!("VAT:      {}", result.vat);
            println!("Gross:    {}", result.gross);
        }
        Command::Enk(args) => {
            let result = engine
                .compute_enk_tax(&args.into())
                .await
                .context("ENK computation failed")?;
            print_enk(&result);
        }
        Command::Optimize(args) => {
            let result = engine
                .optimize_salary(&args.into())
                .await
                .context("Salary optimization failed")?;

            println!("Business result:   {} NOK", format_nok(result.business_result));
            println!("Proposed salary:   {} NOK", format_nok(result.proposed_salary));
            println!("Proposed dividend: {} NOK", format_nok(result.proposed_dividend));
            println!("Risk level:        {}", result.advice.risk_level);
            print_list("Recommendations", &result.advice.recommended_actions);
        }
        Command::ValidateExpenses(args) => {
            let result = engine
                .validate_expenses(&args.into())
                .await
                .context("Expense validation failed")?;

            for category in &result.categories {
                let cap = category
                    .cap
                    .map(|cap| format!("{} NOK", format_nok(cap)))
                    .unwrap_or_else(|| "no cap".to_string());
                let flag = if category.is_flagged() { " !" } else { "" };
                println!(
                    "{:<12} {:>12} NOK  ({cap}){flag}",
                    category.category,
                    format_nok(category.amount)
                );
            }
            println!("Total: {} NOK", format_nok(result.total_expenses));
            println!("Valid: {}", if result.is_valid { "yes" } else { "no" });
            print_list("Warnings", &result.warnings);
            print_list("Errors", &result.errors);
            print_list("Recommendations", &result.recommendations);
        }
        Command::Limits { industry, year } => {
            let limits = engine.max_deduction_limits(&industry, year).await;
            for (category, amount) in &limits {
                println!("{category:<18} {amount}");
            }
        }
        Command::Plan(args) => {
            let plan = engine
                .propose_tax_planning_strategy(&args.into())
                .await
                .context("Tax planning failed")?;

            for strategy in &plan.strategies {
                let priority = plan
                    .priorities
                    .get(strategy)
                    .map(|priority| format!("{priority:?}"))
                    .unwrap_or_default();
                println!("[{priority:<6}] {strategy}");
            }
            println!("Timeframe:         {}", plan.timeframe);
            println!("Estimated savings: {} NOK", format_nok(plan.estimated_savings));
            println!("Risk:              {}", plan.risk);
        }
        Command::Prepayment(args) => {
            let amount = engine
                .estimate_prepayment_tax(&args.into())
                .await
                .context("Prepayment estimate failed")?;
            println!("Estimated prepayment: {} NOK", format_nok(amount));
        }
    }

    Ok(())
}
