//! Command implementations for the `levy` binary.
//!
//! Every command takes the repository as `&dyn LevyRepository` and returns
//! the text to print, so the binary stays a thin shell around [`run`].

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Subcommand};
use levy_core::calculations::quote_trade;
use levy_core::db::RepositoryRegistry;
use levy_core::{
    CalculationFilter, CitizenProfile, Country, DEFAULT_USD_BDT_RATE, ExchangeRate, FiscalYear,
    InputCurrency, LevyRepository, NewCitizenProfile, NewTradeRecord, OfficerActivity,
    ProductCategory, ProgressiveTaxEngine, RepositoryError, ReviewWorkflow, SlabTable,
    TaxCalculation, TaxRequest, TaxResult, TradeRecord, TradeType, USD_BDT, resolve_slab_table,
};
use levy_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::csv_loader;
use crate::utils::{format_money, format_rate, parse_decimal};

/// Calculations shown under a citizen found by `lookup`.
const LOOKUP_HISTORY_LIMIT: u32 = 200;

/// Register every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Values that commands fall back to when a flag is omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub default_fiscal_year: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calculate income tax for one set of figures or a CSV batch
    Tax(TaxArgs),

    /// Calculate import or export duty
    Trade(TradeArgs),

    /// Show the slab table for a fiscal year
    Slabs {
        #[arg(long)]
        fiscal_year: Option<String>,
    },

    /// List saved calculations, newest first, or delete one
    History(HistoryArgs),

    /// Officer review queue
    #[command(subcommand)]
    Request(RequestCommand),

    /// Citizen registry
    #[command(subcommand)]
    Citizen(CitizenCommand),

    /// Find a registered citizen by TIN and show their history
    Lookup {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tin: String,
    },

    /// List saved trade duty quotes
    Trades {
        #[arg(long)]
        user: Option<String>,
    },

    /// Show or change the USD to BDT exchange rate
    #[command(subcommand)]
    Rates(RatesCommand),

    /// List configured fiscal years
    Years,

    /// List countries and their duty rates
    Countries,

    /// List product categories and their duty rates
    Categories,

    /// Show the officer activity log
    Audit {
        #[arg(long)]
        officer: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[derive(Debug, Args)]
pub struct TaxArgs {
    /// Total income in BDT
    #[arg(long, value_parser = parse_decimal, required_unless_present = "file")]
    pub income: Option<Decimal>,

    /// Total allowable expense in BDT
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub expense: Decimal,

    #[arg(long)]
    pub fiscal_year: Option<String>,

    /// CSV of `total_income,total_expense[,fiscal_year]` rows
    #[arg(long, conflicts_with = "income")]
    pub file: Option<PathBuf>,

    /// Save the result to this user's history
    #[arg(long)]
    pub save: Option<String>,

    /// Save on the citizen's behalf as this officer (requires --save)
    #[arg(long, requires = "save")]
    pub officer: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TradeArgs {
    /// import or export
    #[arg(long = "type", value_parser = parse_trade_type)]
    pub trade_type: TradeType,

    /// Country code, e.g. CN
    #[arg(long)]
    pub country: String,

    /// Product category name
    #[arg(long)]
    pub category: String,

    #[arg(long, value_parser = parse_decimal)]
    pub amount: Decimal,

    /// BDT or USD
    #[arg(long, value_parser = parse_currency, default_value = "BDT")]
    pub currency: InputCurrency,

    #[arg(long, default_value = "")]
    pub product: String,

    /// Save the quote to this user's trade records
    #[arg(long)]
    pub save: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only this user's calculations
    #[arg(long)]
    pub user: Option<String>,

    /// Saved on or after this day (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Saved on or before this day (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long, value_parser = parse_decimal)]
    pub min_tax: Option<Decimal>,

    #[arg(long, value_parser = parse_decimal)]
    pub max_tax: Option<Decimal>,

    #[arg(long)]
    pub limit: Option<u32>,

    /// Skip this many matches
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Delete this calculation instead of listing
    #[arg(
        long,
        conflicts_with_all = ["user", "from", "to", "min_tax", "max_tax", "limit", "offset"]
    )]
    pub delete: Option<i64>,
}

impl HistoryArgs {
    /// The stored-calculation query these flags describe. `--to` covers the
    /// whole of its day.
    fn filter(&self) -> Result<CalculationFilter> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
        }
        if let (Some(min), Some(max)) = (self.min_tax, self.max_tax) {
            if min > max {
                bail!("--min-tax {min} is above --max-tax {max}");
            }
        }

        let to = match self.to {
            Some(day) => Some(end_of_day(day)?),
            None => None,
        };
        Ok(CalculationFilter {
            user_id: self.user.clone(),
            from: self.from.map(|day| day.and_time(NaiveTime::MIN).and_utc()),
            to,
            min_tax: self.min_tax,
            max_tax: self.max_tax,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn end_of_day(day: NaiveDate) -> Result<DateTime<Utc>> {
    day.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|moment| moment.and_utc())
        .with_context(|| format!("cannot take the end of {day}"))
}

#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Submit figures for officer review
    Submit {
        #[arg(long)]
        citizen: String,
        #[arg(long, value_parser = parse_decimal)]
        income: Decimal,
        #[arg(long, value_parser = parse_decimal, default_value = "0")]
        expense: Decimal,
        #[arg(long)]
        fiscal_year: Option<String>,
    },

    /// List submitted requests, newest first
    List {
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Approve a submitted request
    Approve {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        note: Option<String>,
    },

    /// Reject a submitted request
    Reject {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CitizenCommand {
    /// Register a citizen, or update the details of one already registered
    Register {
        /// User id their calculations are saved under
        #[arg(long)]
        id: String,
        #[arg(long)]
        tin: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RatesCommand {
    /// Print the stored USD to BDT rate
    Show,

    /// Store a new USD to BDT rate
    SetUsd {
        /// Taka per dollar
        #[arg(value_parser = parse_decimal)]
        rate: Decimal,
    },
}

fn parse_trade_type(s: &str) -> Result<TradeType, String> {
    TradeType::parse(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected 'import' or 'export', got '{s}'"))
}

fn parse_currency(s: &str) -> Result<InputCurrency, String> {
    InputCurrency::parse(s).ok_or_else(|| format!("expected 'BDT' or 'USD', got '{s}'"))
}

/// The `--fiscal-year` value, or the configured default, as a checked
/// `YYYY-YYYY` label.
fn fiscal_year_or_default(
    given: Option<String>,
    settings: &Settings,
) -> Result<String> {
    let label = given.unwrap_or_else(|| settings.default_fiscal_year.clone());
    match FiscalYear::from_label(&label) {
        Some(year) => Ok(year.label),
        None => bail!("invalid fiscal year '{label}': expected YYYY-YYYY, e.g. 2026-2027"),
    }
}

/// Runs `command` and returns its output.
pub async fn run(
    repo: &dyn LevyRepository,
    settings: &Settings,
    command: Command,
) -> Result<String> {
    let engine = ProgressiveTaxEngine::default();

    match command {
        Command::Tax(args) => tax(repo, &engine, settings, args).await,
        Command::Trade(args) => trade(repo, args).await,
        Command::Slabs { fiscal_year } => {
            let fiscal_year = fiscal_year_or_default(fiscal_year, settings)?;
            slabs(repo, &engine, &fiscal_year).await
        }
        Command::History(args) => history(repo, args).await,
        Command::Request(command) => request(repo, &engine, settings, command).await,
        Command::Citizen(command) => citizen(repo, command).await,
        Command::Lookup { officer, tin } => lookup(repo, &engine, &officer, &tin).await,
        Command::Trades { user } => {
            let records = repo.list_trade_records(user.as_deref()).await?;
            Ok(render_trades(&records))
        }
        Command::Rates(command) => rates(repo, command).await,
        Command::Years => {
            let years = repo.list_fiscal_years().await?;
            Ok(render_years(&years, Utc::now().date_naive()))
        }
        Command::Countries => {
            let countries = repo.list_countries().await?;
            Ok(render_countries(&countries))
        }
        Command::Categories => {
            let categories = repo.list_product_categories().await?;
            Ok(render_categories(&categories))
        }
        Command::Audit { officer, limit } => {
            let activity = repo.list_activity(officer.as_deref(), Some(limit)).await?;
            Ok(render_activity(&activity))
        }
    }
}

/// Calculates with the slabs stored for `fiscal_year`, falling back to the
/// engine's default table.
async fn calculate(
    repo: &dyn LevyRepository,
    engine: &ProgressiveTaxEngine,
    income: Decimal,
    expense: Decimal,
    fiscal_year: &str,
) -> Result<TaxResult> {
    let table = resolve_slab_table(repo, fiscal_year)
        .await
        .with_context(|| format!("cannot load slabs for {fiscal_year}"))?;
    Ok(engine.calculate(income, expense, Some(fiscal_year), table.as_ref()))
}

async fn tax(
    repo: &dyn LevyRepository,
    engine: &ProgressiveTaxEngine,
    settings: &Settings,
    args: TaxArgs,
) -> Result<String> {
    let default_year = fiscal_year_or_default(args.fiscal_year.clone(), settings)?;

    let inputs: Vec<(Decimal, Decimal, String)> = match (&args.file, args.income) {
        (Some(path), _) => csv_loader::load_from_file(path)?
            .into_iter()
            .map(|input| {
                let year = input.fiscal_year.unwrap_or_else(|| default_year.clone());
                (input.total_income, input.total_expense, year)
            })
            .collect(),
        (None, Some(income)) => vec![(income, args.expense, default_year.clone())],
        (None, None) => bail!("either --income or --file is required"),
    };
    debug!(rows = inputs.len(), "calculating tax");

    let workflow = ReviewWorkflow::new(repo, engine);
    let mut results = Vec::with_capacity(inputs.len());
    for (income, expense, fiscal_year) in inputs {
        let result = calculate(repo, engine, income, expense, &fiscal_year).await?;
        match (&args.save, &args.officer) {
            (Some(citizen), Some(officer)) => {
                workflow.officer_calculation(officer, citizen, &result).await?;
            }
            (Some(user), None) => {
                workflow.save_history(user, &result).await?;
            }
            _ => {}
        }
        results.push(result);
    }

    if args.json {
        let json = match results.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            all => serde_json::to_string_pretty(all)?,
        };
        return Ok(json);
    }

    Ok(results
        .iter()
        .map(render_tax_result)
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn trade(
    repo: &dyn LevyRepository,
    args: TradeArgs,
) -> Result<String> {
    let code = args.country.trim().to_ascii_uppercase();
    let country = match repo.get_country_by_code(&code).await {
        Err(RepositoryError::NotFound) => bail!("unknown country code '{code}'"),
        other => other?,
    };
    let category = match repo.get_product_category(args.category.trim()).await {
        Err(RepositoryError::NotFound) => bail!("unknown product category '{}'", args.category),
        other => other?,
    };

    let usd_bdt = match args.currency {
        InputCurrency::Bdt => DEFAULT_USD_BDT_RATE,
        InputCurrency::Usd => match repo.get_exchange_rate(USD_BDT).await {
            Ok(rate) => rate.rate,
            Err(RepositoryError::NotFound) => {
                warn!(fallback = %DEFAULT_USD_BDT_RATE, "no USD_BDT rate stored; using fallback");
                DEFAULT_USD_BDT_RATE
            }
            Err(e) => return Err(e.into()),
        },
    };

    let quote = quote_trade(
        args.trade_type,
        &country,
        &category,
        args.currency,
        args.amount,
        usd_bdt,
    );

    if let Some(user) = &args.save {
        repo.create_trade_record(NewTradeRecord {
            user_id: user.clone(),
            trade_type: quote.trade_type,
            country: country.code.clone(),
            product_category: category.name.clone(),
            product_name: args.product.clone(),
            amount: quote.amount,
            calculated_tax: quote.result.calculated_tax,
            rate: quote.result.rate,
            country_rate: quote.country_rate,
            category_rate: quote.category_rate,
            input_currency: quote.input_currency,
            input_amount: quote.input_amount,
            exchange_rate: quote.exchange_rate,
        })
        .await?;
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} of {} from {}", quote.trade_type.as_str(), category.name, country.name);
    if let Some(rate) = quote.exchange_rate {
        let _ = writeln!(
            out,
            "Entered:         {} {} at {} BDT/USD",
            format_money(quote.input_amount),
            quote.input_currency.as_str(),
            rate
        );
    }
    let _ = writeln!(out, "Amount (BDT):    {}", format_money(quote.amount));
    let _ = writeln!(
        out,
        "Rate:            {}% country + {}% category = {}%",
        quote.country_rate.normalize(),
        quote.category_rate.normalize(),
        quote.result.rate.normalize()
    );
    let _ = write!(out, "Duty:            {}", format_money(quote.result.calculated_tax));
    Ok(out)
}

async fn slabs(
    repo: &dyn LevyRepository,
    engine: &ProgressiveTaxEngine,
    fiscal_year: &str,
) -> Result<String> {
    let stored = resolve_slab_table(repo, fiscal_year).await?;
    let (table, source) = match &stored {
        Some(table) => (table, "stored"),
        None => (engine.default_table(), "default"),
    };

    let mut out = format!("Slabs for {fiscal_year} ({source})\n");
    out.push_str(&render_slabs(table));
    Ok(out)
}

async fn history(
    repo: &dyn LevyRepository,
    args: HistoryArgs,
) -> Result<String> {
    if let Some(id) = args.delete {
        return match repo.delete_calculation(id).await {
            Ok(()) => {
                info!(id, "deleted calculation");
                Ok(format!("Deleted calculation {id}"))
            }
            Err(RepositoryError::NotFound) => bail!("no calculation with id {id}"),
            Err(e) => Err(e.into()),
        };
    }

    let filter = args.filter()?;
    debug!(?filter, "listing calculations");
    let calculations = repo.list_calculations(&filter).await?;
    Ok(render_history(&calculations))
}

async fn request(
    repo: &dyn LevyRepository,
    engine: &ProgressiveTaxEngine,
    settings: &Settings,
    command: RequestCommand,
) -> Result<String> {
    let workflow = ReviewWorkflow::new(repo, engine);

    match command {
        RequestCommand::Submit {
            citizen,
            income,
            expense,
            fiscal_year,
        } => {
            let fiscal_year = fiscal_year_or_default(fiscal_year, settings)?;
            let result = calculate(repo, engine, income, expense, &fiscal_year).await?;
            let request = workflow.submit_request(&citizen, &result).await?;
            Ok(format!(
                "Submitted request {} for {}: tax {}",
                request.id,
                request.citizen_id,
                format_money(request.calculated_tax)
            ))
        }
        RequestCommand::List { limit } => {
            let requests = workflow.pending_requests(limit).await?;
            Ok(render_requests(&requests))
        }
        RequestCommand::Approve { officer, id, note } => {
            let approval = workflow
                .approve_request(&officer, id, note.as_deref())
                .await?;
            Ok(format!(
                "Approved request {}; calculation {} filed for {} with tax {}",
                approval.request.id,
                approval.calculation.id,
                approval.calculation.user_id,
                format_money(approval.calculation.calculated_tax)
            ))
        }
        RequestCommand::Reject { officer, id, note } => {
            let request = workflow.reject_request(&officer, id, note.as_deref()).await?;
            Ok(format!("Rejected request {}", request.id))
        }
    }
}

async fn citizen(
    repo: &dyn LevyRepository,
    command: CitizenCommand,
) -> Result<String> {
    match command {
        CitizenCommand::Register {
            id,
            tin,
            location,
            email,
            phone,
        } => {
            let profile = NewCitizenProfile {
                id,
                tin_number: tin,
                email,
                location,
                phone,
            }
            .validated()?;
            let saved = repo.upsert_profile(&profile).await?;
            info!(citizen_id = %saved.id, "registered citizen");
            Ok(format!("Registered citizen {} with TIN {}", saved.id, saved.tin_number))
        }
    }
}

async fn lookup(
    repo: &dyn LevyRepository,
    engine: &ProgressiveTaxEngine,
    officer: &str,
    tin: &str,
) -> Result<String> {
    let workflow = ReviewWorkflow::new(repo, engine);
    let Some(profile) = workflow.search_by_tin(officer, tin).await? else {
        return Ok(format!("No citizen found for TIN {}", tin.trim()));
    };

    let filter = CalculationFilter::for_user(&profile.id).with_limit(LOOKUP_HISTORY_LIMIT);
    let calculations = repo.list_calculations(&filter).await?;
    Ok(format!(
        "{}\n{}",
        render_profile(&profile),
        render_history(&calculations)
    ))
}

async fn rates(
    repo: &dyn LevyRepository,
    command: RatesCommand,
) -> Result<String> {
    match command {
        RatesCommand::Show => match repo.get_exchange_rate(USD_BDT).await {
            Ok(rate) => Ok(format!("{USD_BDT}: {} BDT per USD", rate.rate.normalize())),
            Err(RepositoryError::NotFound) => Ok(format!(
                "{USD_BDT}: not set, trades use {DEFAULT_USD_BDT_RATE}"
            )),
            Err(e) => Err(e.into()),
        },
        RatesCommand::SetUsd { rate } => {
            if rate <= Decimal::ZERO {
                bail!("exchange rate must be positive, got {rate}");
            }
            repo.set_exchange_rate(&ExchangeRate {
                code: USD_BDT.to_string(),
                rate,
            })
            .await?;
            info!(%rate, "updated USD_BDT rate");
            Ok(format!("{USD_BDT} set to {}", rate.normalize()))
        }
    }
}

fn slab_range(
    from: Decimal,
    to: Option<Decimal>,
) -> String {
    match to {
        Some(to) => format!("{} - {}", format_money(from), format_money(to)),
        None => format!("{} and above", format_money(from)),
    }
}

fn render_slabs(table: &SlabTable) -> String {
    let mut out = String::new();
    for slab in table {
        let _ = writeln!(out, "  {:<34} {:>6}", slab_range(slab.from, slab.to), format_rate(slab.rate));
    }
    out
}

pub fn render_tax_result(result: &TaxResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fiscal year:     {}", result.fiscal_year);
    let _ = writeln!(out, "Total income:    {}", format_money(result.total_income));
    let _ = writeln!(out, "Total expense:   {}", format_money(result.total_expense));
    let _ = writeln!(out, "Taxable income:  {}", format_money(result.taxable_income));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {:<34} {:>6} {:>16} {:>14}",
        "Slab", "Rate", "Amount in slab", "Tax"
    );
    for line in &result.breakdown {
        let _ = writeln!(
            out,
            "  {:<34} {:>6} {:>16} {:>14}",
            slab_range(line.from, line.to),
            format_rate(line.rate),
            format_money(line.amount_in_slab),
            format_money(line.tax_for_slab)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Calculated tax:  {}", format_money(result.calculated_tax));
    out
}

fn render_history(calculations: &[TaxCalculation]) -> String {
    if calculations.is_empty() {
        return "No calculations.".to_string();
    }
    let mut out = String::new();
    for calc in calculations {
        let _ = write!(
            out,
            "#{:<5} {} {:<12} {:<10} taxable {:>16} tax {:>14}",
            calc.id,
            calc.created_at.format("%Y-%m-%d %H:%M"),
            calc.user_id,
            calc.fiscal_year,
            format_money(calc.taxable_income),
            format_money(calc.calculated_tax)
        );
        if let Some(officer) = &calc.officer_id {
            let _ = write!(out, " by {officer}");
        }
        if let Some(request_id) = calc.source_request_id {
            let _ = write!(out, " (request #{request_id})");
        }
        out.push('\n');
    }
    out
}

fn render_profile(profile: &CitizenProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Citizen:   {}", profile.id);
    let _ = writeln!(out, "TIN:       {}", profile.tin_number);
    let _ = writeln!(out, "Location:  {}", profile.location);
    if let Some(email) = &profile.email {
        let _ = writeln!(out, "Email:     {email}");
    }
    if let Some(phone) = &profile.phone {
        let _ = writeln!(out, "Phone:     {phone}");
    }
    out
}

fn render_requests(requests: &[TaxRequest]) -> String {
    if requests.is_empty() {
        return "No pending requests.".to_string();
    }
    let mut out = String::new();
    for request in requests {
        let _ = writeln!(
            out,
            "#{:<5} {} {:<12} {:<10} {:<9} tax {:>14}",
            request.id,
            request.created_at.format("%Y-%m-%d %H:%M"),
            request.citizen_id,
            request.fiscal_year,
            request.status,
            format_money(request.calculated_tax)
        );
    }
    out
}

fn render_trades(records: &[TradeRecord]) -> String {
    if records.is_empty() {
        return "No trade records.".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "#{:<5} {} {:<12} {:<6} {:<3} {:<14} amount {:>16} at {:>5}% duty {:>14}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.user_id,
            record.trade_type.as_str(),
            record.country,
            record.product_category,
            format_money(record.amount),
            record.rate.normalize(),
            format_money(record.calculated_tax)
        );
    }
    out
}

/// One line per year, starring the year `today` falls in.
fn render_years(
    years: &[FiscalYear],
    today: NaiveDate,
) -> String {
    if years.is_empty() {
        return "No fiscal years.".to_string();
    }
    let mut out = String::new();
    for year in years {
        let marker = if year.contains(today) { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {}  {} to {}",
            year.label, year.start_date, year.end_date
        );
    }
    out
}

fn render_countries(countries: &[Country]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<4} {:<20} {:>8} {:>8}", "Code", "Country", "Import", "Export");
    for country in countries {
        let _ = writeln!(
            out,
            "{:<4} {:<20} {:>7}% {:>7}%",
            country.code,
            country.name,
            country.import_rate.normalize(),
            country.export_rate.normalize()
        );
    }
    out
}

fn render_categories(categories: &[ProductCategory]) -> String {
    let mut out = String::new();
    for category in categories {
        let _ = writeln!(out, "{:<20} {:>7}%", category.name, category.base_rate.normalize());
    }
    out
}

fn render_activity(activity: &[OfficerActivity]) -> String {
    if activity.is_empty() {
        return "No activity.".to_string();
    }
    let mut out = String::new();
    for entry in activity {
        let _ = writeln!(
            out,
            "{} {:<12} {:<20} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.officer_id,
            entry.activity_type.as_str(),
            entry.description
        );
    }
    out
}
