use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use levy_core::{
    ActivityType, CalculationFilter, CitizenProfile, Country, ExchangeRate, FiscalYear,
    InputCurrency, LevyRepository, NewCitizenProfile, NewCountry, NewOfficerActivity,
    NewProductCategory, NewTaxCalculation, NewTaxRequest, NewTradeRecord, OfficerActivity,
    ProductCategory, RepositoryError, TaxCalculation, TaxRequest, TaxRequestStatus, TaxSlab,
    TradeRecord, TradeType,
};
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Executor, Row, Sqlite};

use crate::decimal::{decimal_to_f64, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite://levy.db`, `sqlite::memory:`) as well as
    /// bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;

            tracing::debug!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The error for a guarded status update that matched no row.
    async fn status_conflict(
        &self,
        id: i64,
    ) -> RepositoryError {
        match self.get_request(id).await {
            Ok(request) => RepositoryError::StatusConflict {
                id,
                current: request.status,
            },
            Err(e) => e,
        }
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn column<'r, T>(
    row: &'r SqliteRow,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", name, e)))
}

fn json_column<T: DeserializeOwned>(
    row: &SqliteRow,
    name: &str,
) -> Result<T, RepositoryError> {
    let raw: String = column(row, name)?;
    serde_json::from_str(&raw)
        .map_err(|e| RepositoryError::Database(format!("Invalid JSON in {}: {}", name, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Database(e.to_string()))
}

fn parse_column<T>(
    row: &SqliteRow,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, RepositoryError> {
    let raw: String = column(row, name)?;
    parse(&raw).ok_or_else(|| RepositoryError::Database(format!("Invalid {}: {}", name, raw)))
}

/// SQLite's `LIMIT -1` means no limit.
fn sql_limit(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

fn row_to_profile(row: &SqliteRow) -> Result<CitizenProfile, RepositoryError> {
    Ok(CitizenProfile {
        id: column(row, "id")?,
        tin_number: column(row, "tin_number")?,
        email: column(row, "email")?,
        location: column(row, "location")?,
        phone: column(row, "phone")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
    })
}

fn row_to_calculation(row: &SqliteRow) -> Result<TaxCalculation, RepositoryError> {
    Ok(TaxCalculation {
        id: column(row, "id")?,
        user_id: column(row, "user_id")?,
        officer_id: column(row, "officer_id")?,
        source_request_id: column(row, "source_request_id")?,
        fiscal_year: column(row, "fiscal_year")?,
        total_income: get_decimal(row, "total_income")?,
        total_expense: get_decimal(row, "total_expense")?,
        taxable_income: get_decimal(row, "taxable_income")?,
        calculated_tax: get_decimal(row, "calculated_tax")?,
        breakdown: json_column(row, "breakdown")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_request(row: &SqliteRow) -> Result<TaxRequest, RepositoryError> {
    Ok(TaxRequest {
        id: column(row, "id")?,
        citizen_id: column(row, "citizen_id")?,
        fiscal_year: column(row, "fiscal_year")?,
        total_income: get_decimal(row, "total_income")?,
        total_expense: get_decimal(row, "total_expense")?,
        taxable_income: get_decimal(row, "taxable_income")?,
        calculated_tax: get_decimal(row, "calculated_tax")?,
        breakdown: json_column(row, "breakdown")?,
        status: parse_column(row, "status", TaxRequestStatus::parse)?,
        officer_id: column(row, "officer_id")?,
        officer_note: column(row, "officer_note")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
    })
}

fn row_to_activity(row: &SqliteRow) -> Result<OfficerActivity, RepositoryError> {
    Ok(OfficerActivity {
        id: column(row, "id")?,
        officer_id: column(row, "officer_id")?,
        activity_type: parse_column(row, "activity_type", ActivityType::parse)?,
        target_user_id: column(row, "target_user_id")?,
        description: column(row, "description")?,
        metadata: json_column(row, "metadata")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_country(row: &SqliteRow) -> Result<Country, RepositoryError> {
    Ok(Country {
        id: column(row, "id")?,
        name: column(row, "name")?,
        code: column(row, "code")?,
        import_rate: get_decimal(row, "import_rate")?,
        export_rate: get_decimal(row, "export_rate")?,
    })
}

fn row_to_category(row: &SqliteRow) -> Result<ProductCategory, RepositoryError> {
    Ok(ProductCategory {
        id: column(row, "id")?,
        name: column(row, "name")?,
        base_rate: get_decimal(row, "base_rate")?,
    })
}

fn row_to_trade_record(row: &SqliteRow) -> Result<TradeRecord, RepositoryError> {
    Ok(TradeRecord {
        id: column(row, "id")?,
        user_id: column(row, "user_id")?,
        trade_type: parse_column(row, "trade_type", TradeType::parse)?,
        country: column(row, "country")?,
        product_category: column(row, "product_category")?,
        product_name: column(row, "product_name")?,
        amount: get_decimal(row, "amount")?,
        calculated_tax: get_decimal(row, "calculated_tax")?,
        rate: get_decimal(row, "rate")?,
        country_rate: get_decimal(row, "country_rate")?,
        category_rate: get_decimal(row, "category_rate")?,
        input_currency: parse_column(row, "input_currency", InputCurrency::parse)?,
        input_amount: get_decimal(row, "input_amount")?,
        exchange_rate: get_optional_decimal(row, "exchange_rate")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

const CALCULATION_COLUMNS: &str = "id, user_id, officer_id, source_request_id, fiscal_year,
    total_income, total_expense, taxable_income, calculated_tax, breakdown, created_at";

const REQUEST_COLUMNS: &str = "id, citizen_id, fiscal_year, total_income, total_expense,
    taxable_income, calculated_tax, breakdown, status, officer_id, officer_note,
    created_at, updated_at";

const TRADE_RECORD_COLUMNS: &str = "id, user_id, trade_type, country, product_category,
    product_name, amount, calculated_tax, rate, country_rate, category_rate,
    input_currency, input_amount, exchange_rate, created_at";

/// Inserts a calculation row, returning its id.
async fn insert_calculation<'e, E>(
    executor: E,
    calc: &NewTaxCalculation,
) -> Result<i64, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO tax_calculations (
            user_id, officer_id, source_request_id, fiscal_year,
            total_income, total_expense, taxable_income, calculated_tax,
            breakdown, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&calc.user_id)
    .bind(&calc.officer_id)
    .bind(calc.source_request_id)
    .bind(&calc.fiscal_year)
    .bind(decimal_to_f64(calc.total_income))
    .bind(decimal_to_f64(calc.total_expense))
    .bind(decimal_to_f64(calc.taxable_income))
    .bind(decimal_to_f64(calc.calculated_tax))
    .bind(to_json(&calc.breakdown)?)
    .bind(Utc::now())
    .execute(executor)
    .await
    .map_err(db_err)?;

    Ok(result.last_insert_rowid())
}

/// Sets a request's status and reviewer fields if it is still `from`,
/// returning whether a row changed.
async fn set_request_status<'e, E>(
    executor: E,
    id: i64,
    from: TaxRequestStatus,
    to: TaxRequestStatus,
    officer_id: Option<&str>,
    officer_note: Option<&str>,
) -> Result<bool, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE tax_requests SET
            status = ?, officer_id = ?, officer_note = ?, updated_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(officer_id)
    .bind(officer_note)
    .bind(Utc::now())
    .bind(id)
    .bind(from.as_str())
    .execute(executor)
    .await
    .map_err(db_err)?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl LevyRepository for SqliteRepository {
    async fn list_fiscal_years(&self) -> Result<Vec<FiscalYear>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT label, start_date, end_date FROM fiscal_years ORDER BY start_date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(FiscalYear {
                    label: column(row, "label")?,
                    start_date: column::<NaiveDate>(row, "start_date")?,
                    end_date: column::<NaiveDate>(row, "end_date")?,
                })
            })
            .collect()
    }

    async fn upsert_fiscal_year(
        &self,
        year: &FiscalYear,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO fiscal_years (label, start_date, end_date) VALUES (?, ?, ?)
             ON CONFLICT(label) DO UPDATE SET
                start_date = excluded.start_date, end_date = excluded.end_date",
        )
        .bind(&year.label)
        .bind(year.start_date)
        .bind(year.end_date)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_tax_slabs(
        &self,
        fiscal_year: &str,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT fiscal_year, lower_bound, upper_bound, rate
             FROM tax_slabs WHERE fiscal_year = ?
             ORDER BY lower_bound, id",
        )
        .bind(fiscal_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(TaxSlab {
                    fiscal_year: column(row, "fiscal_year")?,
                    lower_bound: get_decimal(row, "lower_bound")?,
                    upper_bound: get_optional_decimal(row, "upper_bound")?,
                    rate: get_decimal(row, "rate")?,
                })
            })
            .collect()
    }

    async fn replace_tax_slabs(
        &self,
        fiscal_year: &str,
        slabs: &[TaxSlab],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM tax_slabs WHERE fiscal_year = ?")
            .bind(fiscal_year)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for slab in slabs {
            sqlx::query(
                "INSERT INTO tax_slabs (fiscal_year, lower_bound, upper_bound, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(fiscal_year)
            .bind(decimal_to_f64(slab.lower_bound))
            .bind(slab.upper_bound.map(decimal_to_f64))
            .bind(decimal_to_f64(slab.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(fiscal_year, slabs = slabs.len(), "replaced tax slabs");
        Ok(())
    }

    async fn create_calculation(
        &self,
        calc: NewTaxCalculation,
    ) -> Result<TaxCalculation, RepositoryError> {
        let id = insert_calculation(&self.pool, &calc).await?;
        self.get_calculation(id).await
    }

    async fn get_calculation(
        &self,
        id: i64,
    ) -> Result<TaxCalculation, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM tax_calculations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_calculation(&row)
    }

    async fn list_calculations(
        &self,
        filter: &CalculationFilter,
    ) -> Result<Vec<TaxCalculation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM tax_calculations
             WHERE (?1 IS NULL OR user_id = ?1)
               AND (?2 IS NULL OR created_at >= ?2)
               AND (?3 IS NULL OR created_at <= ?3)
               AND (?4 IS NULL OR calculated_tax >= ?4)
               AND (?5 IS NULL OR calculated_tax <= ?5)
             ORDER BY created_at DESC, id DESC
             LIMIT ?6 OFFSET ?7"
        ))
        .bind(filter.user_id.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.min_tax.map(decimal_to_f64))
        .bind(filter.max_tax.map(decimal_to_f64))
        .bind(sql_limit(filter.limit))
        .bind(i64::from(filter.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_calculation).collect()
    }

    async fn delete_calculation(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tax_calculations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create_request(
        &self,
        request: NewTaxRequest,
    ) -> Result<TaxRequest, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tax_requests (
                citizen_id, fiscal_year, total_income, total_expense,
                taxable_income, calculated_tax, breakdown, status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.citizen_id)
        .bind(&request.fiscal_year)
        .bind(decimal_to_f64(request.total_income))
        .bind(decimal_to_f64(request.total_expense))
        .bind(decimal_to_f64(request.taxable_income))
        .bind(decimal_to_f64(request.calculated_tax))
        .bind(to_json(&request.breakdown)?)
        .bind(request.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_request(result.last_insert_rowid()).await
    }

    async fn get_request(
        &self,
        id: i64,
    ) -> Result<TaxRequest, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM tax_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_request(&row)
    }

    async fn list_requests(
        &self,
        status: Option<TaxRequestStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<TaxRequest>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM tax_requests
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_request).collect()
    }

    async fn update_request_status(
        &self,
        id: i64,
        from: TaxRequestStatus,
        to: TaxRequestStatus,
        officer_id: Option<&str>,
        officer_note: Option<&str>,
    ) -> Result<TaxRequest, RepositoryError> {
        if !set_request_status(&self.pool, id, from, to, officer_id, officer_note).await? {
            return Err(self.status_conflict(id).await);
        }

        self.get_request(id).await
    }

    async fn record_approval(
        &self,
        id: i64,
        officer_id: &str,
        officer_note: Option<&str>,
        calculation: NewTaxCalculation,
    ) -> Result<(TaxRequest, TaxCalculation), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let approved = set_request_status(
            &mut *tx,
            id,
            TaxRequestStatus::Submitted,
            TaxRequestStatus::Approved,
            Some(officer_id),
            officer_note,
        )
        .await?;
        if !approved {
            tx.rollback().await.map_err(db_err)?;
            return Err(self.status_conflict(id).await);
        }

        let calculation_id = insert_calculation(&mut *tx, &calculation).await?;
        tx.commit().await.map_err(db_err)?;

        Ok((
            self.get_request(id).await?,
            self.get_calculation(calculation_id).await?,
        ))
    }

    async fn log_activity(
        &self,
        activity: NewOfficerActivity,
    ) -> Result<OfficerActivity, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO officer_activity_logs (
                officer_id, activity_type, target_user_id, description, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&activity.officer_id)
        .bind(activity.activity_type.as_str())
        .bind(&activity.target_user_id)
        .bind(&activity.description)
        .bind(to_json(&activity.metadata)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let row = sqlx::query(
            "SELECT id, officer_id, activity_type, target_user_id, description, metadata, created_at
             FROM officer_activity_logs WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row_to_activity(&row)
    }

    async fn list_activity(
        &self,
        officer_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<OfficerActivity>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, officer_id, activity_type, target_user_id, description, metadata, created_at
             FROM officer_activity_logs
             WHERE (?1 IS NULL OR officer_id = ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )
        .bind(officer_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_activity).collect()
    }

    async fn upsert_profile(
        &self,
        profile: &NewCitizenProfile,
    ) -> Result<CitizenProfile, RepositoryError> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO profiles (id, tin_number, email, location, phone, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                tin_number = excluded.tin_number,
                email = excluded.email,
                location = excluded.location,
                phone = excluded.phone,
                updated_at = excluded.updated_at",
        )
        .bind(&profile.id)
        .bind(&profile.tin_number)
        .bind(&profile.email)
        .bind(&profile.location)
        .bind(&profile.phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.find_profile_by_tin(&profile.tin_number).await
    }

    async fn find_profile_by_tin(
        &self,
        tin: &str,
    ) -> Result<CitizenProfile, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tin_number, email, location, phone, created_at, updated_at
             FROM profiles WHERE tin_number = ?",
        )
        .bind(tin)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_profile(&row)
    }

    async fn list_countries(&self) -> Result<Vec<Country>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, code, import_rate, export_rate FROM countries ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_country).collect()
    }

    async fn get_country_by_code(
        &self,
        code: &str,
    ) -> Result<Country, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, code, import_rate, export_rate FROM countries WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_country(&row)
    }

    async fn upsert_country(
        &self,
        country: &NewCountry,
    ) -> Result<Country, RepositoryError> {
        sqlx::query(
            "INSERT INTO countries (name, code, import_rate, export_rate) VALUES (?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                import_rate = excluded.import_rate,
                export_rate = excluded.export_rate",
        )
        .bind(&country.name)
        .bind(&country.code)
        .bind(decimal_to_f64(country.import_rate))
        .bind(decimal_to_f64(country.export_rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_country_by_code(&country.code).await
    }

    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, base_rate FROM product_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_category).collect()
    }

    async fn get_product_category(
        &self,
        name: &str,
    ) -> Result<ProductCategory, RepositoryError> {
        let row = sqlx::query("SELECT id, name, base_rate FROM product_categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_category(&row)
    }

    async fn upsert_product_category(
        &self,
        category: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        sqlx::query(
            "INSERT INTO product_categories (name, base_rate) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET base_rate = excluded.base_rate",
        )
        .bind(&category.name)
        .bind(decimal_to_f64(category.base_rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_product_category(&category.name).await
    }

    async fn create_trade_record(
        &self,
        record: NewTradeRecord,
    ) -> Result<TradeRecord, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO trade_records (
                user_id, trade_type, country, product_category, product_name,
                amount, calculated_tax, rate, country_rate, category_rate,
                input_currency, input_amount, exchange_rate, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.user_id)
        .bind(record.trade_type.as_str())
        .bind(&record.country)
        .bind(&record.product_category)
        .bind(&record.product_name)
        .bind(decimal_to_f64(record.amount))
        .bind(decimal_to_f64(record.calculated_tax))
        .bind(decimal_to_f64(record.rate))
        .bind(decimal_to_f64(record.country_rate))
        .bind(decimal_to_f64(record.category_rate))
        .bind(record.input_currency.as_str())
        .bind(decimal_to_f64(record.input_amount))
        .bind(record.exchange_rate.map(decimal_to_f64))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {TRADE_RECORD_COLUMNS} FROM trade_records WHERE id = ?"
        ))
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row_to_trade_record(&row)
    }

    async fn list_trade_records(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<TradeRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRADE_RECORD_COLUMNS} FROM trade_records
             WHERE (?1 IS NULL OR user_id = ?1)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_trade_record).collect()
    }

    async fn get_exchange_rate(
        &self,
        code: &str,
    ) -> Result<ExchangeRate, RepositoryError> {
        let row = sqlx::query("SELECT code, rate FROM exchange_rates WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        Ok(ExchangeRate {
            code: column(&row, "code")?,
            rate: get_decimal(&row, "rate")?,
        })
    }

    async fn set_exchange_rate(
        &self,
        rate: &ExchangeRate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO exchange_rates (code, rate) VALUES (?, ?)
             ON CONFLICT(code) DO UPDATE SET rate = excluded.rate",
        )
        .bind(&rate.code)
        .bind(decimal_to_f64(rate.rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}
