//! In-process repository used by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{LevyRepository, RepositoryError};
use crate::models::{
    CalculationFilter, CitizenProfile, Country, ExchangeRate, FiscalYear, NewCitizenProfile,
    NewCountry, NewOfficerActivity, NewProductCategory, NewTaxCalculation, NewTaxRequest,
    NewTradeRecord, OfficerActivity, ProductCategory, TaxCalculation, TaxRequest,
    TaxRequestStatus, TaxSlab, TradeRecord,
};

#[derive(Default)]
struct State {
    fiscal_years: Vec<FiscalYear>,
    slabs: Vec<TaxSlab>,
    calculations: Vec<TaxCalculation>,
    requests: Vec<TaxRequest>,
    activity: Vec<OfficerActivity>,
    profiles: Vec<CitizenProfile>,
    countries: Vec<Country>,
    categories: Vec<ProductCategory>,
    trade_records: Vec<TradeRecord>,
    exchange_rates: Vec<ExchangeRate>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_calculation(
        &mut self,
        calc: NewTaxCalculation,
    ) -> TaxCalculation {
        let record = TaxCalculation {
            id: self.next_id(),
            user_id: calc.user_id,
            officer_id: calc.officer_id,
            source_request_id: calc.source_request_id,
            fiscal_year: calc.fiscal_year,
            total_income: calc.total_income,
            total_expense: calc.total_expense,
            taxable_income: calc.taxable_income,
            calculated_tax: calc.calculated_tax,
            breakdown: calc.breakdown,
            created_at: Utc::now(),
        };
        self.calculations.push(record.clone());
        record
    }

    fn request_in(
        &mut self,
        id: i64,
        expected: TaxRequestStatus,
    ) -> Result<&mut TaxRequest, RepositoryError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if request.status != expected {
            return Err(RepositoryError::StatusConflict {
                id,
                current: request.status,
            });
        }
        Ok(request)
    }
}

fn set_status(
    request: &mut TaxRequest,
    status: TaxRequestStatus,
    officer_id: Option<&str>,
    officer_note: Option<&str>,
) -> TaxRequest {
    request.status = status;
    request.officer_id = officer_id.map(str::to_string);
    request.officer_note = officer_note.map(str::to_string);
    request.updated_at = Utc::now();
    request.clone()
}

fn matches_filter(
    calc: &TaxCalculation,
    filter: &CalculationFilter,
) -> bool {
    filter.user_id.as_ref().is_none_or(|u| &calc.user_id == u)
        && filter.from.is_none_or(|from| calc.created_at >= from)
        && filter.to.is_none_or(|to| calc.created_at <= to)
        && filter.min_tax.is_none_or(|min| calc.calculated_tax >= min)
        && filter.max_tax.is_none_or(|max| calc.calculated_tax <= max)
}

#[derive(Default)]
pub(crate) struct MemoryRepository {
    state: Mutex<State>,
    fail_activity_log: AtomicBool,
}

impl MemoryRepository {
    /// Makes every `log_activity` call fail with a database error.
    pub(crate) fn fail_activity_log(&self) {
        self.fail_activity_log.store(true, Ordering::SeqCst);
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, State>, RepositoryError> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

fn newest_first<T>(
    mut rows: Vec<T>,
    limit: Option<u32>,
) -> Vec<T> {
    rows.reverse();
    if let Some(limit) = limit {
        rows.truncate(limit as usize);
    }
    rows
}

#[async_trait]
impl LevyRepository for MemoryRepository {
    async fn list_fiscal_years(&self) -> Result<Vec<FiscalYear>, RepositoryError> {
        Ok(self.state()?.fiscal_years.clone())
    }

    async fn upsert_fiscal_year(&self, year: &FiscalYear) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.fiscal_years.retain(|y| y.label != year.label);
        state.fiscal_years.push(year.clone());
        Ok(())
    }

    async fn get_tax_slabs(&self, fiscal_year: &str) -> Result<Vec<TaxSlab>, RepositoryError> {
        let mut slabs: Vec<TaxSlab> = self
            .state()?
            .slabs
            .iter()
            .filter(|s| s.fiscal_year == fiscal_year)
            .cloned()
            .collect();
        slabs.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
        Ok(slabs)
    }

    async fn replace_tax_slabs(
        &self,
        fiscal_year: &str,
        slabs: &[TaxSlab],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.slabs.retain(|s| s.fiscal_year != fiscal_year);
        state.slabs.extend(slabs.iter().map(|slab| TaxSlab {
            fiscal_year: fiscal_year.to_string(),
            ..slab.clone()
        }));
        Ok(())
    }

    async fn create_calculation(
        &self,
        calc: NewTaxCalculation,
    ) -> Result<TaxCalculation, RepositoryError> {
        Ok(self.state()?.insert_calculation(calc))
    }

    async fn get_calculation(&self, id: i64) -> Result<TaxCalculation, RepositoryError> {
        self.state()?
            .calculations
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_calculations(
        &self,
        filter: &CalculationFilter,
    ) -> Result<Vec<TaxCalculation>, RepositoryError> {
        let rows = self
            .state()?
            .calculations
            .iter()
            .filter(|c| matches_filter(c, filter))
            .cloned()
            .collect();
        Ok(newest_first(rows, None)
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit.map_or(usize::MAX, |limit| limit as usize))
            .collect())
    }

    async fn delete_calculation(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.calculations.len();
        state.calculations.retain(|c| c.id != id);
        if state.calculations.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn create_request(&self, request: NewTaxRequest) -> Result<TaxRequest, RepositoryError> {
        let mut state = self.state()?;
        let now = Utc::now();
        let record = TaxRequest {
            id: state.next_id(),
            citizen_id: request.citizen_id,
            fiscal_year: request.fiscal_year,
            total_income: request.total_income,
            total_expense: request.total_expense,
            taxable_income: request.taxable_income,
            calculated_tax: request.calculated_tax,
            breakdown: request.breakdown,
            status: request.status,
            officer_id: None,
            officer_note: None,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(record.clone());
        Ok(record)
    }

    async fn get_request(&self, id: i64) -> Result<TaxRequest, RepositoryError> {
        self.state()?
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_requests(
        &self,
        status: Option<TaxRequestStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<TaxRequest>, RepositoryError> {
        let rows = self
            .state()?
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, limit))
    }

    async fn update_request_status(
        &self,
        id: i64,
        from: TaxRequestStatus,
        to: TaxRequestStatus,
        officer_id: Option<&str>,
        officer_note: Option<&str>,
    ) -> Result<TaxRequest, RepositoryError> {
        let mut state = self.state()?;
        let request = state.request_in(id, from)?;
        Ok(set_status(request, to, officer_id, officer_note))
    }

    async fn record_approval(
        &self,
        id: i64,
        officer_id: &str,
        officer_note: Option<&str>,
        calculation: NewTaxCalculation,
    ) -> Result<(TaxRequest, TaxCalculation), RepositoryError> {
        let mut state = self.state()?;
        let request = state.request_in(id, TaxRequestStatus::Submitted)?;
        let request = set_status(
            request,
            TaxRequestStatus::Approved,
            Some(officer_id),
            officer_note,
        );
        let calculation = state.insert_calculation(calculation);
        Ok((request, calculation))
    }

    async fn log_activity(
        &self,
        activity: NewOfficerActivity,
    ) -> Result<OfficerActivity, RepositoryError> {
        if self.fail_activity_log.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("activity log unavailable".to_string()));
        }
        let mut state = self.state()?;
        let record = OfficerActivity {
            id: state.next_id(),
            officer_id: activity.officer_id,
            activity_type: activity.activity_type,
            target_user_id: activity.target_user_id,
            description: activity.description,
            metadata: activity.metadata,
            created_at: Utc::now(),
        };
        state.activity.push(record.clone());
        Ok(record)
    }

    async fn list_activity(
        &self,
        officer_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<OfficerActivity>, RepositoryError> {
        let rows = self
            .state()?
            .activity
            .iter()
            .filter(|a| officer_id.is_none_or(|o| a.officer_id == o))
            .cloned()
            .collect();
        Ok(newest_first(rows, limit))
    }

    async fn upsert_profile(
        &self,
        profile: &NewCitizenProfile,
    ) -> Result<CitizenProfile, RepositoryError> {
        let mut state = self.state()?;
        if state
            .profiles
            .iter()
            .any(|p| p.tin_number == profile.tin_number && p.id != profile.id)
        {
            return Err(RepositoryError::Database(format!(
                "TIN {} is registered to another citizen",
                profile.tin_number
            )));
        }
        let now = Utc::now();
        let created_at = match state.profiles.iter().position(|p| p.id == profile.id) {
            Some(pos) => state.profiles.remove(pos).created_at,
            None => now,
        };
        let record = CitizenProfile {
            id: profile.id.clone(),
            tin_number: profile.tin_number.clone(),
            email: profile.email.clone(),
            location: profile.location.clone(),
            phone: profile.phone.clone(),
            created_at,
            updated_at: now,
        };
        state.profiles.push(record.clone());
        Ok(record)
    }

    async fn find_profile_by_tin(&self, tin: &str) -> Result<CitizenProfile, RepositoryError> {
        self.state()?
            .profiles
            .iter()
            .find(|p| p.tin_number == tin)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_countries(&self) -> Result<Vec<Country>, RepositoryError> {
        let mut rows = self.state()?.countries.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_country_by_code(&self, code: &str) -> Result<Country, RepositoryError> {
        self.state()?
            .countries
            .iter()
            .find(|c| c.code == code)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_country(&self, country: &NewCountry) -> Result<Country, RepositoryError> {
        let mut state = self.state()?;
        let id = match state.countries.iter().position(|c| c.code == country.code) {
            Some(pos) => state.countries.remove(pos).id,
            None => state.next_id(),
        };
        let record = Country {
            id,
            name: country.name.clone(),
            code: country.code.clone(),
            import_rate: country.import_rate,
            export_rate: country.export_rate,
        };
        state.countries.push(record.clone());
        Ok(record)
    }

    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let mut rows = self.state()?.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_product_category(&self, name: &str) -> Result<ProductCategory, RepositoryError> {
        self.state()?
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_product_category(
        &self,
        category: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        let mut state = self.state()?;
        let id = match state.categories.iter().position(|c| c.name == category.name) {
            Some(pos) => state.categories.remove(pos).id,
            None => state.next_id(),
        };
        let record = ProductCategory {
            id,
            name: category.name.clone(),
            base_rate: category.base_rate,
        };
        state.categories.push(record.clone());
        Ok(record)
    }

    async fn create_trade_record(
        &self,
        record: NewTradeRecord,
    ) -> Result<TradeRecord, RepositoryError> {
        let mut state = self.state()?;
        let saved = TradeRecord {
            id: state.next_id(),
            user_id: record.user_id,
            trade_type: record.trade_type,
            country: record.country,
            product_category: record.product_category,
            product_name: record.product_name,
            amount: record.amount,
            calculated_tax: record.calculated_tax,
            rate: record.rate,
            country_rate: record.country_rate,
            category_rate: record.category_rate,
            input_currency: record.input_currency,
            input_amount: record.input_amount,
            exchange_rate: record.exchange_rate,
            created_at: Utc::now(),
        };
        state.trade_records.push(saved.clone());
        Ok(saved)
    }

    async fn list_trade_records(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<TradeRecord>, RepositoryError> {
        let rows = self
            .state()?
            .trade_records
            .iter()
            .filter(|r| user_id.is_none_or(|u| r.user_id == u))
            .cloned()
            .collect();
        Ok(newest_first(rows, None))
    }

    async fn get_exchange_rate(&self, code: &str) -> Result<ExchangeRate, RepositoryError> {
        self.state()?
            .exchange_rates
            .iter()
            .find(|r| r.code == code)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.exchange_rates.retain(|r| r.code != rate.code);
        state.exchange_rates.push(rate.clone());
        Ok(())
    }
}
