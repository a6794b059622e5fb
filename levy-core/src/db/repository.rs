use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CalculationFilter, CitizenProfile, Country, ExchangeRate, FiscalYear, NewCitizenProfile,
    NewCountry, NewOfficerActivity, NewProductCategory, NewTaxCalculation, NewTaxRequest,
    NewTradeRecord, OfficerActivity, ProductCategory, TaxCalculation, TaxRequest,
    TaxRequestStatus, TaxSlab, TradeRecord,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Request {id} is {current}")]
    StatusConflict {
        id: i64,
        current: TaxRequestStatus,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for everything the calculators read or produce.
///
/// List methods return newest records first unless noted otherwise.
#[async_trait]
pub trait LevyRepository: Send + Sync {
    // Fiscal years
    async fn list_fiscal_years(&self) -> Result<Vec<FiscalYear>, RepositoryError>;
    async fn upsert_fiscal_year(&self, year: &FiscalYear) -> Result<(), RepositoryError>;

    // Tax slabs, ordered by lower bound
    async fn get_tax_slabs(&self, fiscal_year: &str) -> Result<Vec<TaxSlab>, RepositoryError>;

    /// Swaps the whole schedule of `fiscal_year` for `slabs`, stored under
    /// that label. Either every row is written or the old rows stay.
    async fn replace_tax_slabs(
        &self,
        fiscal_year: &str,
        slabs: &[TaxSlab],
    ) -> Result<(), RepositoryError>;

    // Calculation history
    async fn create_calculation(
        &self,
        calc: NewTaxCalculation,
    ) -> Result<TaxCalculation, RepositoryError>;

    async fn get_calculation(&self, id: i64) -> Result<TaxCalculation, RepositoryError>;

    async fn list_calculations(
        &self,
        filter: &CalculationFilter,
    ) -> Result<Vec<TaxCalculation>, RepositoryError>;

    async fn delete_calculation(&self, id: i64) -> Result<(), RepositoryError>;

    // Review requests
    async fn create_request(&self, request: NewTaxRequest) -> Result<TaxRequest, RepositoryError>;

    async fn get_request(&self, id: i64) -> Result<TaxRequest, RepositoryError>;

    async fn list_requests(
        &self,
        status: Option<TaxRequestStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<TaxRequest>, RepositoryError>;

    /// Moves a request from `from` to `to` and sets the reviewer fields,
    /// returning the updated request.
    ///
    /// Fails with [`RepositoryError::StatusConflict`] when the request is no
    /// longer in `from`.
    async fn update_request_status(
        &self,
        id: i64,
        from: TaxRequestStatus,
        to: TaxRequestStatus,
        officer_id: Option<&str>,
        officer_note: Option<&str>,
    ) -> Result<TaxRequest, RepositoryError>;

    /// Approves a submitted request and files `calculation` atomically.
    ///
    /// Fails with [`RepositoryError::StatusConflict`], writing nothing, when
    /// the request is no longer submitted.
    async fn record_approval(
        &self,
        id: i64,
        officer_id: &str,
        officer_note: Option<&str>,
        calculation: NewTaxCalculation,
    ) -> Result<(TaxRequest, TaxCalculation), RepositoryError>;

    // Officer audit log
    async fn log_activity(
        &self,
        activity: NewOfficerActivity,
    ) -> Result<OfficerActivity, RepositoryError>;

    async fn list_activity(
        &self,
        officer_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<OfficerActivity>, RepositoryError>;

    // Citizen profiles
    async fn upsert_profile(
        &self,
        profile: &NewCitizenProfile,
    ) -> Result<CitizenProfile, RepositoryError>;

    async fn find_profile_by_tin(&self, tin: &str) -> Result<CitizenProfile, RepositoryError>;

    // Trade rate sheets, ordered by name
    async fn list_countries(&self) -> Result<Vec<Country>, RepositoryError>;
    async fn get_country_by_code(&self, code: &str) -> Result<Country, RepositoryError>;
    async fn upsert_country(&self, country: &NewCountry) -> Result<Country, RepositoryError>;

    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError>;
    async fn get_product_category(&self, name: &str) -> Result<ProductCategory, RepositoryError>;
    async fn upsert_product_category(
        &self,
        category: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError>;

    // Trade records
    async fn create_trade_record(
        &self,
        record: NewTradeRecord,
    ) -> Result<TradeRecord, RepositoryError>;

    async fn list_trade_records(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<TradeRecord>, RepositoryError>;

    // Exchange rates
    async fn get_exchange_rate(&self, code: &str) -> Result<ExchangeRate, RepositoryError>;
    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), RepositoryError>;
}
