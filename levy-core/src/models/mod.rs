mod exchange_rate;
mod fiscal_year;
mod officer_activity;
mod profile;
mod tax_calculation;
mod tax_request;
mod tax_slab;
mod trade;

pub use exchange_rate::{DEFAULT_USD_BDT_RATE, ExchangeRate, USD_BDT};
pub use fiscal_year::FiscalYear;
pub use officer_activity::{ActivityType, NewOfficerActivity, OfficerActivity};
pub use profile::{CitizenProfile, NewCitizenProfile, ProfileError, validate_tin};
pub use tax_calculation::{CalculationFilter, NewTaxCalculation, TaxCalculation};
pub use tax_request::{NewTaxRequest, TaxRequest, TaxRequestStatus};
pub use tax_slab::TaxSlab;
pub use trade::{
    Country, InputCurrency, NewCountry, NewProductCategory, NewTradeRecord, ProductCategory,
    TradeRecord, TradeType,
};
