use std::io::Read;

use levy_core::{LevyRepository, NewCountry, NewProductCategory, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RateSheetLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: {field} must be between 0 and 100, got {rate}")]
    RateOutOfRange {
        row: usize,
        field: &'static str,
        rate: Decimal,
    },

    #[error("row {row}: {field} must not be empty")]
    MissingField { row: usize, field: &'static str },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for RateSheetLoaderError {
    fn from(err: csv::Error) -> Self {
        RateSheetLoaderError::CsvParse(err.to_string())
    }
}

/// A row of the country rate sheet: `name,code,import_rate,export_rate`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub code: String,
    pub import_rate: Decimal,
    pub export_rate: Decimal,
}

/// A row of the product category sheet: `name,base_rate`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub base_rate: Decimal,
}

fn percent(
    row: usize,
    field: &'static str,
    rate: Decimal,
) -> Result<Decimal, RateSheetLoaderError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(RateSheetLoaderError::RateOutOfRange { row, field, rate });
    }
    Ok(rate)
}

fn required(
    row: usize,
    field: &'static str,
    value: &str,
) -> Result<String, RateSheetLoaderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RateSheetLoaderError::MissingField { row, field });
    }
    Ok(value.to_string())
}

fn deserialize_all<T, R>(reader: R) -> Result<Vec<T>, RateSheetLoaderError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in csv_reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Loader for the country and product category rate sheets used by the
/// trade duty engine.
///
/// Rows are percentages in `[0, 100]`. Rows are numbered from 1 in errors,
/// excluding the header. Country codes are upper-cased.
pub struct RateSheetLoader;

impl RateSheetLoader {
    pub fn parse_countries<R: Read>(reader: R) -> Result<Vec<NewCountry>, RateSheetLoaderError> {
        let records: Vec<CountryRecord> = deserialize_all(reader)?;

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let row = index + 1;
                Ok(NewCountry {
                    name: required(row, "name", &record.name)?,
                    code: required(row, "code", &record.code)?.to_uppercase(),
                    import_rate: percent(row, "import_rate", record.import_rate)?,
                    export_rate: percent(row, "export_rate", record.export_rate)?,
                })
            })
            .collect()
    }

    pub fn parse_categories<R: Read>(
        reader: R,
    ) -> Result<Vec<NewProductCategory>, RateSheetLoaderError> {
        let records: Vec<CategoryRecord> = deserialize_all(reader)?;

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let row = index + 1;
                Ok(NewProductCategory {
                    name: required(row, "name", &record.name)?,
                    base_rate: percent(row, "base_rate", record.base_rate)?,
                })
            })
            .collect()
    }

    /// Upserts countries by code. Returns the number of rows written.
    pub async fn load_countries(
        repo: &dyn LevyRepository,
        countries: &[NewCountry],
    ) -> Result<usize, RateSheetLoaderError> {
        for country in countries {
            repo.upsert_country(country).await?;
        }
        info!(count = countries.len(), "loaded country rates");
        Ok(countries.len())
    }

    /// Upserts categories by name. Returns the number of rows written.
    pub async fn load_categories(
        repo: &dyn LevyRepository,
        categories: &[NewProductCategory],
    ) -> Result<usize, RateSheetLoaderError> {
        for category in categories {
            repo.upsert_product_category(category).await?;
        }
        info!(count = categories.len(), "loaded product category rates");
        Ok(categories.len())
    }
}
