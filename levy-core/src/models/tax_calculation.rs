use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{TaxBreakdownLine, TaxResult};

/// A saved calculation in a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculation {
    pub id: i64,
    pub user_id: String,

    /// Set when an officer created the record, either directly or by
    /// approving a review request.
    pub officer_id: Option<String>,
    pub source_request_id: Option<i64>,

    pub fiscal_year: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub taxable_income: Decimal,
    pub calculated_tax: Decimal,
    pub breakdown: Vec<TaxBreakdownLine>,

    pub created_at: DateTime<Utc>,
}

/// Narrows a history listing. Bounds are inclusive and `None` means
/// unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationFilter {
    pub user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_tax: Option<Decimal>,
    pub max_tax: Option<Decimal>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl CalculationFilter {
    /// Every calculation filed under `user_id`.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_limit(
        mut self,
        limit: u32,
    ) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// For creating new calculation records (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxCalculation {
    pub user_id: String,
    pub officer_id: Option<String>,
    pub source_request_id: Option<i64>,
    pub fiscal_year: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub taxable_income: Decimal,
    pub calculated_tax: Decimal,
    pub breakdown: Vec<TaxBreakdownLine>,
}

impl NewTaxCalculation {
    /// Builds a history record owned by `user_id` from a calculator result.
    pub fn from_result(
        user_id: impl Into<String>,
        result: &TaxResult,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            officer_id: None,
            source_request_id: None,
            fiscal_year: result.fiscal_year.clone(),
            total_income: result.total_income,
            total_expense: result.total_expense,
            taxable_income: result.taxable_income,
            calculated_tax: result.calculated_tax,
            breakdown: result.breakdown.clone(),
        }
    }
}
