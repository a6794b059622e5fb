use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{TaxBreakdownLine, TaxResult};

/// Lifecycle of a citizen's review request.
///
/// ```text
/// draft ──► submitted ──┬──► approved
///                       └──► rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxRequestStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl TaxRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether a request in this status may move to `next`.
    pub fn can_transition_to(
        &self,
        next: TaxRequestStatus,
    ) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::Approved)
                | (Self::Submitted, Self::Rejected)
        )
    }
}

impl std::fmt::Display for TaxRequestStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRequest {
    pub id: i64,
    pub citizen_id: String,
    pub fiscal_year: String,

    // Figures as submitted by the citizen
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub taxable_income: Decimal,
    pub calculated_tax: Decimal,
    pub breakdown: Vec<TaxBreakdownLine>,

    pub status: TaxRequestStatus,
    pub officer_id: Option<String>,
    pub officer_note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new requests (no id, reviewer or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxRequest {
    pub citizen_id: String,
    pub fiscal_year: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub taxable_income: Decimal,
    pub calculated_tax: Decimal,
    pub breakdown: Vec<TaxBreakdownLine>,
    pub status: TaxRequestStatus,
}

impl NewTaxRequest {
    /// Builds a `submitted` request from a calculator result.
    pub fn submitted(
        citizen_id: impl Into<String>,
        result: &TaxResult,
    ) -> Self {
        Self {
            citizen_id: citizen_id.into(),
            fiscal_year: result.fiscal_year.clone(),
            total_income: result.total_income,
            total_expense: result.total_expense,
            taxable_income: result.taxable_income,
            calculated_tax: result.calculated_tax,
            breakdown: result.breakdown.clone(),
            status: TaxRequestStatus::Submitted,
        }
    }
}
