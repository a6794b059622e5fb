use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::normalize_money;

/// Direction of a trade transaction. It selects which country rate applies
/// but does not change the duty arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Import,
    Export,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            _ => None,
        }
    }
}

/// Currency the trade amount was entered in. Duty is always computed on BDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputCurrency {
    #[default]
    Bdt,
    Usd,
}

impl InputCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bdt => "BDT",
            Self::Usd => "USD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BDT" => Some(Self::Bdt),
            "USD" => Some(Self::Usd),
            _ => None,
        }
    }

    /// Converts an entered amount to taka using `usd_bdt` taka per dollar.
    ///
    /// The result is normalized money, so negative inputs or a negative rate
    /// give zero. A product past the decimal range saturates at
    /// [`Decimal::MAX`].
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use levy_core::InputCurrency;
    ///
    /// assert_eq!(InputCurrency::Usd.to_bdt(dec!(10), dec!(120)), dec!(1200));
    /// assert_eq!(InputCurrency::Bdt.to_bdt(dec!(10), dec!(120)), dec!(10));
    /// ```
    pub fn to_bdt(
        &self,
        amount: Decimal,
        usd_bdt: Decimal,
    ) -> Decimal {
        match self {
            Self::Bdt => normalize_money(amount),
            Self::Usd => normalize_money(amount)
                .checked_mul(normalize_money(usd_bdt))
                .map_or(Decimal::MAX, normalize_money),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    /// ISO-style short code, e.g. `CN`.
    pub code: String,
    /// Percent, 0-100.
    pub import_rate: Decimal,
    /// Percent, 0-100.
    pub export_rate: Decimal,
}

impl Country {
    /// The percentage that applies to `trade_type` transactions with this country.
    pub fn rate_for(
        &self,
        trade_type: TradeType,
    ) -> Decimal {
        match trade_type {
            TradeType::Import => self.import_rate,
            TradeType::Export => self.export_rate,
        }
    }
}

/// For creating or updating a country by code (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCountry {
    pub name: String,
    pub code: String,
    pub import_rate: Decimal,
    pub export_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
    /// Percent, 0-100.
    pub base_rate: Decimal,
}

/// For creating or updating a category by name (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductCategory {
    pub name: String,
    pub base_rate: Decimal,
}

/// A saved import/export duty calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub user_id: String,
    pub trade_type: TradeType,
    pub country: String,
    pub product_category: String,
    pub product_name: String,

    /// Taxed amount in BDT.
    pub amount: Decimal,
    pub calculated_tax: Decimal,
    pub rate: Decimal,
    pub country_rate: Decimal,
    pub category_rate: Decimal,

    // What the user typed before conversion
    pub input_currency: InputCurrency,
    pub input_amount: Decimal,
    pub exchange_rate: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

/// For creating new trade records (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTradeRecord {
    pub user_id: String,
    pub trade_type: TradeType,
    pub country: String,
    pub product_category: String,
    pub product_name: String,
    pub amount: Decimal,
    pub calculated_tax: Decimal,
    pub rate: Decimal,
    pub country_rate: Decimal,
    pub category_rate: Decimal,
    pub input_currency: InputCurrency,
    pub input_amount: Decimal,
    pub exchange_rate: Option<Decimal>,
}
