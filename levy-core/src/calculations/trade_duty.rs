//! Import/export duty calculation.
//!
//! The duty rate is the sum of the trade partner's country rate and the
//! product category's base rate, both in percent. Imports and exports use
//! the same formula; the trade type only decides which country rate the
//! caller looks up (see [`Country::rate_for`](crate::Country::rate_for)).
//!
//! ```
//! use rust_decimal_macros::dec;
//! use levy_core::TradeType;
//! use levy_core::calculations::calculate_trade_tax;
//!
//! let result = calculate_trade_tax(TradeType::Import, dec!(1000), dec!(5), dec!(2.5));
//!
//! assert_eq!(result.rate, dec!(7.5));
//! assert_eq!(result.calculated_tax, dec!(75.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{max, round_half_up};
use crate::{Country, InputCurrency, ProductCategory, TradeType};

/// Result of a trade duty calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTaxResult {
    /// Combined percentage, never negative.
    pub rate: Decimal,
    pub calculated_tax: Decimal,
}

/// Calculates the duty on `amount` at `country_rate + category_rate` percent.
///
/// A negative amount is taxed as zero, and a negative combined rate is
/// treated as zero. Results too large for a [`Decimal`] saturate at
/// [`Decimal::MAX`].
pub fn calculate_trade_tax(
    trade_type: TradeType,
    amount: Decimal,
    country_rate: Decimal,
    category_rate: Decimal,
) -> TradeTaxResult {
    debug!(
        trade_type = trade_type.as_str(),
        amount = %amount,
        country_rate = %country_rate,
        category_rate = %category_rate,
        "calculating trade duty"
    );

    let amount = max(amount, Decimal::ZERO);
    let rate = max(country_rate.saturating_add(category_rate), Decimal::ZERO);
    let calculated_tax = round_half_up(percent_of(amount, rate));

    TradeTaxResult {
        rate,
        calculated_tax,
    }
}

/// `amount * percent / 100`, dividing first when the product would not fit.
fn percent_of(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    if let Some(product) = amount.checked_mul(percent) {
        return product / Decimal::ONE_HUNDRED;
    }
    (amount / Decimal::ONE_HUNDRED)
        .checked_mul(percent)
        .unwrap_or_else(|| {
            warn!(amount = %amount, percent = %percent, "trade duty overflowed, saturating");
            Decimal::MAX
        })
}

/// A fully resolved duty quote: rates looked up, currency converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub trade_type: TradeType,
    pub input_currency: InputCurrency,
    pub input_amount: Decimal,

    /// Taka per dollar applied, `None` for BDT input.
    pub exchange_rate: Option<Decimal>,

    /// Amount in BDT the duty was calculated on.
    pub amount: Decimal,
    pub country_rate: Decimal,
    pub category_rate: Decimal,
    pub result: TradeTaxResult,
}

/// Looks up the rates for `country` and `category`, converts the entered
/// amount to BDT, and calculates the duty.
pub fn quote_trade(
    trade_type: TradeType,
    country: &Country,
    category: &ProductCategory,
    input_currency: InputCurrency,
    input_amount: Decimal,
    usd_bdt: Decimal,
) -> TradeQuote {
    let amount = input_currency.to_bdt(input_amount, usd_bdt);
    let country_rate = country.rate_for(trade_type);
    let category_rate = category.base_rate;

    TradeQuote {
        trade_type,
        input_currency,
        input_amount,
        exchange_rate: match input_currency {
            InputCurrency::Bdt => None,
            InputCurrency::Usd => Some(usd_bdt),
        },
        amount,
        country_rate,
        category_rate,
        result: calculate_trade_tax(trade_type, amount, country_rate, category_rate),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn india() -> Country {
        Country {
            id: 7,
            name: "India".to_string(),
            code: "IN".to_string(),
            import_rate: dec!(10),
            export_rate: dec!(2),
        }
    }

    fn textiles() -> ProductCategory {
        ProductCategory {
            id: 3,
            name: "Textiles".to_string(),
            base_rate: dec!(5),
        }
    }

    // =========================================================================
    // calculate_trade_tax tests
    // =========================================================================

    #[test]
    fn import_adds_country_and_category_rates() {
        let result = calculate_trade_tax(TradeType::Import, dec!(1000), dec!(5), dec!(2.5));

        assert_eq!(
            result,
            TradeTaxResult {
                rate: dec!(7.5),
                calculated_tax: dec!(75.00)
            }
        );
    }

    #[test]
    fn negative_amount_is_taxed_as_zero() {
        let result = calculate_trade_tax(TradeType::Export, dec!(-50), dec!(10), dec!(10));

        assert_eq!(result.rate, dec!(20));
        assert_eq!(result.calculated_tax, Decimal::ZERO);
    }

    #[test]
    fn negative_combined_rate_is_zero() {
        let result = calculate_trade_tax(TradeType::Import, dec!(1000), dec!(-15), dec!(5));

        assert_eq!(result.rate, Decimal::ZERO);
        assert_eq!(result.calculated_tax, Decimal::ZERO);
    }

    #[test]
    fn export_and_import_share_formula() {
        let import = calculate_trade_tax(TradeType::Import, dec!(333.33), dec!(3), dec!(4));
        let export = calculate_trade_tax(TradeType::Export, dec!(333.33), dec!(3), dec!(4));

        assert_eq!(import, export);
    }

    #[test]
    fn tax_rounds_half_up_to_cents() {
        // 0.5 * 1% = 0.005
        let result = calculate_trade_tax(TradeType::Import, dec!(0.5), dec!(1), dec!(0));

        assert_eq!(result.calculated_tax, dec!(0.01));
    }

    #[test]
    fn largest_amount_divides_before_multiplying() {
        let result = calculate_trade_tax(TradeType::Import, Decimal::MAX, dec!(10), dec!(5));

        assert_eq!(result.rate, dec!(15));
        assert_eq!(
            result.calculated_tax,
            round_half_up(Decimal::MAX / Decimal::ONE_HUNDRED * dec!(15))
        );
        assert!(result.calculated_tax < Decimal::MAX);
    }

    #[test]
    fn duty_past_decimal_range_saturates() {
        let result = calculate_trade_tax(TradeType::Export, Decimal::MAX, dec!(5000), dec!(5000));

        assert_eq!(result.rate, dec!(10000));
        assert_eq!(result.calculated_tax, Decimal::MAX);
    }

    #[test]
    fn huge_rates_do_not_overflow_the_sum() {
        let result = calculate_trade_tax(TradeType::Import, dec!(1), Decimal::MAX, Decimal::MAX);

        assert_eq!(result.rate, Decimal::MAX);
        assert_eq!(result.calculated_tax, round_half_up(Decimal::MAX / Decimal::ONE_HUNDRED));
    }

    // =========================================================================
    // quote_trade tests
    // =========================================================================

    #[test]
    fn quote_uses_import_rate_for_imports() {
        let quote = quote_trade(
            TradeType::Import,
            &india(),
            &textiles(),
            InputCurrency::Bdt,
            dec!(20000),
            dec!(120),
        );

        assert_eq!(quote.country_rate, dec!(10));
        assert_eq!(quote.exchange_rate, None);
        assert_eq!(quote.amount, dec!(20000));
        assert_eq!(quote.result.rate, dec!(15));
        assert_eq!(quote.result.calculated_tax, dec!(3000.00));
    }

    #[test]
    fn quote_converts_usd_before_calculating() {
        let quote = quote_trade(
            TradeType::Export,
            &india(),
            &textiles(),
            InputCurrency::Usd,
            dec!(100),
            dec!(120),
        );

        assert_eq!(quote.amount, dec!(12000));
        assert_eq!(quote.exchange_rate, Some(dec!(120)));
        assert_eq!(quote.country_rate, dec!(2));
        assert_eq!(quote.result.calculated_tax, dec!(840.00));
    }

    #[test]
    fn quote_for_huge_usd_amount_saturates() {
        let quote = quote_trade(
            TradeType::Import,
            &india(),
            &textiles(),
            InputCurrency::Usd,
            dec!(1000000000000000000000000000),
            dec!(120),
        );

        assert_eq!(quote.amount, Decimal::MAX);
        assert_eq!(quote.result.rate, dec!(15));
        assert!(quote.result.calculated_tax > Decimal::ZERO);
    }
}
