//! Tax and duty calculators.
//!
//! Both calculators are pure: they take normalized money and validated
//! configuration and always produce a result.

pub mod common;
pub mod progressive;
pub mod slab_table;
pub mod trade_duty;

pub use progressive::{
    DEFAULT_FISCAL_YEAR, ProgressiveTaxEngine, TaxBreakdownLine, TaxResult, calculate_tax,
};
pub use slab_table::{Slab, SlabConfigError, SlabRow, SlabTable};
pub use trade_duty::{TradeQuote, TradeTaxResult, calculate_trade_tax, quote_trade};
