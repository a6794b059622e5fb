//! Progressive income tax calculation over a slab schedule.
//!
//! Taxable income is total income minus total expense, floored at zero. It
//! is split across the slabs of a [`SlabTable`]: each slab taxes the part of
//! the income that falls inside `[from, to)` at its own rate.
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | Income and expense, normalized money |
//! | 2    | Taxable income (income - expense, minimum 0) |
//! | 3    | Per slab: amount in slab = max(0, min(taxable, to) - from) |
//! | 4    | Per slab: tax for slab = amount in slab × rate |
//! | 5    | Calculated tax (sum of step 4) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use levy_core::calculations::ProgressiveTaxEngine;
//!
//! let engine = ProgressiveTaxEngine::default();
//! let result = engine.calculate(dec!(500000), dec!(0), None, None);
//!
//! assert_eq!(result.fiscal_year, "2026-2027");
//! assert_eq!(result.taxable_income, dec!(500000));
//! assert_eq!(result.calculated_tax, dec!(10000));
//! assert_eq!(result.breakdown.len(), 3);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::normalize_money;
use crate::calculations::slab_table::{Slab, SlabTable};

/// Fiscal year label reported when the caller does not name one.
pub const DEFAULT_FISCAL_YEAR: &str = "2026-2027";

/// The part of the tax attributable to a single slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdownLine {
    pub from: Decimal,
    pub to: Option<Decimal>,
    pub rate: Decimal,
    pub amount_in_slab: Decimal,
    pub tax_for_slab: Decimal,
}

/// Result of a progressive tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub fiscal_year: String,

    /// Normalized income as used in the calculation.
    pub total_income: Decimal,

    /// Normalized expense as used in the calculation.
    pub total_expense: Decimal,

    /// Income after expenses, never negative.
    pub taxable_income: Decimal,

    /// Sum of every breakdown line's `tax_for_slab`.
    pub calculated_tax: Decimal,

    /// One line per slab the income reaches, plus any zero-rate slab.
    pub breakdown: Vec<TaxBreakdownLine>,
}

/// Calculator for progressive slab tax.
///
/// Holds the table used when the caller does not supply one. The engine has
/// no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct ProgressiveTaxEngine {
    default_table: SlabTable,
    default_label: String,
}

impl Default for ProgressiveTaxEngine {
    fn default() -> Self {
        Self::new(SlabTable::bangladesh_default(), DEFAULT_FISCAL_YEAR)
    }
}

impl ProgressiveTaxEngine {
    pub fn new(
        default_table: SlabTable,
        default_label: impl Into<String>,
    ) -> Self {
        Self {
            default_table,
            default_label: default_label.into(),
        }
    }

    pub fn default_table(&self) -> &SlabTable {
        &self.default_table
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Calculates the tax on `total_income - total_expense`.
    ///
    /// `slabs` overrides the engine's default table and `fiscal_year` the
    /// reported label. Negative inputs are treated as zero.
    pub fn calculate(
        &self,
        total_income: Decimal,
        total_expense: Decimal,
        fiscal_year: Option<&str>,
        slabs: Option<&SlabTable>,
    ) -> TaxResult {
        let fiscal_year = fiscal_year.unwrap_or(&self.default_label).to_string();
        let table = slabs.unwrap_or(&self.default_table);

        debug!(
            fiscal_year = %fiscal_year,
            total_income = %total_income,
            total_expense = %total_expense,
            slabs = table.len(),
            "calculating progressive tax"
        );

        let total_income = Self::clamped("total_income", total_income);
        let total_expense = Self::clamped("total_expense", total_expense);
        let taxable_income = self.taxable_income(total_income, total_expense);

        let breakdown: Vec<TaxBreakdownLine> = table
            .iter()
            .map(|slab| self.breakdown_line(slab, taxable_income))
            .filter(|line| line.amount_in_slab > Decimal::ZERO || line.rate.is_zero())
            .collect();

        let calculated_tax = self.total_tax(&breakdown);

        TaxResult {
            fiscal_year,
            total_income,
            total_expense,
            taxable_income,
            calculated_tax,
            breakdown,
        }
    }

    fn clamped(
        field: &'static str,
        value: Decimal,
    ) -> Decimal {
        if value.is_sign_negative() && !value.is_zero() {
            warn!(field, value = %value, "negative amount clamped to zero");
        }
        normalize_money(value)
    }

    /// Income minus expense, floored at zero.
    fn taxable_income(
        &self,
        total_income: Decimal,
        total_expense: Decimal,
    ) -> Decimal {
        normalize_money(total_income - total_expense)
    }

    /// Portion of `taxable_income` inside `slab`.
    fn amount_in_slab(
        &self,
        slab: &Slab,
        taxable_income: Decimal,
    ) -> Decimal {
        let capped = match slab.to {
            Some(to) => taxable_income.min(to),
            None => taxable_income,
        };
        normalize_money(capped - slab.from)
    }

    fn breakdown_line(
        &self,
        slab: &Slab,
        taxable_income: Decimal,
    ) -> TaxBreakdownLine {
        let amount_in_slab = self.amount_in_slab(slab, taxable_income);

        TaxBreakdownLine {
            from: slab.from,
            to: slab.to,
            rate: slab.rate,
            amount_in_slab,
            tax_for_slab: normalize_money(amount_in_slab * slab.rate),
        }
    }

    fn total_tax(
        &self,
        breakdown: &[TaxBreakdownLine],
    ) -> Decimal {
        normalize_money(breakdown.iter().map(|l| l.tax_for_slab).sum())
    }
}

/// Calculates tax with the built-in default table.
///
/// Shorthand for `ProgressiveTaxEngine::default().calculate(..)`.
pub fn calculate_tax(
    total_income: Decimal,
    total_expense: Decimal,
    fiscal_year: Option<&str>,
    slabs: Option<&SlabTable>,
) -> TaxResult {
    ProgressiveTaxEngine::default().calculate(total_income, total_expense, fiscal_year, slabs)
}
