//! Validated slab tables for the progressive tax calculator.
//!
//! A [`SlabTable`] can only be built through validation, so the calculator
//! never has to deal with malformed configuration. [`SlabTable::new`] checks
//! the shape of each slab; [`SlabTable::new_strict`] also checks that the
//! slabs partition the income range the way a published schedule does.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use levy_core::calculations::{Slab, SlabConfigError, SlabTable};
//!
//! let table = SlabTable::new_strict(vec![
//!     Slab::new(dec!(0), Some(dec!(300000)), dec!(0)),
//!     Slab::new(dec!(300000), None, dec!(0.10)),
//! ])
//! .unwrap();
//! assert_eq!(table.len(), 2);
//!
//! let gap = SlabTable::new_strict(vec![
//!     Slab::new(dec!(0), Some(dec!(300000)), dec!(0)),
//!     Slab::new(dec!(350000), None, dec!(0.10)),
//! ]);
//! assert_eq!(
//!     gap,
//!     Err(SlabConfigError::NotContiguous {
//!         index: 1,
//!         expected_from: dec!(300000),
//!         from: dec!(350000),
//!     })
//! );
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaxSlab;
use crate::calculations::common::decimal_from_f64;

/// Errors raised while validating a slab table.
///
/// Every variant except [`SlabConfigError::Empty`] names the zero-based
/// position of the offending slab.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabConfigError {
    #[error("slab table is empty")]
    Empty,

    #[error("slab {index}: {field} is not a finite number")]
    NonFinite { index: usize, field: &'static str },

    #[error("slab {index}: lower bound must be non-negative, got {from}")]
    NegativeLowerBound { index: usize, from: Decimal },

    #[error("slab {index}: upper bound {to} must be greater than lower bound {from}")]
    InvalidBounds {
        index: usize,
        from: Decimal,
        to: Decimal,
    },

    #[error("slab {index}: rate must be between 0 and 1, got {rate}")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("slab {index}: lower bound {from} is below the previous slab's lower bound {previous}")]
    NotAscending {
        index: usize,
        from: Decimal,
        previous: Decimal,
    },

    #[error("slab {index}: expected lower bound {expected_from}, got {from}")]
    NotContiguous {
        index: usize,
        expected_from: Decimal,
        from: Decimal,
    },

    #[error("slab {index}: only the last slab may be unbounded")]
    UnboundedNotLast { index: usize },

    #[error("slab {index}: the last slab must be unbounded")]
    BoundedTopSlab { index: usize },
}

/// One bracket of a progressive schedule: income in `[from, to)` is taxed
/// at `rate`. `to = None` means the bracket is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slab {
    pub from: Decimal,
    pub to: Option<Decimal>,
    /// Fraction, `0.05` for 5%.
    pub rate: Decimal,
}

impl Slab {
    pub fn new(
        from: Decimal,
        to: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { from, to, rate }
    }
}

impl From<&TaxSlab> for Slab {
    fn from(slab: &TaxSlab) -> Self {
        Self {
            from: slab.lower_bound,
            to: slab.upper_bound,
            rate: slab.rate,
        }
    }
}

/// A slab as it arrives from a configuration feed, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SlabRow {
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

impl SlabRow {
    fn to_slab(
        self,
        index: usize,
    ) -> Result<Slab, SlabConfigError> {
        let finite = |value: f64, field: &'static str| {
            if value.is_finite() {
                Ok(decimal_from_f64(value))
            } else {
                Err(SlabConfigError::NonFinite { index, field })
            }
        };

        Ok(Slab {
            from: finite(self.lower_bound, "lower_bound")?,
            to: self
                .upper_bound
                .map(|to| finite(to, "upper_bound"))
                .transpose()?,
            rate: finite(self.rate, "rate")?,
        })
    }
}

/// An ordered, validated set of slabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabTable {
    slabs: Vec<Slab>,
}

impl SlabTable {
    /// Validates the shape of every slab and builds a table.
    ///
    /// # Errors
    ///
    /// Returns [`SlabConfigError`] if:
    /// - `slabs` is empty
    /// - a lower bound is negative
    /// - a bounded slab's upper bound is not greater than its lower bound
    /// - a rate lies outside `[0, 1]`
    pub fn new(slabs: Vec<Slab>) -> Result<Self, SlabConfigError> {
        if slabs.is_empty() {
            return Err(SlabConfigError::Empty);
        }

        for (index, slab) in slabs.iter().enumerate() {
            Self::validate_shape(index, slab)?;
        }

        Ok(Self { slabs })
    }

    /// Like [`SlabTable::new`], and also requires that the slabs are sorted
    /// by lower bound, touch each other without gaps or overlaps, and that
    /// exactly the last slab is unbounded.
    pub fn new_strict(slabs: Vec<Slab>) -> Result<Self, SlabConfigError> {
        let table = Self::new(slabs)?;
        table.validate_partition()?;
        Ok(table)
    }

    /// Builds a table from stored slab rows, keeping their order.
    pub fn from_tax_slabs(slabs: &[TaxSlab]) -> Result<Self, SlabConfigError> {
        Self::new(slabs.iter().map(Slab::from).collect())
    }

    /// The schedule used when no slabs are configured for a fiscal year.
    ///
    /// | Taxable income (BDT)  | Rate |
    /// |-----------------------|------|
    /// | 0 - 350,000           | 0%   |
    /// | 350,000 - 450,000     | 5%   |
    /// | 450,000 - 750,000     | 10%  |
    /// | 750,000 - 1,100,000   | 15%  |
    /// | 1,100,000 - 1,600,000 | 20%  |
    /// | above 1,600,000       | 25%  |
    pub fn bangladesh_default() -> Self {
        let bracket = |from: i64, to: Option<i64>, percent: i64| Slab {
            from: Decimal::from(from),
            to: to.map(Decimal::from),
            rate: Decimal::new(percent, 2),
        };

        Self {
            slabs: vec![
                bracket(0, Some(350_000), 0),
                bracket(350_000, Some(450_000), 5),
                bracket(450_000, Some(750_000), 10),
                bracket(750_000, Some(1_100_000), 15),
                bracket(1_100_000, Some(1_600_000), 20),
                bracket(1_600_000, None, 25),
            ],
        }
    }

    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }

    pub fn len(&self) -> usize {
        self.slabs.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slab> {
        self.slabs.iter()
    }

    /// Converts the table into stored rows for `fiscal_year`.
    pub fn to_tax_slabs(
        &self,
        fiscal_year: &str,
    ) -> Vec<TaxSlab> {
        self.slabs
            .iter()
            .map(|s| TaxSlab {
                fiscal_year: fiscal_year.to_string(),
                lower_bound: s.from,
                upper_bound: s.to,
                rate: s.rate,
            })
            .collect()
    }

    fn validate_shape(
        index: usize,
        slab: &Slab,
    ) -> Result<(), SlabConfigError> {
        if slab.from < Decimal::ZERO {
            return Err(SlabConfigError::NegativeLowerBound {
                index,
                from: slab.from,
            });
        }
        if let Some(to) = slab.to
            && to <= slab.from
        {
            return Err(SlabConfigError::InvalidBounds {
                index,
                from: slab.from,
                to,
            });
        }
        if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
            return Err(SlabConfigError::RateOutOfRange {
                index,
                rate: slab.rate,
            });
        }
        Ok(())
    }

    fn validate_partition(&self) -> Result<(), SlabConfigError> {
        let last = self.slabs.len() - 1;

        for (index, pair) in self.slabs.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let index = index + 1;

            if next.from < prev.from {
                return Err(SlabConfigError::NotAscending {
                    index,
                    from: next.from,
                    previous: prev.from,
                });
            }

            let Some(prev_to) = prev.to else {
                return Err(SlabConfigError::UnboundedNotLast { index: index - 1 });
            };

            if next.from != prev_to {
                return Err(SlabConfigError::NotContiguous {
                    index,
                    expected_from: prev_to,
                    from: next.from,
                });
            }
        }

        if self.slabs[last].to.is_some() {
            return Err(SlabConfigError::BoundedTopSlab { index: last });
        }

        Ok(())
    }
}

impl TryFrom<&[SlabRow]> for SlabTable {
    type Error = SlabConfigError;

    /// Converts raw feed rows, rejecting non-finite fields, then applies the
    /// shape checks of [`SlabTable::new`].
    fn try_from(rows: &[SlabRow]) -> Result<Self, Self::Error> {
        let slabs = rows
            .iter()
            .enumerate()
            .map(|(index, row)| row.to_slab(index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slabs)
    }
}

impl<'a> IntoIterator for &'a SlabTable {
    type Item = &'a Slab;
    type IntoIter = std::slice::Iter<'a, Slab>;

    fn into_iter(self) -> Self::IntoIter {
        self.slabs.iter()
    }
}
