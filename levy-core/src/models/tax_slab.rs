use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A slab row as stored for one fiscal year.
///
/// `rate` is a fraction (`0.10` for 10%). `upper_bound` is `None` for the
/// open-ended top slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub fiscal_year: String,
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}
