use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Code of the USD to BDT conversion row.
pub const USD_BDT: &str = "USD_BDT";

/// Taka per dollar used when no `USD_BDT` row has been configured.
pub const DEFAULT_USD_BDT_RATE: Decimal = Decimal::from_parts(120, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub code: String,
    pub rate: Decimal,
}
