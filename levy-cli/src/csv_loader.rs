//! CSV loader for batch tax calculation input.
//!
//! ## CSV Format
//!
//! Columns are matched by header name, so their order does not matter.
//!
//! | Column          | Required | Type    | Notes                                        |
//! |-----------------|----------|---------|----------------------------------------------|
//! | `total_income`  | yes      | decimal | e.g. `750000.00`                             |
//! | `total_expense` | yes      | decimal |                                              |
//! | `fiscal_year`   | no       | string  | `YYYY-YYYY`; empty uses the configured year  |
//!
//! ```csv
//! total_income,total_expense,fiscal_year
//! 500000,0,2026-2027
//! 2000000,150000,
//! ```
use std::path::Path;

use levy_core::FiscalYear;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    total_income: Decimal,
    total_expense: Decimal,
    #[serde(default)]
    fiscal_year: Option<String>,
}

/// One row of calculator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxInput {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub fiscal_year: Option<String>,
}

/// Errors that can occur while loading tax input CSV data.
#[derive(Debug, thiserror::Error)]
pub enum TaxInputCsvError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, a missing required column, or a non-numeric amount.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// `row` is 1-based, not counting the header.
    #[error("invalid fiscal year '{label}' on row {row}")]
    InvalidFiscalYear { label: String, row: usize },
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<TaxInput, TaxInputCsvError> {
    let fiscal_year = match row.fiscal_year.filter(|label| !label.is_empty()) {
        Some(label) => {
            let year = FiscalYear::from_label(&label).ok_or(TaxInputCsvError::InvalidFiscalYear {
                label,
                row: row_number,
            })?;
            Some(year.label)
        }
        None => None,
    };

    Ok(TaxInput {
        total_income: row.total_income,
        total_expense: row.total_expense,
        fiscal_year,
    })
}

/// Parse CSV text and return the rows in file order.
pub fn load_from_str(input: &str) -> Result<Vec<TaxInput>, TaxInputCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<TaxInput>, TaxInputCsvError> {
    let contents = std::fs::read_to_string(path).map_err(|source| TaxInputCsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    // -----------------------------------------------------------------------
    // Required columns only
    // -----------------------------------------------------------------------
    #[test]
    fn test_minimal_csv_parses_required_fields() {
        let csv = "total_income,total_expense\n500000,0\n";

        let inputs = load_from_str(csv).expect("should parse minimal CSV");

        assert_eq!(
            inputs,
            vec![TaxInput {
                total_income: dec!(500000),
                total_expense: dec!(0),
                fiscal_year: None,
            }]
        );
    }

    // -----------------------------------------------------------------------
    // Optional fiscal year column
    // -----------------------------------------------------------------------
    #[test]
    fn test_fiscal_year_present_and_empty() {
        let csv = "\
total_income,total_expense,fiscal_year
500000,0,2025-2026
2000000,150000,
";
        let inputs = load_from_str(csv).expect("should parse");

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].fiscal_year.as_deref(), Some("2025-2026"));
        assert_eq!(inputs[1].fiscal_year, None);
        assert_eq!(inputs[1].total_expense, dec!(150000));
    }

    #[test]
    fn test_invalid_fiscal_year_reports_row() {
        let csv = "\
total_income,total_expense,fiscal_year
1,1,2025-2026
2,2,2025
";
        match load_from_str(csv).unwrap_err() {
            TaxInputCsvError::InvalidFiscalYear { label, row } => {
                assert_eq!(label, "2025");
                assert_eq!(row, 2);
            }
            other => panic!("expected InvalidFiscalYear, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // Structural errors
    // -----------------------------------------------------------------------
    #[test]
    fn test_missing_required_column_returns_parse_error() {
        let csv = "total_income\n500000\n";

        let result = load_from_str(csv);

        assert!(matches!(result, Err(TaxInputCsvError::Parse(_))));
    }

    #[test]
    fn test_non_numeric_amount_returns_parse_error() {
        let csv = "total_income,total_expense\nlots,0\n";

        let result = load_from_str(csv);

        assert!(matches!(result, Err(TaxInputCsvError::Parse(_))));
    }

    #[test]
    fn test_header_only_returns_empty_vec() {
        let inputs = load_from_str("total_income,total_expense\n").expect("header-only is valid");

        assert!(inputs.is_empty());
    }

    // -----------------------------------------------------------------------
    // Tolerance
    // -----------------------------------------------------------------------
    #[test]
    fn test_whitespace_and_column_order() {
        let csv = "\
fiscal_year , total_expense , total_income
2026-2027 , 25000.50 , 750000.75
";
        let inputs = load_from_str(csv).expect("should tolerate whitespace and order");

        assert_eq!(inputs[0].total_income, dec!(750000.75));
        assert_eq!(inputs[0].total_expense, dec!(25000.50));
        assert_eq!(inputs[0].fiscal_year.as_deref(), Some("2026-2027"));
    }

    #[test]
    fn test_negative_amounts_are_passed_through() {
        let csv = "total_income,total_expense\n-100,-5\n";

        let inputs = load_from_str(csv).expect("should parse");

        assert_eq!(inputs[0].total_income, dec!(-100));
    }
}
