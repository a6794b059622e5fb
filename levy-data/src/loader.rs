use std::collections::BTreeMap;
use std::io::Read;

use levy_core::calculations::{SlabConfigError, SlabRow, SlabTable};
use levy_core::slabs::{SlabResolutionError, replace_slab_table};
use levy_core::{FiscalYear, LevyRepository, RepositoryError};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading slab tables.
#[derive(Debug, Error)]
pub enum SlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid fiscal year label '{0}' (expected YYYY-YYYY)")]
    InvalidFiscalYear(String),

    #[error("Invalid slab table for {fiscal_year}: {source}")]
    InvalidSlabs {
        fiscal_year: String,
        #[source]
        source: SlabConfigError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SlabLoaderError {
    fn from(err: csv::Error) -> Self {
        SlabLoaderError::CsvParse(err.to_string())
    }
}

impl From<SlabResolutionError> for SlabLoaderError {
    fn from(err: SlabResolutionError) -> Self {
        match err {
            SlabResolutionError::Repository(e) => SlabLoaderError::Repository(e),
            SlabResolutionError::InvalidSlabConfig {
                fiscal_year,
                source,
            } => SlabLoaderError::InvalidSlabs {
                fiscal_year,
                source,
            },
        }
    }
}

/// A single record from the slab CSV file.
///
/// - `fiscal_year`: the label the slab applies to (e.g., 2026-2027)
/// - `lower_bound`: where the slab starts
/// - `upper_bound`: where it ends (empty for the open top slab)
/// - `rate`: the marginal rate as a fraction (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlabRecord {
    pub fiscal_year: String,
    pub lower_bound: f64,
    #[serde(deserialize_with = "deserialize_optional_f64")]
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

impl From<&SlabRecord> for SlabRow {
    fn from(record: &SlabRecord) -> Self {
        SlabRow {
            lower_bound: record.lower_bound,
            upper_bound: record.upper_bound,
            rate: record.rate,
        }
    }
}

fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for slab tables from CSV files.
///
/// The loader writes through [`LevyRepository`], so it works with any
/// registered backend.
pub struct SlabLoader;

impl SlabLoader {
    /// Parse slab records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups records by fiscal year and validates each group as a complete
    /// schedule.
    ///
    /// Rows within a year may appear in any order; they are sorted by lower
    /// bound before validation.
    pub fn tables(
        records: &[SlabRecord],
    ) -> Result<Vec<(FiscalYear, SlabTable)>, SlabLoaderError> {
        let mut groups: BTreeMap<&str, Vec<SlabRow>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.fiscal_year.trim())
                .or_default()
                .push(SlabRow::from(record));
        }

        let mut tables = Vec::with_capacity(groups.len());
        for (label, mut rows) in groups {
            let fiscal_year = FiscalYear::from_label(label)
                .ok_or_else(|| SlabLoaderError::InvalidFiscalYear(label.to_string()))?;

            rows.sort_by(|a, b| a.lower_bound.total_cmp(&b.lower_bound));
            let invalid = |source: SlabConfigError| SlabLoaderError::InvalidSlabs {
                fiscal_year: fiscal_year.label.clone(),
                source,
            };
            let table = SlabTable::try_from(rows.as_slice()).map_err(invalid)?;
            let table = SlabTable::new_strict(table.slabs().to_vec()).map_err(invalid)?;

            tables.push((fiscal_year, table));
        }

        Ok(tables)
    }

    /// Load slab records into the database.
    ///
    /// Every fiscal year in `records` is validated before anything is
    /// written. Then, per year:
    /// 1. Upsert the fiscal year row
    /// 2. Replace the slabs stored for that year in one write
    ///
    /// Loading the same file twice produces the same result.
    pub async fn load(
        repo: &dyn LevyRepository,
        records: &[SlabRecord],
    ) -> Result<usize, SlabLoaderError> {
        let tables = Self::tables(records)?;
        let mut inserted = 0;

        for (fiscal_year, table) in &tables {
            repo.upsert_fiscal_year(fiscal_year).await?;
            replace_slab_table(repo, &fiscal_year.label, table).await?;
            info!(fiscal_year = %fiscal_year.label, slabs = table.len(), "loaded slab table");
            inserted += table.len();
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"fiscal_year,lower_bound,upper_bound,rate
2025-2026,0,350000,0
2025-2026,350000,450000,0.05
2025-2026,450000,750000,0.10
2025-2026,750000,1100000,0.15
2025-2026,1100000,1600000,0.20
2025-2026,1600000,,0.25
"#;

    #[test]
    fn test_parse_csv_single_slab() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n2025-2026,0,350000,0";

        let records = SlabLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![SlabRecord {
                fiscal_year: "2025-2026".to_string(),
                lower_bound: 0.0,
                upper_bound: Some(350000.0),
                rate: 0.0,
            }]
        );
    }

    #[test]
    fn test_parse_csv_open_top_slab() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n2025-2026,1600000, ,0.25";

        let records = SlabLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].upper_bound, None);
        assert_eq!(records[0].rate, 0.25);
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "fiscal_year,lower_bound\n2025-2026,0";

        let err = SlabLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let SlabLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n";

        let records = SlabLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    #[test]
    fn test_tables_builds_default_schedule() {
        let records = SlabLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let tables = SlabLoader::tables(&records).expect("Should validate");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0.label, "2025-2026");
        assert_eq!(tables[0].1, SlabTable::bangladesh_default());
    }

    #[test]
    fn test_tables_sorts_rows_within_a_year() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n\
                   2025-2026,100000,,0.1\n\
                   2025-2026,0,100000,0";
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let tables = SlabLoader::tables(&records).expect("Should validate");

        assert_eq!(tables[0].1.slabs()[0].from, dec!(0));
        assert_eq!(tables[0].1.slabs()[1].from, dec!(100000));
    }

    #[test]
    fn test_tables_rejects_bad_label() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n2025/26,0,,0.1";
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let result = SlabLoader::tables(&records);

        assert!(matches!(result, Err(SlabLoaderError::InvalidFiscalYear(ref l)) if l == "2025/26"));
    }

    #[test]
    fn test_tables_rejects_gap() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n\
                   2025-2026,0,100000,0\n\
                   2025-2026,200000,,0.1";
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let result = SlabLoader::tables(&records);

        match result {
            Err(SlabLoaderError::InvalidSlabs {
                fiscal_year,
                source: SlabConfigError::NotContiguous { index, .. },
            }) => {
                assert_eq!(fiscal_year, "2025-2026");
                assert_eq!(index, 1);
            }
            other => panic!("expected NotContiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_tables_rejects_nan_rate() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n2025-2026,0,,NaN";
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let result = SlabLoader::tables(&records);

        assert!(matches!(
            result,
            Err(SlabLoaderError::InvalidSlabs {
                source: SlabConfigError::NonFinite { index: 0, field: "rate" },
                ..
            })
        ));
    }

    #[test]
    fn test_tables_rejects_bounded_top_slab() {
        let csv = "fiscal_year,lower_bound,upper_bound,rate\n2025-2026,0,100000,0";
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let result = SlabLoader::tables(&records);

        assert!(matches!(
            result,
            Err(SlabLoaderError::InvalidSlabs {
                source: SlabConfigError::BoundedTopSlab { .. },
                ..
            })
        ));
    }
}
