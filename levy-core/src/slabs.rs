//! Loading the slab table configured for a fiscal year.

use thiserror::Error;
use tracing::debug;

use crate::calculations::{SlabConfigError, SlabTable};
use crate::db::{LevyRepository, RepositoryError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabResolutionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("invalid slab configuration for {fiscal_year}: {source}")]
    InvalidSlabConfig {
        fiscal_year: String,
        #[source]
        source: SlabConfigError,
    },
}

/// Loads and validates the slabs stored for `fiscal_year`.
///
/// Returns `Ok(None)` when the store has no slabs for that year, so the
/// caller can fall back to its default table.
pub async fn resolve_slab_table(
    repo: &dyn LevyRepository,
    fiscal_year: &str,
) -> Result<Option<SlabTable>, SlabResolutionError> {
    let stored = repo.get_tax_slabs(fiscal_year).await?;
    if stored.is_empty() {
        debug!(fiscal_year, "no stored slabs; using default table");
        return Ok(None);
    }

    let table = SlabTable::from_tax_slabs(&stored).map_err(|source| {
        SlabResolutionError::InvalidSlabConfig {
            fiscal_year: fiscal_year.to_string(),
            source,
        }
    })?;

    debug!(fiscal_year, slabs = table.len(), "resolved stored slab table");
    Ok(Some(table))
}

/// Replaces every slab stored for `fiscal_year` with `table`.
///
/// The table must pass [`SlabTable::new_strict`]; administrators should not
/// be able to publish a schedule with gaps. A failed write leaves the year's
/// previous schedule in place.
pub async fn replace_slab_table(
    repo: &dyn LevyRepository,
    fiscal_year: &str,
    table: &SlabTable,
) -> Result<(), SlabResolutionError> {
    SlabTable::new_strict(table.slabs().to_vec()).map_err(|source| {
        SlabResolutionError::InvalidSlabConfig {
            fiscal_year: fiscal_year.to_string(),
            source,
        }
    })?;

    repo.replace_tax_slabs(fiscal_year, &table.to_tax_slabs(fiscal_year))
        .await?;
    debug!(fiscal_year, slabs = table.len(), "published slab table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxSlab;
    use crate::calculations::Slab;
    use crate::db::memory::MemoryRepository;

    fn stored(
        from: rust_decimal::Decimal,
        to: Option<rust_decimal::Decimal>,
        rate: rust_decimal::Decimal,
    ) -> TaxSlab {
        TaxSlab {
            fiscal_year: "2025-2026".to_string(),
            lower_bound: from,
            upper_bound: to,
            rate,
        }
    }

    #[tokio::test]
    async fn resolve_returns_none_without_stored_slabs() {
        let repo = MemoryRepository::default();

        let result = resolve_slab_table(&repo, "2025-2026").await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn resolve_orders_stored_slabs() {
        let repo = MemoryRepository::default();
        repo.replace_tax_slabs(
            "2025-2026",
            &[
                stored(dec!(300000), None, dec!(0.1)),
                stored(dec!(0), Some(dec!(300000)), dec!(0)),
            ],
        )
        .await
        .unwrap();

        let table = resolve_slab_table(&repo, "2025-2026").await.unwrap().unwrap();

        assert_eq!(
            table.slabs(),
            &[
                Slab::new(dec!(0), Some(dec!(300000)), dec!(0)),
                Slab::new(dec!(300000), None, dec!(0.1)),
            ]
        );
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_stored_slabs() {
        let repo = MemoryRepository::default();
        repo.replace_tax_slabs("2025-2026", &[stored(dec!(0), None, dec!(5))])
            .await
            .unwrap();

        let result = resolve_slab_table(&repo, "2025-2026").await;

        assert_eq!(
            result,
            Err(SlabResolutionError::InvalidSlabConfig {
                fiscal_year: "2025-2026".to_string(),
                source: SlabConfigError::RateOutOfRange {
                    index: 0,
                    rate: dec!(5)
                },
            })
        );
    }

    #[tokio::test]
    async fn replace_overwrites_existing_year() {
        let repo = MemoryRepository::default();
        repo.replace_tax_slabs("2025-2026", &[stored(dec!(0), None, dec!(0.3))])
            .await
            .unwrap();

        replace_slab_table(&repo, "2025-2026", &SlabTable::bangladesh_default())
            .await
            .unwrap();

        let slabs = repo.get_tax_slabs("2025-2026").await.unwrap();
        assert_eq!(slabs.len(), 6);
        assert_eq!(slabs[5].rate, dec!(0.25));
    }

    #[tokio::test]
    async fn replace_rejects_table_with_gap() {
        let repo = MemoryRepository::default();
        let gapped = SlabTable::new(vec![
            Slab::new(dec!(0), Some(dec!(100)), dec!(0)),
            Slab::new(dec!(200), None, dec!(0.1)),
        ])
        .unwrap();

        let result = replace_slab_table(&repo, "2025-2026", &gapped).await;

        assert!(matches!(
            result,
            Err(SlabResolutionError::InvalidSlabConfig { .. })
        ));
        assert!(repo.get_tax_slabs("2025-2026").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_table_keeps_previous_schedule() {
        let repo = MemoryRepository::default();
        replace_slab_table(&repo, "2025-2026", &SlabTable::bangladesh_default())
            .await
            .unwrap();
        let gapped = SlabTable::new(vec![
            Slab::new(dec!(0), Some(dec!(100)), dec!(0)),
            Slab::new(dec!(200), None, dec!(0.1)),
        ])
        .unwrap();

        let result = replace_slab_table(&repo, "2025-2026", &gapped).await;

        assert!(result.is_err());
        assert_eq!(
            resolve_slab_table(&repo, "2025-2026").await,
            Ok(Some(SlabTable::bangladesh_default()))
        );
    }
}
