pub mod calculations;
pub mod db;
pub mod models;
pub mod review;
pub mod slabs;

pub use calculations::{
    DEFAULT_FISCAL_YEAR, ProgressiveTaxEngine, SlabConfigError, SlabTable, TaxBreakdownLine,
    TaxResult, TradeTaxResult,
};
pub use db::repository::{LevyRepository, RepositoryError};
pub use models::*;
pub use review::{Approval, ReviewError, ReviewWorkflow};
pub use slabs::{SlabResolutionError, resolve_slab_table};
