mod loader;
mod rate_sheet;

pub use loader::{SlabLoader, SlabLoaderError, SlabRecord};
pub use rate_sheet::{CategoryRecord, CountryRecord, RateSheetLoader, RateSheetLoaderError};
