//! Data module - CSV loading, cleaning and feature lookup

mod dataset;
mod feature;
mod loader;

pub use dataset::{
    Dataset, LookupError, PreprocessError, COUNTY_CODE_COLUMN, COUNTY_NAME_COLUMN, FIPS_COLUMN,
    STATE_ABBREV_COLUMN, STATE_CODE_COLUMN, STATE_NAME_COLUMN, STRATA_COLUMN,
};
pub use feature::{AgeGroup, Cause, Ethnicity, FeatureKey, SelectorOption};
pub use loader::LoadError;

pub(crate) use dataset::is_numeric;
