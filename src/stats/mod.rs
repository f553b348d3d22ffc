//! Stats module - state-level aggregation

mod aggregator;

pub use aggregator::{AggregateError, StateAggregator, StateRow, StateSummary, STATE_FIPS_COLUMN};
