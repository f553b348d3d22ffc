//! CHSI Atlas - cause-of-death data explorer core
//!
//! Loads a CHSI leading-causes-of-death CSV, cleans it, and answers the
//! county-level and state-level queries a chart layer renders: feature-column
//! lookups keyed by age/ethnicity/cause, FIPS-prefix filters, and a per-state
//! mean-rate summary.

pub mod data;
pub mod stats;
