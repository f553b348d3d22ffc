//! CHSI Atlas - cause-of-death data explorer core
//!
//! Loads the county table, runs the default county-level query and the
//! state-level summary, and emits both as JSON for the chart layer.

use anyhow::Result;
use chsi_atlas::data::{AgeGroup, Cause, Dataset, Ethnicity, FeatureKey};
use chsi_atlas::stats::StateAggregator;
use serde_json::json;
use std::env;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Selection shown before the user touches any dropdown.
const DEFAULT_SELECTION: (AgeGroup, Ethnicity, Cause) =
    (AgeGroup::A, Ethnicity::Wh, Cause::Comp);

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "./data/LEADINGCAUSESOFDEATH.csv".to_string());

    let mut dataset = Dataset::load(Path::new(&path))?;
    dataset.preproc()?;
    info!(rows = dataset.height(), "cause-of-death table ready");

    // Combinations without a backing column fall back to the default
    // selection rather than erroring at the user.
    let (age, ethnicity, cause) = (AgeGroup::D, Ethnicity::Hi, Cause::Hiv);
    let (age, ethnicity, cause) = if dataset.has_column(age, ethnicity, cause) {
        (age, ethnicity, cause)
    } else {
        warn!(
            key = %FeatureKey::new(age, ethnicity, cause).column_name(),
            "selection has no backing column, using default"
        );
        DEFAULT_SELECTION
    };
    let key = FeatureKey::new(age, ethnicity, cause);

    let projection = dataset.lookup(age, ethnicity, cause)?;
    let texas = Dataset::filter_by_fips_prefix(&projection, "48")?;
    let texas = Dataset::fill_missing(&texas, 0.0)?;
    let counties = Dataset::column_pairs(&texas, &key.column_name())?;

    // Summary failure leaves the county-level view available.
    let states = match StateAggregator::summarize(&dataset) {
        Ok(summary) => Some(summary.rows()?),
        Err(err) => {
            warn!(%err, "state summary unavailable");
            None
        }
    };

    let payload = json!({
        "selectors": {
            "age": AgeGroup::options(),
            "ethnicity": Ethnicity::options(),
            "cause": Cause::options(),
        },
        "county_rates": {
            "column": key.column_name(),
            "values": counties,
        },
        "state_summary": states,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}
