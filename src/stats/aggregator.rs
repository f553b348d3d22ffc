//! State Aggregator Module
//! Collapses the per-county table into one row per state with mean
//! cause-of-death rates for the curated age/cause pairs.

use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use crate::data::{
    is_numeric, AgeGroup, Cause, Dataset, FeatureKey, COUNTY_CODE_COLUMN, COUNTY_NAME_COLUMN,
    FIPS_COLUMN, STATE_ABBREV_COLUMN, STATE_CODE_COLUMN, STATE_NAME_COLUMN, STRATA_COLUMN,
};

/// Zero-padded 2-digit state identifier column of the summary.
pub const STATE_FIPS_COLUMN: &str = "State_FIPS";

/// Leading identity columns of the county table; everything after them
/// (except the derived FIPS column) is a rate column.
const IDENTITY_COLUMNS: [&str; 6] = [
    STATE_CODE_COLUMN,
    COUNTY_CODE_COLUMN,
    COUNTY_NAME_COLUMN,
    STATE_NAME_COLUMN,
    STATE_ABBREV_COLUMN,
    STRATA_COLUMN,
];

/// The age/cause pairs the summary reports. Ages outside B/C/D and the
/// Comp/BirthDef/Cancer/HeartDis families are not carried; HIV is only
/// recorded for the 25-44 bracket, suicide from 15 upward.
const SUMMARY_PAIRS: [(AgeGroup, Cause); 9] = [
    (AgeGroup::B, Cause::Injury),
    (AgeGroup::B, Cause::Homicide),
    (AgeGroup::C, Cause::Injury),
    (AgeGroup::C, Cause::Homicide),
    (AgeGroup::C, Cause::Suicide),
    (AgeGroup::D, Cause::Injury),
    (AgeGroup::D, Cause::Homicide),
    (AgeGroup::D, Cause::Suicide),
    (AgeGroup::D, Cause::Hiv),
];

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Source table is missing identifying column: {0}")]
    MissingColumn(String),
    #[error("Source table has no rows")]
    EmptyTable,
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// One summary row, shaped for the state-level choropleth renderer.
#[derive(Debug, Clone, Serialize)]
pub struct StateRow {
    pub state_fips: String,
    pub state_name: String,
    pub state_abbreviation: String,
    pub rates: BTreeMap<String, Option<f64>>,
}

/// Per-state summary table. Built once by [`StateAggregator::summarize`],
/// immutable afterwards; rows are ordered by state name.
#[derive(Debug)]
pub struct StateSummary {
    df: DataFrame,
}

impl StateSummary {
    /// The summary table: `State_FIPS`, state name, state abbreviation and
    /// the nine mean rate columns.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Summary rows as serializable records.
    pub fn rows(&self) -> PolarsResult<Vec<StateRow>> {
        let fips = self.df.column(STATE_FIPS_COLUMN)?.str()?;
        let names = self.df.column(STATE_NAME_COLUMN)?.str()?;
        let abbrevs = self.df.column(STATE_ABBREV_COLUMN)?.str()?;

        let mut rates_by_column = Vec::with_capacity(SUMMARY_PAIRS.len());
        for (age, cause) in SUMMARY_PAIRS {
            let name = summary_column(age, cause);
            let ca = self.df.column(name.as_str())?.f64()?;
            rates_by_column.push((name, ca));
        }

        let mut rows = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            let mut rates = BTreeMap::new();
            for (name, ca) in &rates_by_column {
                rates.insert(name.clone(), ca.get(i));
            }
            rows.push(StateRow {
                state_fips: fips.get(i).unwrap_or_default().to_string(),
                state_name: names.get(i).unwrap_or_default().to_string(),
                state_abbreviation: abbrevs.get(i).unwrap_or_default().to_string(),
                rates,
            });
        }
        Ok(rows)
    }
}

fn summary_column(age: AgeGroup, cause: Cause) -> String {
    format!("{}_{}", age.code(), cause.code())
}

/// Builds state-level summaries from a cleaned county table.
pub struct StateAggregator;

impl StateAggregator {
    /// Two-pass aggregation over the cleaned county table.
    ///
    /// Pass 1 groups counties by state name and takes the null-ignoring mean
    /// of every rate column, plus a representative state code and
    /// abbreviation (any row of the group serves; which one is unspecified).
    /// Pass 2 averages the per-ethnicity pass-1 columns down to the nine
    /// curated age/cause pairs. States come out in lexicographic state-name
    /// order. Either the whole summary is produced or an error; there is no
    /// partial output.
    pub fn summarize(dataset: &Dataset) -> Result<StateSummary, AggregateError> {
        let df = dataset.frame();
        for required in IDENTITY_COLUMNS {
            if !df.get_column_names().iter().any(|c| c.as_str() == required) {
                return Err(AggregateError::MissingColumn(required.to_string()));
            }
        }
        if df.height() == 0 {
            return Err(AggregateError::EmptyTable);
        }

        let rate_cols: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| {
                let name = c.name().as_str();
                is_numeric(c.dtype()) && name != FIPS_COLUMN && !IDENTITY_COLUMNS.contains(&name)
            })
            .map(|c| c.name().to_string())
            .collect();

        let mut aggs: Vec<Expr> = vec![
            col(STATE_CODE_COLUMN).last(),
            col(STATE_ABBREV_COLUMN).last(),
        ];
        aggs.extend(rate_cols.iter().map(|c| col(c.as_str()).mean()));

        let per_state = df
            .clone()
            .lazy()
            .group_by([col(STATE_NAME_COLUMN)])
            .agg(aggs)
            .sort([STATE_NAME_COLUMN], Default::default())
            .collect()?;

        let summary = Self::curate(&per_state, &rate_cols)?;
        info!(states = summary.height(), "built state summary");
        Ok(StateSummary { df: summary })
    }

    /// Pass 2: collapse ethnicity-qualified pass-1 columns into the nine
    /// age/cause outputs. A pair with no non-null contributing value for a
    /// state yields a null cell.
    fn curate(per_state: &DataFrame, rate_cols: &[String]) -> Result<DataFrame, AggregateError> {
        let height = per_state.height();

        let names = per_state.column(STATE_NAME_COLUMN)?.str()?;
        let abbrevs = per_state.column(STATE_ABBREV_COLUMN)?.str()?;
        let codes = per_state.column(STATE_CODE_COLUMN)?.cast(&DataType::Int64)?;
        let codes = codes.i64()?;

        let mut state_fips: Vec<Option<String>> = Vec::with_capacity(height);
        let mut state_names: Vec<Option<String>> = Vec::with_capacity(height);
        let mut state_abbrevs: Vec<Option<String>> = Vec::with_capacity(height);
        for i in 0..height {
            state_fips.push(codes.get(i).map(|c| format!("{:02}", c)));
            state_names.push(names.get(i).map(|s| s.to_string()));
            state_abbrevs.push(abbrevs.get(i).map(|s| s.to_string()));
        }

        let mut columns = vec![
            Column::new(STATE_FIPS_COLUMN.into(), state_fips),
            Column::new(STATE_NAME_COLUMN.into(), state_names),
            Column::new(STATE_ABBREV_COLUMN.into(), state_abbrevs),
        ];

        for (age, cause) in SUMMARY_PAIRS {
            let matching: Vec<&String> = rate_cols
                .iter()
                .filter(|name| {
                    FeatureKey::parse(name.as_str())
                        .map(|key| key.age == age && key.cause == cause)
                        .unwrap_or(false)
                })
                .collect();

            let mut contributors = Vec::with_capacity(matching.len());
            for name in &matching {
                contributors.push(per_state.column(name.as_str())?.f64()?);
            }

            let mut means: Vec<Option<f64>> = Vec::with_capacity(height);
            for i in 0..height {
                let values: Vec<f64> = contributors.iter().filter_map(|ca| ca.get(i)).collect();
                means.push(if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                });
            }
            columns.push(Column::new(summary_column(age, cause).into(), means));
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset_from(csv: &str) -> Dataset {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(csv.as_bytes()).unwrap();
        let mut dataset = Dataset::load(tmp.path()).unwrap();
        dataset.preproc().unwrap();
        dataset
    }

    const TWO_STATES: &str = "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,Strata_ID_Number,D_Wh_Homicide,D_Bl_Homicide,C_Wh_Suicide
48,201,Harris,Texas,TX,1,10.0,20.0,7.0
48,113,Dallas,Texas,TX,2,-9999,-9999,9.0
6,37,Los Angeles,California,CA,3,4.0,6.0,-9999
";

    #[test]
    fn summary_has_one_row_per_state_in_name_order() {
        let summary = StateAggregator::summarize(&dataset_from(TWO_STATES)).unwrap();
        let df = summary.frame();
        assert_eq!(df.height(), 2);
        // 3 identity columns + 9 curated rate columns.
        assert_eq!(df.width(), 12);

        let names: Vec<&str> = df
            .column(STATE_NAME_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(names, ["California", "Texas"]);

        let fips: Vec<&str> = df
            .column(STATE_FIPS_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(fips, ["06", "48"]);
    }

    #[test]
    fn ethnicity_variants_average_into_one_cause_column() {
        // Texas: D_Wh_Homicide mean 10 (sentinel row ignored), D_Bl_Homicide
        // mean 20, so the combined D_Homicide is 15.
        let summary = StateAggregator::summarize(&dataset_from(TWO_STATES)).unwrap();
        let homicide = summary.frame().column("D_Homicide").unwrap();
        let homicide = homicide.f64().unwrap();
        assert_eq!(homicide.get(1), Some(15.0));
        assert_eq!(homicide.get(0), Some(5.0));
    }

    #[test]
    fn pairs_without_data_yield_null_not_zero() {
        let summary = StateAggregator::summarize(&dataset_from(TWO_STATES)).unwrap();
        let df = summary.frame();

        // No B-bracket columns exist at all.
        assert_eq!(df.column("B_Injury").unwrap().null_count(), 2);

        // C_Wh_Suicide exists but California's only value was a sentinel.
        let suicide = df.column("C_Suicide").unwrap();
        let suicide = suicide.f64().unwrap();
        assert_eq!(suicide.get(0), None);
        assert_eq!(suicide.get(1), Some(8.0));
    }

    #[test]
    fn rows_serialize_with_the_nine_curated_rates() {
        let summary = StateAggregator::summarize(&dataset_from(TWO_STATES)).unwrap();
        let rows = summary.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].state_name, "Texas");
        assert_eq!(rows[1].state_abbreviation, "TX");
        assert_eq!(rows[1].rates.len(), 9);
        assert_eq!(rows[1].rates["D_Homicide"], Some(15.0));
        assert_eq!(rows[1].rates["D_HIV"], None);
    }

    #[test]
    fn missing_identity_column_fails() {
        let csv = "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,D_Wh_Homicide
48,201,Harris,Texas,TX,10.0
";
        let err = StateAggregator::summarize(&dataset_from(csv)).unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(c) if c == STRATA_COLUMN));
    }

    #[test]
    fn empty_table_fails() {
        let csv = "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,Strata_ID_Number,D_Wh_Homicide
";
        let err = StateAggregator::summarize(&dataset_from(csv)).unwrap_err();
        assert!(matches!(err, AggregateError::EmptyTable));
    }
}
