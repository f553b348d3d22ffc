//! Dataset Module
//! Owns the cleaned cause-of-death table and answers column lookups,
//! FIPS-prefix filters and missing-value fills against it.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::feature::{AgeGroup, Cause, Ethnicity, FeatureKey};
use super::loader::{load_csv, LoadError};

/// Derived 5-digit county identifier column.
pub const FIPS_COLUMN: &str = "FIPS";
/// Numeric state code source column.
pub const STATE_CODE_COLUMN: &str = "State_FIPS_Code";
/// Numeric county code source column.
pub const COUNTY_CODE_COLUMN: &str = "County_FIPS_Code";
pub const COUNTY_NAME_COLUMN: &str = "CHSI_County_Name";
pub const STATE_NAME_COLUMN: &str = "CHSI_State_Name";
pub const STATE_ABBREV_COLUMN: &str = "CHSI_State_Abbreviation";
pub const STRATA_COLUMN: &str = "Strata_ID_Number";

/// Marker substring of confidence-interval columns dropped during cleaning.
const CI_MARKER: &str = "CI_";

/// Reserved "value not available" codes in the source data, distinct from a
/// true zero. Matched by exact equality, no tolerance.
const FLOAT_SENTINELS: [f64; 8] = [
    -1.0, -1111.0, -1111.1, -2.0, -2222.0, -2222.2, -9999.0, -9989.9,
];
const INT_SENTINELS: [i64; 5] = [-1, -1111, -2, -2222, -9999];

/// Numeric dtypes eligible for sentinel substitution and missing-value fill.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Required source column missing: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("No data column for selection: {0}")]
    ColumnNotFound(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// In-memory CHSI cause-of-death table.
///
/// Loaded once from a CSV, cleaned once via [`Dataset::preproc`], read-only
/// afterwards.
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    /// Read a CHSI CSV file into a new dataset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let df = load_csv(path.as_ref())?;
        Ok(Self { df })
    }

    /// Clean the raw table in place.
    ///
    /// Drops confidence-interval columns, nulls out sentinel codes in every
    /// numeric column and derives the 5-digit `FIPS` column from the state
    /// and county code columns. Running it again on an already-cleaned table
    /// rederives `FIPS` without error.
    pub fn preproc(&mut self) -> Result<(), PreprocessError> {
        let ci_cols: Vec<String> = self
            .df
            .get_column_names()
            .iter()
            .filter(|c| c.contains(CI_MARKER))
            .map(|c| c.to_string())
            .collect();
        if !ci_cols.is_empty() {
            debug!(dropped = ci_cols.len(), "dropping confidence-interval columns");
            self.df = self.df.drop_many(ci_cols);
        }

        let names: Vec<String> = self
            .df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        for name in &names {
            let dtype = self.df.column(name)?.dtype().clone();
            let cleaned = match dtype {
                DataType::Float32 | DataType::Float64 => {
                    let values = self.df.column(name)?.cast(&DataType::Float64)?;
                    let ca = values.f64()?;
                    let nulled: Vec<Option<f64>> = ca
                        .into_iter()
                        .map(|v| v.filter(|x| !FLOAT_SENTINELS.iter().any(|s| s == x)))
                        .collect();
                    Some(Column::new(name.as_str().into(), nulled))
                }
                DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                    let values = self.df.column(name)?.cast(&DataType::Int64)?;
                    let ca = values.i64()?;
                    let nulled: Vec<Option<i64>> = ca
                        .into_iter()
                        .map(|v| v.filter(|x| !INT_SENTINELS.contains(x)))
                        .collect();
                    Some(Column::new(name.as_str().into(), nulled))
                }
                _ => None,
            };
            if let Some(column) = cleaned {
                self.df.with_column(column)?;
            }
        }

        let fips = self.derive_fips()?;
        self.df.with_column(Column::new(FIPS_COLUMN.into(), fips))?;

        info!(
            rows = self.df.height(),
            columns = self.df.width(),
            "preprocessed cause-of-death table"
        );
        Ok(())
    }

    fn derive_fips(&self) -> Result<Vec<Option<String>>, PreprocessError> {
        for required in [STATE_CODE_COLUMN, COUNTY_CODE_COLUMN] {
            if !self.has_raw_column(required) {
                return Err(PreprocessError::MissingColumn(required.to_string()));
            }
        }

        let state = self.df.column(STATE_CODE_COLUMN)?.cast(&DataType::Int64)?;
        let county = self.df.column(COUNTY_CODE_COLUMN)?.cast(&DataType::Int64)?;
        let state = state.i64()?;
        let county = county.i64()?;

        Ok((0..self.df.height())
            .map(|i| match (state.get(i), county.get(i)) {
                (Some(s), Some(c)) => Some(format!("{:02}{:03}", s, c)),
                _ => None,
            })
            .collect())
    }

    /// True iff the selection addresses an existing rate column.
    ///
    /// Not every age bracket has every cause of death recorded; the chart
    /// layer calls this before `lookup` and falls back to a known-good
    /// selection instead of surfacing an error to the user.
    pub fn has_column(&self, age: AgeGroup, ethnicity: Ethnicity, cause: Cause) -> bool {
        self.has_raw_column(&FeatureKey::new(age, ethnicity, cause).column_name())
    }

    /// Two-column `[FIPS, <age>_<ethnicity>_<cause>]` projection.
    pub fn lookup(
        &self,
        age: AgeGroup,
        ethnicity: Ethnicity,
        cause: Cause,
    ) -> Result<DataFrame, LookupError> {
        let key = FeatureKey::new(age, ethnicity, cause).column_name();
        if !self.has_raw_column(&key) {
            return Err(LookupError::ColumnNotFound(key));
        }
        Ok(self.df.select([FIPS_COLUMN, key.as_str()])?)
    }

    /// Restrict a projection to rows whose FIPS starts with `prefix`.
    ///
    /// Order-preserving; a state's 2-digit code selects all of its counties.
    pub fn filter_by_fips_prefix(rows: &DataFrame, prefix: &str) -> PolarsResult<DataFrame> {
        rows.clone()
            .lazy()
            .filter(col(FIPS_COLUMN).str().starts_with(lit(prefix)))
            .collect()
    }

    /// Replace nulls in every numeric column of a projection with `value`.
    ///
    /// Zero-filling erases the distinction between "county reports zero" and
    /// "county has no data"; acceptable for rendering, not for analysis.
    pub fn fill_missing(rows: &DataFrame, value: f64) -> PolarsResult<DataFrame> {
        let mut out = rows.clone();
        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        for name in &names {
            if !is_numeric(out.column(name)?.dtype()) {
                continue;
            }
            let values = out.column(name)?.cast(&DataType::Float64)?;
            let ca = values.f64()?;
            let filled: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(value)).collect();
            out.with_column(Column::new(name.as_str().into(), filled))?;
        }
        Ok(out)
    }

    /// Flatten a projection into `(FIPS, value)` pairs for the choropleth
    /// renderer. Rows without a FIPS code are skipped.
    pub fn column_pairs(
        rows: &DataFrame,
        column: &str,
    ) -> PolarsResult<Vec<(String, Option<f64>)>> {
        let fips = rows.column(FIPS_COLUMN)?.str()?;
        let values = rows.column(column)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut pairs = Vec::with_capacity(rows.height());
        for i in 0..rows.height() {
            if let Some(code) = fips.get(i) {
                pairs.push((code.to_string(), values.get(i)));
            }
        }
        Ok(pairs)
    }

    /// Column names of the underlying table.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Number of rows in the underlying table.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// The underlying cleaned table.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    fn has_raw_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }
}
