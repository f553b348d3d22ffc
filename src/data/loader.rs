//! CSV Loader Module
//! Reads the delimited CHSI source files into Polars DataFrames.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Load a comma-delimited file with a header row.
///
/// A row whose field count disagrees with the header surfaces as a
/// `LoadError::Csv`; nothing is skipped silently.
pub fn load_csv(path: &Path) -> Result<DataFrame, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    info!(
        rows = df.height(),
        columns = df.width(),
        path = %path.display(),
        "loaded CSV"
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let err = load_csv(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn loads_header_and_rows() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "a,b\n1,2.5\n3,4.5").unwrap();
        let df = load_csv(tmp.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn malformed_row_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "a,b\n1,2\n3,4,5").unwrap();
        assert!(matches!(load_csv(tmp.path()), Err(LoadError::Csv(_))));
    }
}
