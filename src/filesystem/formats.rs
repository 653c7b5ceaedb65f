//! Reference CSV data file format.
//!
//! Covers the common case of delimited logger output with one header row
//! and an ISO8601 timestamp column. Groups with other layouts implement
//! [`DataFileFormat`] themselves.

use super::datafile::{DataFile, DataFileFormat};
use super::period::{DateSlicer, FileFreq};
use crate::error::{Result, UataqError};
use crate::models::TIME_COLUMN;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Description of a delimited file variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvFormat {
    pub name: String,
    pub logger: String,
    pub date_slicer: DateSlicer,
    pub file_freq: FileFreq,
    pub ext: String,
    /// Column holding the observation timestamp, renamed to `Time_UTC`
    pub time_column: String,
    /// Lines to skip before the header row
    pub skip_rows: usize,
    pub separator: u8,
}

impl CsvFormat {
    pub fn new(
        name: impl Into<String>,
        logger: impl Into<String>,
        date_slicer: DateSlicer,
        file_freq: FileFreq,
    ) -> Self {
        Self {
            name: name.into(),
            logger: logger.into(),
            date_slicer,
            file_freq,
            ext: ".csv".to_string(),
            time_column: TIME_COLUMN.to_string(),
            skip_rows: 0,
            separator: b',',
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    pub fn with_time_column(mut self, time_column: impl Into<String>) -> Self {
        self.time_column = time_column.into();
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    fn read(&self, file: &DataFile) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_skip_rows(self.skip_rows)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.separator)
                    .with_try_parse_dates(true),
            )
            .try_into_reader_with_file_path(Some(file.path().to_path_buf()))?
            .finish()
    }
}

impl DataFileFormat for CsvFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn logger(&self) -> &str {
        &self.logger
    }

    fn date_slicer(&self) -> DateSlicer {
        self.date_slicer
    }

    fn file_freq(&self) -> FileFreq {
        self.file_freq
    }

    fn ext(&self) -> &str {
        &self.ext
    }

    fn parse(&self, file: &DataFile) -> Result<DataFrame> {
        debug!("Reading {} as {}", file, self.name);
        let mut df = self
            .read(file)
            .map_err(|e| UataqError::parser(file.path(), e.to_string()))?;

        if self.time_column != TIME_COLUMN {
            df.rename(&self.time_column, TIME_COLUMN.into())
                .map_err(|e| UataqError::parser(file.path(), e.to_string()))?;
        }

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn monthly() -> CsvFormat {
        CsvFormat::new("MonthlyCsv", "cr1000", DateSlicer::range(0, 7), FileFreq::Month)
    }

    #[test]
    fn test_parse_csv_with_time_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("2020_01.csv");
        fs::write(
            &path,
            "Time_UTC,CO2_ppm\n2020-01-01 00:00:00,410.5\n2020-01-01 01:00:00,411.0\n",
        )
        .unwrap();

        let file = DataFile::new(&path, Arc::new(monthly())).unwrap();
        let df = file.parse().unwrap();

        assert_eq!(df.height(), 2);
        assert!(matches!(
            df.column(TIME_COLUMN).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_parse_renames_time_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("2020_01.dat");
        fs::write(
            &path,
            "# logger header\ntimestamp;temp\n2020-01-01 00:00:00;1.5\n",
        )
        .unwrap();

        let format = monthly()
            .with_ext(".dat")
            .with_time_column("timestamp")
            .with_skip_rows(1)
            .with_separator(b';');
        let file = DataFile::new(&path, Arc::new(format)).unwrap();
        let df = file.parse().unwrap();

        assert!(df.column(TIME_COLUMN).is_ok());
        assert!(df.column("timestamp").is_err());
    }

    #[test]
    fn test_missing_file_is_parser_error() {
        let file = DataFile::new("/nonexistent/2020_01.csv", Arc::new(monthly())).unwrap();
        assert!(matches!(file.parse(), Err(UataqError::Parser { .. })));
    }

    #[test]
    fn test_missing_time_column_is_parser_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("2020_01.csv");
        fs::write(&path, "when,value\n2020-01-01 00:00:00,1\n").unwrap();

        let format = monthly().with_time_column("Time");
        let file = DataFile::new(&path, Arc::new(format)).unwrap();
        assert!(matches!(file.parse(), Err(UataqError::Parser { .. })));
    }
}
