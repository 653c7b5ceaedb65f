//! Data files and the formats that parse them.
//!
//! Every file variant implements [`DataFileFormat`], which fixes the logger
//! name, date slice, file frequency and extension for that variant and knows
//! how to turn a file into a table. A [`DataFile`] pairs one physical path
//! with its format and the [`Period`] its name encodes.

use super::period::{DateSlicer, FileFreq, Period};
use crate::error::{Result, UataqError};
use polars::prelude::DataFrame;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One file naming and content convention
pub trait DataFileFormat: Send + Sync + fmt::Debug {
    /// Variant name used in log messages
    fn name(&self) -> &str;

    /// Data acquisition system that wrote the files
    fn logger(&self) -> &str;

    /// Slice of the base file name holding the date
    fn date_slicer(&self) -> DateSlicer;

    /// Period covered by each file
    fn file_freq(&self) -> FileFreq;

    /// File name suffix, including the dot
    fn ext(&self) -> &str;

    /// Parse a file into a table with a `Time_UTC` column.
    ///
    /// Content problems should be reported as [`UataqError::Parser`] so the
    /// orchestrator can skip the file.
    fn parse(&self, file: &DataFile) -> Result<DataFrame>;
}

/// A single physical data file
#[derive(Clone)]
pub struct DataFile {
    path: PathBuf,
    period: Period,
    format: Arc<dyn DataFileFormat>,
}

impl DataFile {
    /// Create a data file, deriving its period from the file name
    pub fn new(path: impl Into<PathBuf>, format: Arc<dyn DataFileFormat>) -> Result<Self> {
        let path = path.into();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let date_str = format.date_slicer().apply(&file_name).replace('_', "-");

        let period = Period::parse(&date_str, format.file_freq()).map_err(|reason| {
            UataqError::DataFileInitialization {
                format: format.name().to_string(),
                path: path.clone(),
                reason,
            }
        })?;

        Ok(Self {
            path,
            period,
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn format(&self) -> &Arc<dyn DataFileFormat> {
        &self.format
    }

    pub fn logger(&self) -> &str {
        self.format.logger()
    }

    pub fn ext(&self) -> &str {
        self.format.ext()
    }

    /// Parse this file's content with its format
    pub fn parse(&self) -> Result<DataFrame> {
        self.format.parse(self)
    }
}

impl fmt::Display for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.format.name(), self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug)]
    struct DailyMet;

    impl DataFileFormat for DailyMet {
        fn name(&self) -> &str {
            "DailyMet"
        }
        fn logger(&self) -> &str {
            "campbell"
        }
        fn date_slicer(&self) -> DateSlicer {
            DateSlicer::range(0, 10)
        }
        fn file_freq(&self) -> FileFreq {
            FileFreq::Day
        }
        fn ext(&self) -> &str {
            ".dat"
        }
        fn parse(&self, file: &DataFile) -> Result<DataFrame> {
            Err(UataqError::parser(file.path(), "not implemented"))
        }
    }

    #[test]
    fn test_period_from_file_name() {
        let file = DataFile::new("/data/wbb/met/raw/2020_06_15_met.dat", Arc::new(DailyMet)).unwrap();

        let expected = NaiveDate::from_ymd_opt(2020, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(file.period().start_time(), expected);
        assert_eq!(file.period().freq(), FileFreq::Day);
        assert_eq!(file.logger(), "campbell");
        assert_eq!(file.to_string(), "/data/wbb/met/raw/2020_06_15_met.dat");
        assert_eq!(format!("{file:?}"), "DailyMet(/data/wbb/met/raw/2020_06_15_met.dat)");
    }

    #[test]
    fn test_unparseable_name_fails_initialization() {
        let result = DataFile::new("/data/wbb/met/raw/readme_met.dat", Arc::new(DailyMet));
        match result {
            Err(UataqError::DataFileInitialization { format, path, .. }) => {
                assert_eq!(format, "DailyMet");
                assert_eq!(path, PathBuf::from("/data/wbb/met/raw/readme_met.dat"));
            }
            other => panic!("Expected DataFileInitialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_delegates_to_format() {
        let file = DataFile::new("2020_06_15_met.dat", Arc::new(DailyMet)).unwrap();
        assert!(matches!(file.parse(), Err(UataqError::Parser { .. })));
    }
}
