//! Error handling for file selection and parsing operations.
//!
//! Per-file failures (see [`UataqError::is_per_file`]) are recovered by the
//! pipeline and only logged. Everything else propagates to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UataqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Directory traversal error: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Invalid time specification: {reason}")]
    InvalidTimeSpec { reason: String },

    #[error("Unable to initialize {format} datafile from {path}: {reason}")]
    DataFileInitialization {
        format: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parser { path: PathBuf, reason: String },

    #[error("No files found within the specified time range: {time_range}")]
    NoFilesInRange { time_range: String },

    #[error("No files were parsed successfully ({files_failed} failed)")]
    NoFilesParsed { files_failed: usize },

    #[error("DataFile format not found for key: {key} in {group} group")]
    UnknownDatafileKey { key: String, group: String },

    #[error("Invalid group: {group}")]
    InvalidGroup { group: String },

    #[error("Invalid level: {level}")]
    InvalidLevel { level: String },

    #[error("No data levels found for {instrument} at {site}")]
    NoLevelsFound { site: String, instrument: String },

    #[error("{driver} driver not implemented yet")]
    UnimplementedDriver { driver: String },

    #[error("Invalid driver: {driver}")]
    InvalidDriver { driver: String },

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl UataqError {
    pub fn invalid_time(reason: impl Into<String>) -> Self {
        Self::InvalidTimeSpec {
            reason: reason.into(),
        }
    }

    pub fn parser(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parser {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that only affect a single file and are skipped by the pipeline.
    ///
    /// Reading a file can fail with a parser, polars or io error; a file name
    /// that encodes no period fails at initialization.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::DataFileInitialization { .. } | Self::Parser { .. } | Self::Polars(_) | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, UataqError>;

#[cfg(test)]
mod tests {
    use super::*;
    use polars::error::PolarsError;

    #[test]
    fn test_per_file_errors() {
        assert!(UataqError::parser("2020_01.csv", "bad row").is_per_file());
        assert!(
            UataqError::DataFileInitialization {
                format: "LgrCsv".to_string(),
                path: PathBuf::from("notes.csv"),
                reason: "no date".to_string(),
            }
            .is_per_file()
        );
        assert!(UataqError::Polars(PolarsError::NoData("empty".into())).is_per_file());
        assert!(
            UataqError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
                .is_per_file()
        );
    }

    #[test]
    fn test_request_errors_propagate() {
        assert!(!UataqError::NoFilesParsed { files_failed: 2 }.is_per_file());
        assert!(
            !UataqError::UnimplementedDriver {
                driver: "array".to_string()
            }
            .is_per_file()
        );
        assert!(
            !UataqError::InvalidGroup {
                group: "ucar".to_string()
            }
            .is_per_file()
        );
        assert!(!UataqError::invalid_time("bad").is_per_file());
    }
}
