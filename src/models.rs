//! Core vocabulary types shared across the filesystem pipeline.
//!
//! Defines processing levels, the output driver selector, worker counts
//! and the summary reported after parsing.

use crate::error::{Result, UataqError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the timestamp column every parsed table must carry
pub const TIME_COLUMN: &str = "Time_UTC";

/// Data processing levels, ordered from least to most processed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Raw,
    Qaqc,
    Calibrated,
    Final,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 4] = [Level::Raw, Level::Qaqc, Level::Calibrated, Level::Final];

    /// Numeric rank, 1 for raw through 4 for final
    pub fn rank(&self) -> u8 {
        match self {
            Level::Raw => 1,
            Level::Qaqc => 2,
            Level::Calibrated => 3,
            Level::Final => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Raw => "raw",
            Level::Qaqc => "qaqc",
            Level::Calibrated => "calibrated",
            Level::Final => "final",
        }
    }

    /// Highest level among the given candidates
    pub fn highest<I: IntoIterator<Item = Level>>(levels: I) -> Option<Level> {
        levels.into_iter().max()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UataqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Level::Raw),
            "qaqc" => Ok(Level::Qaqc),
            "calibrated" => Ok(Level::Calibrated),
            "final" => Ok(Level::Final),
            _ => Err(UataqError::InvalidLevel {
                level: s.to_string(),
            }),
        }
    }
}

/// Requested number of parsing workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workers {
    Count(usize),
    /// Use every available execution unit
    Max,
}

impl Default for Workers {
    fn default() -> Self {
        Workers::Count(1)
    }
}

impl FromStr for Workers {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            return Ok(Workers::Max);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("worker count must be at least 1".to_string()),
            Ok(n) => Ok(Workers::Count(n)),
            Err(_) => Err(format!("expected a positive integer or 'max', got '{s}'")),
        }
    }
}

/// Output driver used to assemble the merged dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Driver {
    /// Polars DataFrame
    #[default]
    Polars,
    /// Labelled N-dimensional arrays, not implemented
    Array,
}

impl FromStr for Driver {
    type Err = UataqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "polars" | "pandas" => Ok(Driver::Polars),
            "array" | "xarray" => Ok(Driver::Array),
            _ => Err(UataqError::InvalidDriver {
                driver: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Polars => f.write_str("polars"),
            Driver::Array => f.write_str("array"),
        }
    }
}

/// Outcome of a parse orchestration call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub files_parsed: usize,
    pub files_failed: usize,
    pub workers: usize,
    pub total_rows: usize,
}
