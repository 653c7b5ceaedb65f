//! UATAQ filesystem library
//!
//! Reads time-stamped observation files from a hierarchical research
//! filesystem, organised by research group, site, instrument, processing
//! level and logger.
//!
//! This library provides tools for:
//! - Building time ranges from ISO8601 strings, dates or open bounds
//! - Recognising data files and the calendar period each one covers
//! - Selecting the files that intersect a time range
//! - Parsing selected files concurrently into one time-sorted table
//! - Resolving research groups through an explicit registry

pub mod cli;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod models;
pub mod timerange;

pub use config::FilesystemConfig;
pub use error::{Result, UataqError};
pub use filesystem::{
    DataFile, DataFileFormat, DataRequest, GroupRegistry, GroupSpace, ParseOptions,
    filter_datafiles, parse_datafiles, read_data,
};
pub use models::{Driver, Level, ParseSummary, TIME_COLUMN, Workers};
pub use timerange::{TimeObject, TimeRange, TimeRangeInput};
