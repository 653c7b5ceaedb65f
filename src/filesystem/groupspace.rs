//! Data-provider conventions.
//!
//! A [`GroupSpace`] knows where one research group keeps its files, which
//! [`DataFileFormat`] applies to each instrument/level/logger combination,
//! and how to rename or convert that group's columns into a common schema.

use super::datafile::{DataFile, DataFileFormat};
use super::filter::filter_datafiles;
use crate::error::{Result, UataqError};
use crate::models::Level;
use crate::timerange::TimeRange;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Mapping from datafile key to the format registered for it
pub type DataFileRegistry = HashMap<String, Arc<dyn DataFileFormat>>;

pub trait GroupSpace: Send + Sync + fmt::Debug {
    /// Group name as registered in the [`GroupRegistry`](super::GroupRegistry)
    fn name(&self) -> &str;

    /// Formats registered for this group, keyed by [`GroupSpace::get_datafile_key`]
    fn datafiles(&self) -> &DataFileRegistry;

    /// Highest processing level available for an instrument at a site
    fn get_highest_lvl(&self, site: &str, instrument: &str) -> Result<Level>;

    /// Candidate file paths for a site, instrument, level and logger
    fn get_files(
        &self,
        site: &str,
        instrument: &str,
        level: Level,
        logger: &str,
    ) -> Result<Vec<String>>;

    /// Key used to select the format for an instrument, level and logger
    fn get_datafile_key(&self, instrument: &str, level: Level, logger: &str) -> String;

    /// Convert a parsed table into the common schema shared between groups
    fn standardize_data(&self, instrument: &str, data: DataFrame) -> Result<DataFrame>;

    /// Look up the format registered for an instrument, level and logger
    fn get_datafile_class(
        &self,
        instrument: &str,
        level: Level,
        logger: &str,
    ) -> Result<Arc<dyn DataFileFormat>> {
        let key = self.get_datafile_key(instrument, level, logger);
        self.datafiles()
            .get(&key)
            .cloned()
            .ok_or_else(|| UataqError::UnknownDatafileKey {
                key,
                group: self.name().to_string(),
            })
    }

    /// Data files for a site, instrument, level and logger within a time range.
    ///
    /// Paths without the format's extension are ignored and paths whose names
    /// do not encode a period are logged and skipped.
    fn get_datafiles(
        &self,
        site: &str,
        instrument: &str,
        level: Level,
        logger: &str,
        time_range: &TimeRange,
        pattern: Option<&str>,
    ) -> Result<Vec<DataFile>> {
        let format = self.get_datafile_class(instrument, level, logger)?;
        let paths = self.get_files(site, instrument, level, logger)?;
        debug!(
            "{} candidate paths for {}/{}/{}/{} in {} group",
            paths.len(),
            site,
            instrument,
            level,
            logger,
            self.name()
        );

        let mut datafiles = Vec::with_capacity(paths.len());
        for path in paths.into_iter().filter(|p| p.ends_with(format.ext())) {
            match DataFile::new(path, format.clone()) {
                Ok(datafile) => datafiles.push(datafile),
                Err(e) => warn!("{}", e),
            }
        }

        filter_datafiles(datafiles, time_range, pattern)
    }
}

impl fmt::Display for dyn GroupSpace + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{} GroupSpace", first.to_uppercase(), chars.as_str()),
            None => write!(f, "GroupSpace"),
        }
    }
}
