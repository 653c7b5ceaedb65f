//! End-to-end data reads against a group.
//!
//! Resolves the group and level, selects files for the time range, parses
//! them and applies the group's standardization.

use super::datafile::DataFile;
use super::parse::{ParseOptions, parse_datafiles_with_summary};
use super::registry::GroupRegistry;
use crate::error::Result;
use crate::models::{Level, ParseSummary};
use crate::timerange::TimeRange;
use polars::prelude::DataFrame;
use tracing::info;

/// What to read: one instrument's files for a site, level and logger
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub group: Option<String>,
    pub site: String,
    pub instrument: String,
    /// Processing level; the highest available level when `None`
    pub level: Option<Level>,
    pub logger: String,
    pub time_range: TimeRange,
    /// Substring the file path must contain
    pub pattern: Option<String>,
}

impl DataRequest {
    pub fn new(
        site: impl Into<String>,
        instrument: impl Into<String>,
        logger: impl Into<String>,
    ) -> Self {
        Self {
            group: None,
            site: site.into(),
            instrument: instrument.into(),
            level: None,
            logger: logger.into(),
            time_range: TimeRange::new(),
            pattern: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Select the data files a request covers, in chronological order
pub fn find_datafiles(registry: &GroupRegistry, request: &DataRequest) -> Result<Vec<DataFile>> {
    let group = registry.get(request.group.as_deref())?;
    let level = match request.level {
        Some(level) => level,
        None => group.get_highest_lvl(&request.site, &request.instrument)?,
    };

    info!(
        "Finding {} {} {} files at {} in {}",
        level, request.instrument, request.logger, request.site, group
    );
    group.get_datafiles(
        &request.site,
        &request.instrument,
        level,
        &request.logger,
        &request.time_range,
        request.pattern.as_deref(),
    )
}

/// Read, merge and standardize the data a request covers
pub async fn read_data(
    registry: &GroupRegistry,
    request: &DataRequest,
    options: ParseOptions,
) -> Result<(DataFrame, ParseSummary)> {
    let group = registry.get(request.group.as_deref())?;
    let files = find_datafiles(registry, request)?;

    let (data, summary) =
        parse_datafiles_with_summary(files, &request.time_range, options).await?;
    let data = group.standardize_data(&request.instrument, data)?;

    Ok((data, summary))
}
