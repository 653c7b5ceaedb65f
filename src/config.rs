//! Configuration management and validation.
//!
//! Describes where data lives, which file formats a directory group
//! registers, and how parsing is parallelised.

use crate::error::{Result, UataqError};
use crate::filesystem::{
    CsvFormat, DateSlicer, DirectoryGroup, FileFreq, GroupRegistry, ParseOptions,
};
use crate::models::{Driver, Level, Workers};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Format registration for one instrument, level and logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    pub instrument: String,
    pub level: Level,
    pub format: CsvFormat,
}

/// Global configuration for filesystem reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Root of the research filesystem
    pub data_root: PathBuf,

    /// Group used when a request does not name one
    pub default_group: String,

    /// Requested parsing workers
    pub workers: Workers,

    /// Output driver for merged data
    pub driver: Driver,

    /// Search level directories recursively
    pub recursive: bool,

    /// Show a progress bar while parsing
    pub show_progress: bool,

    /// Formats registered on the directory group
    pub formats: Vec<FormatConfig>,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            default_group: crate::filesystem::DEFAULT_GROUP.to_string(),
            workers: Workers::Count(1),
            driver: Driver::Polars,
            recursive: false,
            show_progress: false,
            formats: Vec::new(),
        }
    }
}

impl FilesystemConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    pub fn with_workers(mut self, workers: Workers) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Register a CSV format for an instrument and level; the logger comes from the format
    pub fn with_format(mut self, instrument: impl Into<String>, level: Level, format: CsvFormat) -> Self {
        self.formats.push(FormatConfig {
            instrument: instrument.into(),
            level,
            format,
        });
        self
    }

    /// Register one CSV format for an instrument at every level
    pub fn with_format_all_levels(mut self, instrument: &str, format: CsvFormat) -> Self {
        for level in Level::ALL {
            self = self.with_format(instrument, level, format.clone());
        }
        self
    }

    /// Check that the configuration can be used
    pub fn validate(&self) -> Result<()> {
        if !self.data_root.is_dir() {
            return Err(UataqError::Config {
                reason: format!("data root {} is not a directory", self.data_root.display()),
            });
        }
        if self.default_group.is_empty() {
            return Err(UataqError::InvalidGroup {
                group: self.default_group.clone(),
            });
        }
        if let Workers::Count(0) = self.workers {
            return Err(UataqError::Config {
                reason: "worker count must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new(self.workers, self.driver).with_progress(self.show_progress)
    }

    /// Build a registry holding a directory group rooted at `data_root`
    pub fn build_registry(&self) -> GroupRegistry {
        let mut group = DirectoryGroup::new(&self.default_group, &self.data_root)
            .with_recursive(self.recursive);

        for entry in &self.formats {
            debug!(
                "Registering {} for {} {} {}",
                entry.format.name, entry.instrument, entry.level, entry.format.logger
            );
            group = group.with_format(
                &entry.instrument,
                entry.level,
                &entry.format.logger,
                Arc::new(entry.format.clone()),
            );
        }

        GroupRegistry::new(&self.default_group).with_group(Arc::new(group))
    }
}

/// Default CSV format for files named by date, e.g. `2020_06.csv`
pub fn default_csv_format(logger: &str, file_freq: FileFreq) -> CsvFormat {
    let width = match file_freq {
        FileFreq::Year => 4,
        FileFreq::Month => 7,
        FileFreq::Day => 10,
        FileFreq::Hour => 13,
    };
    CsvFormat::new(
        format!("{logger}_csv"),
        logger,
        DateSlicer::range(0, width),
        file_freq,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{DataFileFormat, GroupSpace};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = FilesystemConfig::default();
        assert_eq!(config.default_group, "lin");
        assert_eq!(config.workers, Workers::Count(1));
        assert_eq!(config.driver, Driver::Polars);
        assert!(config.formats.is_empty());
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FilesystemConfig::new(temp_dir.path()).validate().is_ok());
        assert!(matches!(
            FilesystemConfig::new(temp_dir.path().join("missing")).validate(),
            Err(UataqError::Config { .. })
        ));
        assert!(
            FilesystemConfig::new(temp_dir.path())
                .with_workers(Workers::Count(0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_build_registry_registers_formats() {
        let temp_dir = TempDir::new().unwrap();
        let config = FilesystemConfig::new(temp_dir.path())
            .with_default_group("horel")
            .with_format_all_levels("met", default_csv_format("campbell", FileFreq::Day));

        let registry = config.build_registry();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["horel"]);

        let group = registry.get(None).unwrap();
        assert_eq!(group.datafiles().len(), 4);
        let format = group.get_datafile_class("met", Level::Final, "campbell").unwrap();
        assert_eq!(format.file_freq(), FileFreq::Day);
        assert_eq!(format.date_slicer(), DateSlicer::range(0, 10));
    }

    #[test]
    fn test_parse_options_follow_config() {
        let config = FilesystemConfig::default()
            .with_workers(Workers::Max)
            .with_progress(true);
        let options = config.parse_options();
        assert_eq!(options.workers, Workers::Max);
        assert!(options.show_progress);
    }
}
