//! Group convention backed by a plain directory tree.
//!
//! Files live under `{root}/{site}/{instrument}/{logger}/{level}/`, e.g.
//!
//! ```text
//! root/
//!   wbb/
//!     lgr_ugga/
//!       lgr/
//!         raw/
//!           2020_01.csv
//!         qaqc/
//!           2020_01.csv
//! ```
//!
//! Formats are registered per instrument, level and logger. Standardization
//! renames columns per instrument.

use super::datafile::DataFileFormat;
use super::groupspace::{DataFileRegistry, GroupSpace};
use super::lister::{FileLister, ListOptions, WalkdirLister};
use crate::error::{Result, UataqError};
use crate::models::Level;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Key format shared by [`DirectoryGroup`] registration and lookup
pub fn datafile_key(instrument: &str, level: Level, logger: &str) -> String {
    format!(
        "{}_{}_{}",
        instrument.to_lowercase(),
        level,
        logger.to_lowercase()
    )
}

#[derive(Debug, Clone)]
pub struct DirectoryGroup {
    name: String,
    root: PathBuf,
    lister: Arc<dyn FileLister>,
    datafiles: DataFileRegistry,
    renames: HashMap<String, Vec<(String, String)>>,
    recursive: bool,
}

impl DirectoryGroup {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            lister: Arc::new(WalkdirLister),
            datafiles: HashMap::new(),
            renames: HashMap::new(),
            recursive: false,
        }
    }

    /// Register the format for an instrument, level and logger
    pub fn with_format(
        mut self,
        instrument: &str,
        level: Level,
        logger: &str,
        format: Arc<dyn DataFileFormat>,
    ) -> Self {
        self.datafiles
            .insert(datafile_key(instrument, level, logger), format);
        self
    }

    /// Column renames applied by [`GroupSpace::standardize_data`] for an instrument
    pub fn with_renames<I, S>(mut self, instrument: &str, renames: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        self.renames.insert(
            instrument.to_lowercase(),
            renames
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        );
        self
    }

    pub fn with_lister(mut self, lister: Arc<dyn FileLister>) -> Self {
        self.lister = lister;
        self
    }

    /// Search level directories recursively
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding files for one site, instrument, logger and level
    pub fn level_dir(&self, site: &str, instrument: &str, level: Level, logger: &str) -> PathBuf {
        self.root
            .join(site)
            .join(instrument)
            .join(logger)
            .join(level.as_str())
    }
}

impl GroupSpace for DirectoryGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn datafiles(&self) -> &DataFileRegistry {
        &self.datafiles
    }

    fn get_highest_lvl(&self, site: &str, instrument: &str) -> Result<Level> {
        let instrument_dir = self.root.join(site).join(instrument);
        let mut levels = Vec::new();

        if instrument_dir.is_dir() {
            for entry in fs::read_dir(&instrument_dir)? {
                let logger_dir = entry?.path();
                if !logger_dir.is_dir() {
                    continue;
                }
                levels.extend(
                    Level::ALL
                        .into_iter()
                        .filter(|level| logger_dir.join(level.as_str()).is_dir()),
                );
            }
        }

        let highest = Level::highest(levels).ok_or_else(|| UataqError::NoLevelsFound {
            site: site.to_string(),
            instrument: instrument.to_string(),
        })?;
        debug!("Highest level for {}/{} is {}", site, instrument, highest);
        Ok(highest)
    }

    fn get_files(
        &self,
        site: &str,
        instrument: &str,
        level: Level,
        logger: &str,
    ) -> Result<Vec<String>> {
        let options = ListOptions::new(self.level_dir(site, instrument, level, logger))
            .with_absolute_paths(true)
            .with_recursive(self.recursive);
        self.lister.list(&options)
    }

    fn get_datafile_key(&self, instrument: &str, level: Level, logger: &str) -> String {
        datafile_key(instrument, level, logger)
    }

    fn standardize_data(&self, instrument: &str, mut data: DataFrame) -> Result<DataFrame> {
        let Some(renames) = self.renames.get(&instrument.to_lowercase()) else {
            return Ok(data);
        };

        for (from, to) in renames {
            if data.column(from).is_ok() {
                data.rename(from, to.as_str().into())?;
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::formats::CsvFormat;
    use crate::filesystem::period::{DateSlicer, FileFreq};
    use crate::timerange::TimeRange;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn group(root: &Path) -> DirectoryGroup {
        let format = CsvFormat::new("LgrCsv", "lgr", DateSlicer::range(0, 7), FileFreq::Month);
        DirectoryGroup::new("lin", root)
            .with_format("lgr_ugga", Level::Raw, "lgr", Arc::new(format.clone()))
            .with_format("lgr_ugga", Level::Qaqc, "lgr", Arc::new(format))
            .with_renames("lgr_ugga", [("CO2d_ppm", "CO2_ppm")])
    }

    fn create_tree(temp_dir: &TempDir) -> PathBuf {
        let root = temp_dir.path().to_path_buf();
        for level in ["raw", "qaqc"] {
            let dir = root.join("wbb").join("lgr_ugga").join("lgr").join(level);
            fs::create_dir_all(&dir).unwrap();
            for month in ["2020_01", "2020_02", "2020_03"] {
                fs::write(dir.join(format!("{month}.csv")), "Time_UTC,CO2d_ppm\n").unwrap();
            }
            fs::write(dir.join("README.txt"), "not data").unwrap();
            fs::write(dir.join("bad_name.csv"), "Time_UTC\n").unwrap();
        }
        root
    }

    #[test]
    fn test_highest_level() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_tree(&temp_dir);

        let group = group(&root);
        assert_eq!(group.get_highest_lvl("wbb", "lgr_ugga").unwrap(), Level::Qaqc);
        assert!(matches!(
            group.get_highest_lvl("wbb", "licor_6262"),
            Err(UataqError::NoLevelsFound { .. })
        ));
    }

    #[test]
    fn test_get_datafile_class_unknown_key() {
        let temp_dir = TempDir::new().unwrap();
        let group = group(temp_dir.path());

        match group.get_datafile_class("lgr_ugga", Level::Final, "lgr") {
            Err(UataqError::UnknownDatafileKey { key, group }) => {
                assert_eq!(key, "lgr_ugga_final_lgr");
                assert_eq!(group, "lin");
            }
            other => panic!("Expected UnknownDatafileKey error, got {other:?}"),
        }
    }

    #[test]
    fn test_get_datafiles_skips_bad_names_and_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_tree(&temp_dir);
        let group = group(&root);

        let range = TimeRange::from_bounds("2020-01", "2020-02").unwrap();
        let files = group
            .get_datafiles("wbb", "lgr_ugga", Level::Qaqc, "lgr", &range, None)
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path().file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2020_01.csv", "2020_02.csv"]);
        assert!(files.iter().all(|f| f.path().to_string_lossy().contains("qaqc")));
    }

    #[test]
    fn test_get_files_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let group = group(temp_dir.path());
        assert!(group.get_files("wbb", "lgr_ugga", Level::Raw, "lgr").is_err());
    }

    #[test]
    fn test_standardize_renames_columns() {
        let temp_dir = TempDir::new().unwrap();
        let group = group(temp_dir.path());

        let df = df!("CO2d_ppm" => [410.0], "CH4d_ppm" => [1.9]).unwrap();
        let df = group.standardize_data("LGR_UGGA", df).unwrap();
        assert!(df.column("CO2_ppm").is_ok());
        assert!(df.column("CH4d_ppm").is_ok());

        let untouched = df!("x" => [1]).unwrap();
        let result = group.standardize_data("other", untouched.clone()).unwrap();
        assert!(result.equals(&untouched));
    }

    #[test]
    fn test_display_name() {
        let temp_dir = TempDir::new().unwrap();
        let group: Arc<dyn GroupSpace> = Arc::new(group(temp_dir.path()));
        assert_eq!(group.to_string(), "Lin GroupSpace");
    }
}
