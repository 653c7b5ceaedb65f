//! Filesystem access for observation data.
//!
//! Groups map a site/instrument/level/logger request to data files, the
//! filter stage selects files for a time range and the parse stage merges
//! them into one time-indexed table.

pub mod datafile;
pub mod directory_group;
pub mod filter;
pub mod formats;
pub mod groupspace;
pub mod lister;
pub mod parse;
pub mod period;
pub mod reader;
pub mod registry;

pub use datafile::{DataFile, DataFileFormat};
pub use directory_group::{DirectoryGroup, datafile_key};
pub use filter::filter_datafiles;
pub use formats::CsvFormat;
pub use groupspace::{DataFileRegistry, GroupSpace};
pub use lister::{FileLister, ListOptions, WalkdirLister, list_files};
pub use parse::{ParseOptions, parse_datafiles, parse_datafiles_with_summary, resolve_workers};
pub use period::{DateSlicer, FileFreq, Period};
pub use reader::{DataRequest, find_datafiles, read_data};
pub use registry::{DEFAULT_GROUP, GroupRegistry};
