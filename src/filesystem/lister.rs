//! Directory listing for candidate data files.
//!
//! The pipeline consumes file names through the [`FileLister`] trait so that
//! groups can swap in their own discovery. [`WalkdirLister`] walks the local
//! filesystem and matches base names against a glob pattern.

use crate::error::{Result, UataqError};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Options controlling a single listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Directory to search
    pub directory: PathBuf,
    /// Glob pattern matched against base names; `None` matches everything
    pub pattern: Option<String>,
    pub ignore_case: bool,
    /// Include names starting with a dot
    pub include_hidden: bool,
    /// Return absolute paths instead of base names
    pub absolute_paths: bool,
    pub recursive: bool,
    pub follow_symlinks: bool,
}

impl ListOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pattern: None,
            ignore_case: false,
            include_hidden: false,
            absolute_paths: false,
            recursive: false,
            follow_symlinks: false,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn with_absolute_paths(mut self, absolute_paths: bool) -> Self {
        self.absolute_paths = absolute_paths;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }
}

/// Source of candidate file names for a group
pub trait FileLister: Send + Sync + std::fmt::Debug {
    /// List files under `options.directory`, in a deterministic order
    fn list(&self, options: &ListOptions) -> Result<Vec<String>>;
}

/// Local filesystem lister backed by `walkdir`
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirLister;

impl FileLister for WalkdirLister {
    fn list(&self, options: &ListOptions) -> Result<Vec<String>> {
        list_files(options)
    }
}

/// List files in a directory whose base names match a glob pattern
pub fn list_files(options: &ListOptions) -> Result<Vec<String>> {
    let pattern = options
        .pattern
        .as_deref()
        .map(|p| {
            let p = if options.ignore_case {
                p.to_lowercase()
            } else {
                p.to_string()
            };
            Pattern::new(&p).map_err(|e| UataqError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let match_options = MatchOptions {
        case_sensitive: !options.ignore_case,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(&options.directory)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name();

    let mut result = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !options.include_hidden && name.starts_with('.') {
            continue;
        }

        let candidate = if options.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        if let Some(pattern) = &pattern {
            if !pattern.matches_with(&candidate, match_options) {
                continue;
            }
        }

        if options.absolute_paths {
            result.push(absolute(entry.path())?.to_string_lossy().to_string());
        } else {
            result.push(name.to_string());
        }
    }

    debug!(
        "Listed {} files in {}",
        result.len(),
        options.directory.display()
    );
    Ok(result)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
