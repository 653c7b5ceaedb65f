//! Registry of group conventions.
//!
//! Built once at startup and passed by reference to whatever needs to look
//! a group up. Read-only after construction.

use super::groupspace::GroupSpace;
use crate::error::{Result, UataqError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Group used when a caller does not name one
pub const DEFAULT_GROUP: &str = "lin";

#[derive(Debug, Clone)]
pub struct GroupRegistry {
    groups: BTreeMap<String, Arc<dyn GroupSpace>>,
    default_group: String,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP)
    }
}

impl GroupRegistry {
    pub fn new(default_group: impl Into<String>) -> Self {
        Self {
            groups: BTreeMap::new(),
            default_group: default_group.into(),
        }
    }

    /// Register a group under its own name, replacing any previous entry
    pub fn with_group(mut self, group: Arc<dyn GroupSpace>) -> Self {
        self.groups.insert(group.name().to_string(), group);
        self
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Registered group names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Resolve an optional group name.
    ///
    /// `None` resolves to the default group name without checking that it is
    /// registered; an unknown explicit name is an error.
    pub fn resolve<'a>(&'a self, group: Option<&'a str>) -> Result<&'a str> {
        match group {
            None => Ok(&self.default_group),
            Some(name) if self.groups.contains_key(name) => Ok(name),
            Some(name) => Err(UataqError::InvalidGroup {
                group: name.to_string(),
            }),
        }
    }

    /// Look up a group, falling back to the default group for `None`
    pub fn get(&self, group: Option<&str>) -> Result<Arc<dyn GroupSpace>> {
        let name = self.resolve(group)?;
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| UataqError::InvalidGroup {
                group: name.to_string(),
            })
    }
}
