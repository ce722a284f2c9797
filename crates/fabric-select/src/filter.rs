//! Include/exclude filtering of fabric interfaces by name.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{FabricError, FabricResult};

/// How the names in a [`DeviceFilter`] are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Ignore the named devices, allow everything else.
    Exclude,
    /// Allow only the named devices.
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFilter {
    devices: BTreeSet<String>,
    mode: FilterMode,
}

impl DeviceFilter {
    pub fn new<I, S>(devices: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    pub fn exclude<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(devices, FilterMode::Exclude)
    }

    pub fn include<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(devices, FilterMode::Include)
    }

    /// Build a filter from configured include and exclude sets.
    ///
    /// Returns `Ok(None)` when both sets are empty. Both sets being
    /// non-empty is rejected.
    pub fn from_sets(
        include: &BTreeSet<String>,
        exclude: &BTreeSet<String>,
    ) -> FabricResult<Option<Self>> {
        match (include.is_empty(), exclude.is_empty()) {
            (false, false) => Err(FabricError::InvalidArgument(
                "cannot specify both exclude_fabric_ifaces and include_fabric_ifaces".to_string(),
            )),
            (false, true) => Ok(Some(Self::include(include.iter().cloned()))),
            (true, false) => Ok(Some(Self::exclude(exclude.iter().cloned()))),
            (true, true) => Ok(None),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(String::as_str)
    }

    /// Whether the device named `name` should be skipped.
    pub fn should_ignore(&self, name: &str) -> bool {
        match self.mode {
            FilterMode::Exclude => self.devices.contains(name),
            FilterMode::Include => !self.devices.contains(name),
        }
    }
}

/// [`DeviceFilter::should_ignore`] over an optional filter.
pub fn should_ignore(filter: Option<&DeviceFilter>, name: &str) -> bool {
    filter.is_some_and(|f| f.should_ignore(name))
}
