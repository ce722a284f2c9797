//! Fabric interface entities.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::class::NetDevClass;
use crate::error::{FabricError, FabricResult};

/// One fabric interface as seen by the selection engine.
///
/// Fields are private so that entities handed out by the engine can only be
/// inspected. Every entity returned across the engine boundary is a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricInterface {
    name: String,
    domain: String,
    class: NetDevClass,
    providers: BTreeSet<String>,
}

impl FabricInterface {
    /// Create an interface. The domain defaults to `name` when absent or empty.
    pub fn new(
        name: impl Into<String>,
        domain: Option<&str>,
        class: NetDevClass,
        providers: BTreeSet<String>,
    ) -> FabricResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(FabricError::InvalidArgument(
                "fabric interface name is required".to_string(),
            ));
        }
        if providers.is_empty() && !class.is_manual() {
            return Err(FabricError::InvalidArgument(format!(
                "fabric interface {name} ({class}) has no providers"
            )));
        }
        let domain = match domain {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => name.clone(),
        };
        Ok(Self {
            name,
            domain,
            class,
            providers,
        })
    }

    /// A user-declared interface, compatible with any class or provider.
    pub fn manual(name: impl Into<String>, domain: Option<&str>) -> FabricResult<Self> {
        Self::new(name, domain, NetDevClass::Manual, BTreeSet::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn class(&self) -> NetDevClass {
        self.class
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(String::as_str)
    }

    /// Whether the interface supports `provider`.
    ///
    /// Composite provider strings of the form `[prefix+]prov[;prov...]`
    /// match when the whole string is present, or when every component
    /// (carrying the leading prefix) is present.
    pub fn has_provider(&self, provider: &str) -> bool {
        if provider.is_empty() {
            return false;
        }
        if self.providers.contains(provider) {
            return true;
        }

        let (prefix, rest) = match provider.split_once('+') {
            Some((prefix, rest)) => (Some(prefix), rest),
            None => (None, provider),
        };
        let mut parts = rest.split(';').filter(|p| !p.is_empty()).peekable();
        if parts.peek().is_none() {
            return false;
        }
        parts.all(|part| {
            let full = match prefix {
                Some(prefix) => format!("{prefix}+{part}"),
                None => part.to_string(),
            };
            self.providers.contains(&full)
        })
    }

    /// The `{name, domain, class}` triple consumed by transport setup.
    pub fn selected(&self) -> SelectedInterface {
        SelectedInterface {
            name: self.name.clone(),
            domain: self.domain.clone(),
            class: self.class,
        }
    }
}

impl fmt::Display for FabricInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{} ({})", self.name, self.class)
        } else {
            write!(f, "{}/{} ({})", self.name, self.domain, self.class)
        }
    }
}

/// What a transport endpoint needs from a selected interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedInterface {
    pub name: String,
    pub domain: String,
    pub class: NetDevClass,
}

/// A selection or lookup request.
///
/// `provider` is required by [`crate::NumaFabric::get_device`];
/// `interface` is required by [`crate::NumaFabric::find_device`].
/// A `dev_class` of `None` accepts any device class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricIfaceParams {
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub provider: String,
    pub dev_class: Option<NetDevClass>,
    #[serde(default)]
    pub numa_node: u32,
}

impl FabricIfaceParams {
    /// Parameters for a class/provider selection on a NUMA node.
    pub fn select(numa_node: u32, dev_class: NetDevClass, provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            dev_class: Some(dev_class),
            numa_node,
            ..Self::default()
        }
    }

    /// Parameters for a lookup by interface name.
    pub fn lookup(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

#[cfg(test)]
pub(crate) fn provider_set<I, S>(providers: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    providers.into_iter().map(Into::into).collect()
}
