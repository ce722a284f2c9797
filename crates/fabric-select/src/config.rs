//! Agent configuration file parser.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::DeviceFilter;

pub const DEFAULT_SYSTEM_NAME: &str = "daos_server";
pub const DEFAULT_RUNTIME_DIR: &str = "/var/run/daos_agent";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Longest accepted system name.
const SYSTEM_NAME_MAX: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub name: String,
    pub runtime_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `info` or `fabric_select=trace`.
    pub log_level: String,
    pub exclude_fabric_ifaces: BTreeSet<String>,
    pub include_fabric_ifaces: BTreeSet<String>,
    pub fabric_ifaces: Vec<NumaFabricConfig>,
}

/// Fabric interfaces declared for one NUMA node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumaFabricConfig {
    pub numa_node: u32,
    #[serde(default)]
    pub devices: Vec<FabricInterfaceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FabricInterfaceConfig {
    pub iface: String,
    pub domain: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SYSTEM_NAME.to_string(),
            runtime_dir: PathBuf::from(DEFAULT_RUNTIME_DIR),
            log_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            exclude_fabric_ifaces: BTreeSet::new(),
            include_fabric_ifaces: BTreeSet::new(),
            fabric_ifaces: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AgentConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !system_name_is_valid(&self.name) {
            return Err(ConfigError::Invalid(format!(
                "invalid system name: {}",
                self.name
            )));
        }

        if !self.exclude_fabric_ifaces.is_empty() && !self.include_fabric_ifaces.is_empty() {
            return Err(ConfigError::Invalid(
                "cannot specify both exclude_fabric_ifaces and include_fabric_ifaces".to_string(),
            ));
        }

        for numa_cfg in &self.fabric_ifaces {
            if numa_cfg.devices.iter().any(|d| d.iface.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "fabric_ifaces on NUMA node {} has an entry without iface",
                    numa_cfg.numa_node
                )));
            }
        }

        Ok(())
    }

    /// The device filter described by the include/exclude sets.
    pub fn device_filter(&self) -> Result<Option<DeviceFilter>, ConfigError> {
        Ok(DeviceFilter::from_sets(
            &self.include_fabric_ifaces,
            &self.exclude_fabric_ifaces,
        )?)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn system_name_is_valid(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= SYSTEM_NAME_MAX
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMode;

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.name, DEFAULT_SYSTEM_NAME);
        assert!(config.validate().is_ok());
        assert!(config.device_filter().unwrap().is_none());
    }

    #[test]
    fn parse_fabric_ifaces() {
        let toml_str = r#"
name = "daos"
exclude_fabric_ifaces = ["lo"]

[[fabric_ifaces]]
numa_node = 0
devices = [
    { iface = "ib0", domain = "mlx5_0" },
    { iface = "ib1" },
]

[[fabric_ifaces]]
numa_node = 1
devices = [{ iface = "ib2" }]
"#;
        let config: AgentConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        assert_eq!(config.fabric_ifaces.len(), 2);
        assert_eq!(config.fabric_ifaces[0].devices[0].domain.as_deref(), Some("mlx5_0"));
        assert_eq!(config.fabric_ifaces[0].devices[1].domain, None);
        assert_eq!(config.runtime_dir, PathBuf::from(DEFAULT_RUNTIME_DIR));

        let filter = config.device_filter().unwrap().unwrap();
        assert_eq!(filter.mode(), FilterMode::Exclude);
        assert!(filter.should_ignore("lo"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<AgentConfig>("bogus = 1").is_err());
    }

    #[test]
    fn rejects_include_and_exclude() {
        let config = AgentConfig {
            exclude_fabric_ifaces: ["ib0".to_string()].into(),
            include_fabric_ifaces: ["ib1".to_string()].into(),
            ..AgentConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(matches!(config.device_filter(), Err(ConfigError::Fabric(_))));
    }

    #[test]
    fn rejects_bad_system_name() {
        for name in ["", "has space", "much_too_long_system_name"] {
            let config = AgentConfig {
                name: name.to_string(),
                ..AgentConfig::default()
            };
            assert!(config.validate().is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "name = \"daos\"\ninclude_fabric_ifaces = [\"ib0\"]\n").unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.name, "daos");
        assert!(config.include_fabric_ifaces.contains("ib0"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AgentConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn toml_roundtrip_keeps_fabric_ifaces() {
        let config = AgentConfig {
            fabric_ifaces: vec![NumaFabricConfig {
                numa_node: 3,
                devices: vec![FabricInterfaceConfig {
                    iface: "eth0".to_string(),
                    domain: None,
                }],
            }],
            ..AgentConfig::default()
        };
        let rendered = config.to_toml_string().unwrap();
        let back: AgentConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(back, config);
    }
}
