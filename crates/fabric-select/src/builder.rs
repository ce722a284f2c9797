//! Populating a [`NumaFabric`] from discovery results or configuration.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::class::NetDevClass;
use crate::config::NumaFabricConfig;
use crate::error::FabricResult;
use crate::fabric::NumaFabric;
use crate::interface::FabricInterface;

/// One physical fabric interface reported by hardware discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareFabricInterface {
    /// Physical interface name; becomes the domain of each entry.
    pub name: String,
    pub numa_node: u32,
    pub device_class: NetDevClass,
    #[serde(default)]
    pub providers: BTreeSet<String>,
    /// OS network interfaces bound to this physical interface.
    #[serde(default)]
    pub net_interfaces: BTreeSet<String>,
}

/// The result of a fabric hardware scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricScan {
    pub interfaces: Vec<HardwareFabricInterface>,
}

impl FabricScan {
    /// Read a scan result serialized as JSON.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::from)
    }
}

impl HardwareFabricInterface {
    /// One entity per bound OS network interface, sharing class and providers.
    fn fabric_interfaces(&self) -> Vec<FabricResult<FabricInterface>> {
        self.net_interfaces
            .iter()
            .map(|net_if| {
                FabricInterface::new(
                    net_if.as_str(),
                    Some(self.name.as_str()),
                    self.device_class,
                    self.providers.clone(),
                )
            })
            .collect()
    }
}

impl NumaFabric {
    /// Build a fabric from a hardware scan.
    ///
    /// Physical interfaces are taken in name order. Entries that cannot form
    /// a valid interface are logged and skipped.
    pub fn from_scan(scan: &FabricScan) -> Self {
        let fabric = NumaFabric::new();

        let mut hw: Vec<&HardwareFabricInterface> = scan.interfaces.iter().collect();
        hw.sort_by(|a, b| a.name.cmp(&b.name));

        for hw_fi in hw {
            let numa = hw_fi.numa_node;
            for result in hw_fi.fabric_interfaces() {
                match result {
                    Ok(fi) => {
                        debug!(
                            device = %fi,
                            index = fabric.num_devices(numa),
                            numa_node = numa,
                            "added to NUMA node"
                        );
                        fabric.add(numa, fi);
                    }
                    Err(e) => {
                        error!(interface = %hw_fi.name, error = %e, "unexpected failure building fabric interface from scan");
                    }
                }
            }
        }

        if fabric.num_numa_nodes() == 0 {
            warn!("no network devices detected in fabric scan");
        }

        fabric
    }

    /// Build a fabric from statically configured interfaces.
    ///
    /// Every entry has class [`NetDevClass::Manual`]; a missing domain
    /// defaults to the interface name.
    pub fn from_config(cfg: &[NumaFabricConfig]) -> FabricResult<Self> {
        let fabric = NumaFabric::new();

        for numa_cfg in cfg {
            for dev in &numa_cfg.devices {
                let fi = FabricInterface::manual(dev.iface.as_str(), dev.domain.as_deref())?;
                debug!(device = %fi, numa_node = numa_cfg.numa_node, "configured fabric interface");
                fabric.add(numa_cfg.numa_node, fi);
            }
        }

        Ok(fabric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FabricInterfaceConfig;
    use crate::interface::provider_set;

    fn hw(
        name: &str,
        numa: u32,
        class: NetDevClass,
        providers: &[&str],
        net_ifs: &[&str],
    ) -> HardwareFabricInterface {
        HardwareFabricInterface {
            name: name.to_string(),
            numa_node: numa,
            device_class: class,
            providers: provider_set(providers.iter().copied()),
            net_interfaces: net_ifs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn scan_creates_entry_per_net_interface() {
        let scan = FabricScan {
            interfaces: vec![
                hw("mlx5_1", 1, NetDevClass::Infiniband, &["ofi+verbs"], &["ib1"]),
                hw("mlx5_0", 0, NetDevClass::Infiniband, &["ofi+verbs", "ofi+tcp"], &["ib0", "ib0.1"]),
            ],
        };
        let fabric = NumaFabric::from_scan(&scan);

        assert_eq!(fabric.num_numa_nodes(), 2);
        assert_eq!(fabric.num_devices(0), 2);
        assert_eq!(fabric.num_devices(1), 1);

        let found = fabric.find("ib0.1").unwrap();
        assert_eq!(found[0].domain(), "mlx5_0");
        assert_eq!(found[0].class(), NetDevClass::Infiniband);
        assert!(found[0].has_provider("ofi+tcp"));
    }

    #[test]
    fn scan_skips_interfaces_without_providers() {
        let scan = FabricScan {
            interfaces: vec![hw("eth0", 0, NetDevClass::Ether, &[], &["eth0"])],
        };
        let fabric = NumaFabric::from_scan(&scan);
        assert_eq!(fabric.num_numa_nodes(), 0);
    }

    #[test]
    fn empty_scan_is_initialized() {
        let fabric = NumaFabric::from_scan(&FabricScan::default());
        assert!(fabric.read_locked_map().unwrap().is_empty());
    }

    #[test]
    fn scan_json_roundtrip_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(
            &path,
            r#"{"interfaces": [{"name": "mlx5_0", "numa_node": 1, "device_class": "infiniband",
                "providers": ["ofi+verbs"], "net_interfaces": ["ib0"]}]}"#,
        )
        .unwrap();

        let scan = FabricScan::from_json_file(&path).unwrap();
        assert_eq!(scan.interfaces[0].numa_node, 1);
        assert_eq!(scan.interfaces[0].device_class, NetDevClass::Infiniband);
    }

    #[test]
    fn config_entries_are_manual() {
        let cfg = vec![
            NumaFabricConfig {
                numa_node: 0,
                devices: vec![
                    FabricInterfaceConfig {
                        iface: "ib0".to_string(),
                        domain: Some("mlx5_0".to_string()),
                    },
                    FabricInterfaceConfig {
                        iface: "ib1".to_string(),
                        domain: None,
                    },
                ],
            },
            NumaFabricConfig {
                numa_node: 2,
                devices: vec![FabricInterfaceConfig {
                    iface: "eth0".to_string(),
                    domain: None,
                }],
            },
        ];
        let fabric = NumaFabric::from_config(&cfg).unwrap();

        assert_eq!(fabric.num_devices(0), 2);
        assert_eq!(fabric.max_numa_node(), Some(2));

        let ib0 = &fabric.find("ib0").unwrap()[0];
        assert_eq!(ib0.domain(), "mlx5_0");
        assert_eq!(ib0.class(), NetDevClass::Manual);

        let ib1 = &fabric.find("ib1").unwrap()[0];
        assert_eq!(ib1.domain(), "ib1");
    }

    #[test]
    fn config_rejects_empty_name() {
        let cfg = vec![NumaFabricConfig {
            numa_node: 0,
            devices: vec![FabricInterfaceConfig {
                iface: String::new(),
                domain: None,
            }],
        }];
        assert!(NumaFabric::from_config(&cfg).is_err());
    }
}
