use std::path::Path;

use anyhow::Context;
use fabric_select::{AgentConfig, FabricIfaceParams, FabricScan, NetDevClass, NumaFabric};
use tracing::{info, warn};

/// Build the fabric from configured interfaces, else from a scan result.
pub fn build_fabric(config: &AgentConfig, scan: Option<&Path>) -> anyhow::Result<NumaFabric> {
    let fabric = if !config.fabric_ifaces.is_empty() {
        info!(
            numa_nodes = config.fabric_ifaces.len(),
            "using fabric interfaces from config"
        );
        NumaFabric::from_config(&config.fabric_ifaces)?
    } else if let Some(path) = scan {
        let scan = FabricScan::from_json_file(path)
            .with_context(|| format!("reading fabric scan {}", path.display()))?;
        info!(interfaces = scan.interfaces.len(), "using fabric scan");
        NumaFabric::from_scan(&scan)
    } else {
        warn!("no fabric interfaces configured and no fabric scan supplied");
        NumaFabric::uninitialized()
    };

    Ok(fabric.with_device_filter(config.device_filter()?))
}

pub fn status(fabric: &NumaFabric) -> anyhow::Result<()> {
    let report = {
        let map = fabric.read_locked_map()?;
        serde_json::json!({
            "numa_nodes": map.num_nodes(),
            "max_numa_node": map.max_numa_node(),
            "device_filter": fabric.device_filter(),
            "interfaces": &*map,
        })
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn select(
    fabric: &NumaFabric,
    numa_node: u32,
    class: Option<NetDevClass>,
    provider: &str,
    count: usize,
) -> anyhow::Result<()> {
    let params = FabricIfaceParams {
        provider: provider.to_string(),
        dev_class: class,
        numa_node,
        ..FabricIfaceParams::default()
    };
    for _ in 0..count {
        let fi = fabric.get_device(&params)?;
        println!("{}", serde_json::to_string(&fi.selected())?);
    }
    Ok(())
}

pub fn find(
    fabric: &NumaFabric,
    iface: &str,
    domain: Option<&str>,
    provider: Option<&str>,
) -> anyhow::Result<()> {
    let mut params = FabricIfaceParams::lookup(iface);
    if let Some(domain) = domain {
        params = params.with_domain(domain);
    }
    if let Some(provider) = provider {
        params = params.with_provider(provider);
    }

    let found = fabric.find_device(&params)?;
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}
