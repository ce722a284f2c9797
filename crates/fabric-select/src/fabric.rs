//! NUMA-aware fabric interface selection.
//!
//! [`NumaFabric`] hands out fabric interfaces for new transport endpoints.
//! Requests name a NUMA node, a device class and a provider. The engine
//! prefers an interface on the requested node, falls back to other nodes,
//! and balances repeated requests round-robin.
//!
//! # Locking
//!
//! A single readers-writer lock guards the inventory and both cursors.
//! `get_device` takes it exclusively: the scan, the liveness check and the
//! cursor advance happen as one step, so concurrent callers never observe
//! the same cursor position.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tracing::{debug, info, trace};

use crate::class::NetDevClass;
use crate::error::{FabricError, FabricResult};
use crate::filter::{self, DeviceFilter};
use crate::interface::{FabricIfaceParams, FabricInterface};
use crate::inventory::NumaInventory;
use crate::liveness::{self, AddrSource, SystemAddrs};

/// Shared view of the inventory; the read lock is released on drop.
pub type InventoryReadGuard<'a> = MappedRwLockReadGuard<'a, NumaInventory>;

/// Exclusive view of the inventory; the write lock is released on drop.
pub type InventoryWriteGuard<'a> = MappedRwLockWriteGuard<'a, NumaInventory>;

#[derive(Debug, Default)]
struct FabricState {
    inventory: Option<NumaInventory>,
    /// Next index to try on each NUMA node.
    node_cursors: HashMap<u32, usize>,
    /// Node where the last cross-node fallback succeeded.
    fallback_node: u32,
}

/// Fabric interfaces organized by NUMA node, with round-robin selection.
pub struct NumaFabric {
    state: RwLock<FabricState>,
    filter: Option<DeviceFilter>,
    addrs: Arc<dyn AddrSource>,
}

impl NumaFabric {
    /// An empty fabric that checks liveness against the system.
    pub fn new() -> Self {
        Self::with_inventory(Some(NumaInventory::new()))
    }

    /// A fabric whose inventory has never been populated.
    ///
    /// Scoped map access fails until the first [`NumaFabric::add`].
    pub fn uninitialized() -> Self {
        Self::with_inventory(None)
    }

    fn with_inventory(inventory: Option<NumaInventory>) -> Self {
        Self {
            state: RwLock::new(FabricState {
                inventory,
                ..FabricState::default()
            }),
            filter: None,
            addrs: Arc::new(SystemAddrs),
        }
    }

    /// Attach a device filter. `None` keeps the current filter.
    pub fn with_device_filter(mut self, filter: Option<DeviceFilter>) -> Self {
        if let Some(filter) = filter {
            debug!(?filter, "fabric device filter");
            self.filter = Some(filter);
        }
        self
    }

    /// Replace the address source used for liveness checks.
    pub fn with_addr_source(mut self, addrs: impl AddrSource + 'static) -> Self {
        self.addrs = Arc::new(addrs);
        self
    }

    pub fn device_filter(&self) -> Option<&DeviceFilter> {
        self.filter.as_ref()
    }

    /// Append an interface to a NUMA node.
    pub fn add(&self, numa_node: u32, fi: FabricInterface) {
        let mut state = self.state.write();
        state
            .inventory
            .get_or_insert_with(NumaInventory::new)
            .add(numa_node, fi);
    }

    /// Number of interfaces on a NUMA node.
    pub fn num_devices(&self, numa_node: u32) -> usize {
        let state = self.state.read();
        state
            .inventory
            .as_ref()
            .map_or(0, |inv| inv.num_devices(numa_node))
    }

    /// Number of populated NUMA nodes.
    pub fn num_numa_nodes(&self) -> usize {
        let state = self.state.read();
        state.inventory.as_ref().map_or(0, NumaInventory::num_nodes)
    }

    /// Highest populated NUMA node id.
    pub fn max_numa_node(&self) -> Option<u32> {
        let state = self.state.read();
        state.inventory.as_ref().and_then(NumaInventory::max_numa_node)
    }

    /// Read-lock the inventory for external iteration.
    pub fn read_locked_map(&self) -> FabricResult<InventoryReadGuard<'_>> {
        RwLockReadGuard::try_map(self.state.read(), |s| s.inventory.as_ref())
            .map_err(|_| FabricError::Uninitialized)
    }

    /// Write-lock the inventory for external iteration or mutation.
    pub fn locked_map(&self) -> FabricResult<InventoryWriteGuard<'_>> {
        RwLockWriteGuard::try_map(self.state.write(), |s| s.inventory.as_mut())
            .map_err(|_| FabricError::Uninitialized)
    }

    /// Select the next usable interface for `params`.
    ///
    /// Searches `params.numa_node` first, then every other node in
    /// ascending order, rotating the fallback start point between calls.
    /// The returned interface is a copy.
    pub fn get_device(&self, params: &FabricIfaceParams) -> FabricResult<FabricInterface> {
        if params.provider.is_empty() {
            return Err(FabricError::InvalidArgument("provider is required".to_string()));
        }

        let mut guard = self.state.write();
        let state = &mut *guard;
        let Some(inventory) = state.inventory.as_ref() else {
            return Err(FabricError::NoSuitableInterface {
                class: params.dev_class,
            });
        };
        let mut scan = Scan {
            inventory,
            cursors: &mut state.node_cursors,
            filter: self.filter.as_ref(),
            addrs: self.addrs.as_ref(),
            class: params.dev_class,
            provider: &params.provider,
        };

        if let Some(fi) = scan.on_node(params.numa_node) {
            return Ok(fi.clone());
        }

        let nodes: Vec<u32> = inventory.node_ids().collect();
        let start = nodes
            .iter()
            .position(|&n| n > state.fallback_node)
            .unwrap_or(0);
        for i in 0..nodes.len() {
            let node = nodes[(start + i) % nodes.len()];
            if let Some(fi) = scan.on_node(node) {
                debug!(
                    device = %fi,
                    numa_node = node,
                    requested_node = params.numa_node,
                    "selected device on fallback NUMA node"
                );
                let fi = fi.clone();
                state.fallback_node = node;
                return Ok(fi);
            }
        }

        Err(FabricError::NoSuitableInterface {
            class: params.dev_class,
        })
    }

    /// All interfaces named `name`, across every node and domain.
    pub fn find(&self, name: &str) -> FabricResult<Vec<FabricInterface>> {
        let state = self.state.read();
        let found: Vec<FabricInterface> = state
            .inventory
            .iter()
            .flat_map(NumaInventory::iter)
            .flat_map(|(_, devs)| devs.iter())
            .filter(|fi| fi.name() == name)
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(FabricError::InterfaceNotFound(name.to_string()));
        }
        Ok(found)
    }

    /// Look up interfaces by name, optionally narrowed by domain and then
    /// provider. All remaining matches are returned.
    pub fn find_device(&self, params: &FabricIfaceParams) -> FabricResult<Vec<FabricInterface>> {
        if params.interface.is_empty() {
            return Err(FabricError::InvalidArgument(
                "fabric interface name is required".to_string(),
            ));
        }

        let mut found = self.find(&params.interface)?;

        if !params.domain.is_empty() {
            found.retain(|fi| fi.domain() == params.domain);
            if found.is_empty() {
                return Err(FabricError::DomainNotFound {
                    interface: params.interface.clone(),
                    domain: params.domain.clone(),
                });
            }
        }

        if !params.provider.is_empty() {
            found.retain(|fi| fi.class().is_manual() || fi.has_provider(&params.provider));
            if found.is_empty() {
                return Err(FabricError::ProviderNotFound {
                    interface: params.interface.clone(),
                    provider: params.provider.clone(),
                });
            }
        }

        Ok(found)
    }
}

impl Default for NumaFabric {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NumaFabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumaFabric")
            .field("state", &*self.state.read())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// One selection request's view of the locked engine state.
struct Scan<'a> {
    inventory: &'a NumaInventory,
    cursors: &'a mut HashMap<u32, usize>,
    filter: Option<&'a DeviceFilter>,
    addrs: &'a dyn AddrSource,
    class: Option<NetDevClass>,
    provider: &'a str,
}

impl<'a> Scan<'a> {
    /// One full rotation over a node's devices, starting at its cursor.
    fn on_node(&mut self, numa_node: u32) -> Option<&'a FabricInterface> {
        for _ in 0..self.inventory.num_devices(numa_node) {
            let fi = self.next_device(numa_node);

            if filter::should_ignore(self.filter, fi.name()) {
                trace!(device = %fi, "ignored by device filter");
                continue;
            }

            // Manually-declared interfaces are assumed to support the request.
            if !fi.class().is_manual() {
                if let Some(class) = self.class
                    && fi.class() != class
                {
                    trace!(device = %fi, requested = %class, "excluded: device class mismatch");
                    continue;
                }
                if !fi.has_provider(self.provider) {
                    trace!(device = %fi, provider = self.provider, "excluded: provider not supported");
                    continue;
                }
            }

            if let Err(e) = self.validate(fi) {
                info!(device = %fi, error = %e, "excluded");
                continue;
            }

            return Some(fi);
        }
        None
    }

    /// Round-robin step: return the device at the node's cursor and advance it.
    fn next_device(&mut self, numa_node: u32) -> &'a FabricInterface {
        let inventory: &'a NumaInventory = self.inventory;
        let devs = inventory.devices(numa_node);
        assert!(
            !devs.is_empty(),
            "no fabric interfaces on NUMA node {numa_node}"
        );
        let cursor = self.cursors.entry(numa_node).or_insert(0);
        let idx = *cursor % devs.len();
        *cursor = (idx + 1) % devs.len();
        &devs[idx]
    }

    fn validate(&self, fi: &FabricInterface) -> FabricResult<()> {
        let addrs = self
            .addrs
            .interface_addrs(fi.name())
            .map_err(|e| FabricError::Liveness {
                interface: fi.name().to_string(),
                reason: e.to_string(),
            })?;
        trace!(device = %fi, ?addrs, "interface addresses");
        if liveness::has_live_addr(&addrs) {
            Ok(())
        } else {
            Err(FabricError::Liveness {
                interface: fi.name().to_string(),
                reason: "no IP addresses".to_string(),
            })
        }
    }
}
