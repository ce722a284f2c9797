//! fabric-select: NUMA-aware fabric interface selection for the storage agent.
//!
//! Before the agent opens an RPC transport for a client it needs a fabric
//! interface that sits on the client's NUMA node, supports the requested
//! provider and device class, and has a live address. This crate owns that
//! choice:
//!
//! - Keeps an inventory of fabric interfaces per NUMA node
//! - Selects interfaces round-robin, falling back across NUMA nodes
//! - Applies include/exclude device filters from configuration
//! - Looks interfaces up by name, domain and provider
//!
//! # Architecture
//!
//! ```text
//! FabricScan / AgentConfig.fabric_ifaces
//!   └── NumaFabric::from_scan / from_config
//!         └── NumaFabric
//!               ├── NumaInventory (node → [FabricInterface])
//!               ├── per-node round-robin cursors + fallback cursor
//!               ├── DeviceFilter (optional)
//!               └── AddrSource (liveness, default SystemAddrs)
//! ```

pub mod builder;
pub mod class;
pub mod config;
pub mod error;
pub mod fabric;
pub mod filter;
pub mod interface;
pub mod inventory;
pub mod liveness;

pub use builder::{FabricScan, HardwareFabricInterface};
pub use class::NetDevClass;
pub use config::{AgentConfig, FabricInterfaceConfig, NumaFabricConfig};
pub use error::{ConfigError, FabricError, FabricResult};
pub use fabric::{InventoryReadGuard, InventoryWriteGuard, NumaFabric};
pub use filter::{DeviceFilter, FilterMode};
pub use interface::{FabricIfaceParams, FabricInterface, SelectedInterface};
pub use inventory::NumaInventory;
pub use liveness::{AddrSource, SystemAddrs};
