//! NUMA node → fabric interface inventory.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::interface::FabricInterface;

/// Fabric interfaces grouped by NUMA node.
///
/// Per-node order is insertion order and is the round-robin order used by
/// the selection engine. A node is present only while it holds at least
/// one interface. Nodes iterate in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NumaInventory {
    nodes: BTreeMap<u32, Vec<FabricInterface>>,
}

impl NumaInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interface to a node's list.
    pub fn add(&mut self, numa_node: u32, fi: FabricInterface) {
        self.nodes.entry(numa_node).or_default().push(fi);
    }

    /// Number of interfaces on a node (0 for absent nodes).
    pub fn num_devices(&self, numa_node: u32) -> usize {
        self.nodes.get(&numa_node).map_or(0, Vec::len)
    }

    /// Number of populated NUMA nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Highest populated NUMA node id.
    pub fn max_numa_node(&self) -> Option<u32> {
        self.nodes.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Populated node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.keys().copied()
    }

    pub fn devices(&self, numa_node: u32) -> &[FabricInterface] {
        self.nodes.get(&numa_node).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[FabricInterface])> {
        self.nodes.iter().map(|(node, devs)| (*node, devs.as_slice()))
    }

    /// Total interfaces across all nodes.
    pub fn total_devices(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    /// Keep only interfaces matching `keep`. Nodes left empty are removed.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(u32, &FabricInterface) -> bool,
    {
        self.nodes.retain(|node, devs| {
            devs.retain(|fi| keep(*node, fi));
            !devs.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(name: &str) -> FabricInterface {
        FabricInterface::manual(name, None).unwrap()
    }

    #[test]
    fn empty_inventory() {
        let inv = NumaInventory::new();
        assert!(inv.is_empty());
        assert_eq!(inv.num_nodes(), 0);
        assert_eq!(inv.num_devices(0), 0);
        assert_eq!(inv.max_numa_node(), None);
        assert!(inv.devices(3).is_empty());
    }

    #[test]
    fn add_preserves_order() {
        let mut inv = NumaInventory::new();
        inv.add(1, manual("a"));
        inv.add(1, manual("b"));
        inv.add(0, manual("c"));

        let names: Vec<_> = inv.devices(1).iter().map(|fi| fi.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(inv.num_devices(1), 2);
        assert_eq!(inv.num_nodes(), 2);
        assert_eq!(inv.total_devices(), 3);
    }

    #[test]
    fn nodes_ascend() {
        let mut inv = NumaInventory::new();
        inv.add(3, manual("a"));
        inv.add(0, manual("b"));
        inv.add(7, manual("c"));

        assert_eq!(inv.node_ids().collect::<Vec<_>>(), [0, 3, 7]);
        assert_eq!(inv.max_numa_node(), Some(7));
    }

    #[test]
    fn retain_drops_empty_nodes() {
        let mut inv = NumaInventory::new();
        inv.add(0, manual("a"));
        inv.add(1, manual("b"));
        inv.add(1, manual("c"));

        inv.retain(|_, fi| fi.name() != "a" && fi.name() != "b");

        assert_eq!(inv.node_ids().collect::<Vec<_>>(), [1]);
        assert_eq!(inv.num_devices(1), 1);
    }

    #[test]
    fn serializes_as_node_map() {
        let mut inv = NumaInventory::new();
        inv.add(1, manual("ib0"));

        let json = serde_json::to_value(&inv).unwrap();
        assert_eq!(json["1"][0]["name"], "ib0");
        assert_eq!(json["1"][0]["class"], "manual");
    }
}
