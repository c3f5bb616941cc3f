//! Port graph for workflow diagrams.
//!
//! Owns every node's ports and the attachment records of every link.
//! Links are addressed by id everywhere (ports keep link ids, never
//! positions into another port's list), so detaching one link never
//! shifts the bookkeeping of another.
//!
//! A `StableDiGraph` mirrors node-to-node connectivity. It answers
//! "is A already wired to B" and gives workflow export a stable order.

use crate::geometry::Geometry;
use crate::id::ObjectId;
use crate::port::{BROADCAST_FROM_PORT, Port, PortFeedback, PortId, PortKind};
use kurbo::Point;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Which end of a link to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    From,
    To,
}

/// Why two ports cannot be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    UnknownPort,
    NotAnOutput,
    NotAnInput,
    SelfLink,
    Duplicate,
    PortDisabled,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConnectError::UnknownPort => "port does not exist",
            ConnectError::NotAnOutput => "source is not an output port",
            ConnectError::NotAnInput => "target is not an input port",
            ConnectError::SelfLink => "cannot link a node to itself",
            ConnectError::Duplicate => "nodes are already linked from this port",
            ConnectError::PortDisabled => "source port already holds its link",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodePorts {
    pub to: Option<PortId>,
    pub from: SmallVec<[PortId; 2]>,
}

impl NodePorts {
    pub fn all(&self) -> impl Iterator<Item = PortId> + '_ {
        self.to.iter().copied().chain(self.from.iter().copied())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinkRecord {
    pub from: PortId,
    pub to: PortId,
    pub from_port_index: Option<usize>,
    edge: EdgeIndex,
}

/// Result of detaching a link.
#[derive(Debug, Clone, Default)]
pub struct Detached {
    /// Broadcast siblings whose `fromPortIndex` changed: `(link, new index)`.
    pub reindexed: Vec<(ObjectId, usize)>,
    /// Remaining link count on the broadcast port, when the source was one.
    pub broadcast_count: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PortGraph {
    ports: HashMap<PortId, Port>,
    nodes: HashMap<ObjectId, NodePorts>,
    links: HashMap<ObjectId, LinkRecord>,
    topology: StableDiGraph<ObjectId, ObjectId>,
    topology_index: HashMap<ObjectId, NodeIndex>,
}

impl PortGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Ports ───────────────────────────────────────────────────────────

    /// Register a node's ports, positioned against `geometry`.
    /// Replaces any ports the node already had; detach their links first.
    pub fn insert_ports(&mut self, node: ObjectId, ports: Vec<Port>, geometry: &Geometry) {
        self.remove_ports(node);
        let mut entry = NodePorts::default();
        for mut port in ports {
            port.update_position(geometry);
            match port.kind {
                PortKind::To => entry.to = Some(port.id),
                PortKind::From { .. } => entry.from.push(port.id),
            }
            self.ports.insert(port.id, port);
        }
        self.nodes.insert(node, entry);
        if !self.topology_index.contains_key(&node) {
            let idx = self.topology.add_node(node);
            self.topology_index.insert(node, idx);
        }
    }

    /// Drop a node's ports, keeping its topology vertex. Returns the removed ports.
    pub fn remove_ports(&mut self, node: ObjectId) -> Vec<Port> {
        let Some(entry) = self.nodes.remove(&node) else {
            return Vec::new();
        };
        entry.all().filter_map(|id| self.ports.remove(&id)).collect()
    }

    /// Forget the node entirely, including its topology vertex.
    pub fn remove_node(&mut self, node: ObjectId) -> Vec<Port> {
        let removed = self.remove_ports(node);
        if let Some(idx) = self.topology_index.remove(&node) {
            self.topology.remove_node(idx);
        }
        removed
    }

    pub fn node_ports(&self, node: ObjectId) -> Option<&NodePorts> {
        self.nodes.get(&node)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn ports_of(&self, node: ObjectId) -> Vec<&Port> {
        self.nodes
            .get(&node)
            .map(|entry| entry.all().filter_map(|id| self.ports.get(&id)).collect())
            .unwrap_or_default()
    }

    /// Recompute port positions from the node's geometry.
    /// Returns the ids of every link whose endpoints moved.
    pub fn update_positions(&mut self, node: ObjectId, geometry: &Geometry) -> Vec<ObjectId> {
        let Some(entry) = self.nodes.get(&node) else {
            return Vec::new();
        };
        let mut touched = Vec::new();
        for id in entry.all() {
            if let Some(port) = self.ports.get_mut(&id) {
                port.update_position(geometry);
                touched.extend(port.links.iter().copied());
            }
        }
        touched
    }

    pub fn set_feedback(&mut self, id: PortId, feedback: PortFeedback) -> bool {
        match self.ports.get_mut(&id) {
            Some(port) if port.feedback != feedback => {
                port.feedback = feedback;
                true
            }
            _ => false,
        }
    }

    pub fn clear_feedback(&mut self) {
        for port in self.ports.values_mut() {
            port.feedback = PortFeedback::Idle;
        }
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Check whether `from` → `to` would be a valid new link.
    pub fn can_connect(&self, from: PortId, to: PortId) -> Result<(), ConnectError> {
        let source = self.ports.get(&from).ok_or(ConnectError::UnknownPort)?;
        let target = self.ports.get(&to).ok_or(ConnectError::UnknownPort)?;
        if source.is_input() {
            return Err(ConnectError::NotAnOutput);
        }
        if !target.is_input() {
            return Err(ConnectError::NotAnInput);
        }
        if from.node == to.node {
            return Err(ConnectError::SelfLink);
        }
        let duplicate = source
            .links
            .iter()
            .filter_map(|link| self.links.get(link))
            .any(|record| record.to.node == to.node);
        if duplicate {
            return Err(ConnectError::Duplicate);
        }
        if !source.enabled {
            return Err(ConnectError::PortDisabled);
        }
        Ok(())
    }

    /// Attach `link` between two ports. Returns the broadcast index when the
    /// source is a broadcast port.
    pub fn connect(
        &mut self,
        link: ObjectId,
        from: PortId,
        to: PortId,
    ) -> Result<Option<usize>, ConnectError> {
        self.can_connect(from, to)?;
        let from_port_index = {
            let source = self.ports.get_mut(&from).ok_or(ConnectError::UnknownPort)?;
            let broadcast = is_broadcast(source);
            let index = broadcast.then_some(source.links.len());
            source.links.push(link);
            if !broadcast {
                source.enabled = false;
            }
            index
        };
        if let Some(target) = self.ports.get_mut(&to) {
            target.links.push(link);
        }
        let a = self.topology_vertex(from.node);
        let b = self.topology_vertex(to.node);
        let edge = self.topology.add_edge(a, b, link);
        self.links.insert(
            link,
            LinkRecord {
                from,
                to,
                from_port_index,
                edge,
            },
        );
        Ok(from_port_index)
    }

    pub fn link(&self, link: ObjectId) -> Option<&LinkRecord> {
        self.links.get(&link)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Canvas positions of a link's source and destination ports.
    pub fn endpoints(&self, link: ObjectId) -> Option<(Point, Point)> {
        let record = self.links.get(&link)?;
        let from = self.ports.get(&record.from)?;
        let to = self.ports.get(&record.to)?;
        Some((from.position, to.position))
    }

    /// Every link attached to any of the node's ports, without duplicates.
    pub fn links_of_node(&self, node: ObjectId) -> Vec<ObjectId> {
        let mut out: Vec<ObjectId> = Vec::new();
        for port in self.ports_of(node) {
            for link in &port.links {
                if !out.contains(link) {
                    out.push(*link);
                }
            }
        }
        out
    }

    /// Links leaving the node, grouped per output port in port order.
    pub fn outgoing(&self, node: ObjectId) -> Vec<ObjectId> {
        self.nodes
            .get(&node)
            .map(|entry| {
                entry
                    .from
                    .iter()
                    .filter_map(|id| self.ports.get(id))
                    .flat_map(|port| port.links.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Links arriving at the node's input port.
    pub fn incoming(&self, node: ObjectId) -> Vec<ObjectId> {
        self.nodes
            .get(&node)
            .and_then(|entry| entry.to)
            .and_then(|id| self.ports.get(&id))
            .map(|port| port.links.to_vec())
            .unwrap_or_default()
    }

    /// Detach a link from the requested side(s) and forget it.
    ///
    /// `None` detaches both ends. The link record and its topology edge are
    /// always removed; a side left attached is expected to be dropped along
    /// with its node by the caller.
    pub fn remove_link(&mut self, link: ObjectId, side: Option<LinkSide>) -> Option<Detached> {
        let record = self.links.remove(&link)?;
        self.topology.remove_edge(record.edge);
        let mut detached = Detached::default();
        if side != Some(LinkSide::To) {
            detached = self.detach_from(link, record.from);
        }
        if side != Some(LinkSide::From) {
            self.detach_to(link, record.to);
        }
        Some(detached)
    }

    fn detach_from(&mut self, link: ObjectId, from: PortId) -> Detached {
        let Some(port) = self.ports.get_mut(&from) else {
            return Detached::default();
        };
        port.links.retain(|l| *l != link);
        port.enabled = true;
        if !is_broadcast(port) {
            return Detached::default();
        }
        let siblings: Vec<ObjectId> = port.links.to_vec();
        let mut reindexed = Vec::new();
        for (index, sibling) in siblings.iter().enumerate() {
            let Some(record) = self.links.get_mut(sibling) else {
                continue;
            };
            if record.from_port_index != Some(index) {
                record.from_port_index = Some(index);
                reindexed.push((*sibling, index));
            }
        }
        Detached {
            reindexed,
            broadcast_count: Some(siblings.len()),
        }
    }

    fn detach_to(&mut self, link: ObjectId, to: PortId) {
        if let Some(port) = self.ports.get_mut(&to) {
            port.links.retain(|l| *l != link);
            port.enabled = true;
        }
    }

    // ─── Topology ────────────────────────────────────────────────────────

    fn topology_vertex(&mut self, node: ObjectId) -> NodeIndex {
        if let Some(idx) = self.topology_index.get(&node) {
            return *idx;
        }
        let idx = self.topology.add_node(node);
        self.topology_index.insert(node, idx);
        idx
    }

    /// Are `a` and `b` directly linked, in that direction?
    pub fn is_linked(&self, a: ObjectId, b: ObjectId) -> bool {
        match (self.topology_index.get(&a), self.topology_index.get(&b)) {
            (Some(ia), Some(ib)) => self.topology.contains_edge(*ia, *ib),
            _ => false,
        }
    }

    /// Nodes in dependency order, sources first. Falls back to `order`
    /// for the members of a cycle.
    pub fn topological_order(&self, order: &[ObjectId]) -> Vec<ObjectId> {
        match petgraph::algo::toposort(&self.topology, None) {
            Ok(sorted) => sorted.into_iter().map(|idx| self.topology[idx]).collect(),
            Err(cycle) => {
                log::debug!(
                    "workflow contains a cycle through {}",
                    self.topology[cycle.node_id()]
                );
                order.to_vec()
            }
        }
    }
}

fn is_broadcast(port: &Port) -> bool {
    port.id.name.as_str() == BROADCAST_FROM_PORT
}
