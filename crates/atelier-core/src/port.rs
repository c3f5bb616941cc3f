//! Node ports and the per-node-subtype port layout strategies.
//!
//! Ports are not scene objects of their own in the exported document: they
//! are rebuilt from their node every time the node is added. A port's
//! canvas position is always `anchor(node) + offset`, where the anchor is
//! the top-center (input) or bottom-center (outputs) of the node's bounds.

use crate::geometry::Geometry;
use crate::id::ObjectId;
use crate::model::{InPortType, NodeShape, OutPortType};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use std::fmt;

pub const DEFAULT_IN_PORT: &str = "defaultInPort";
pub const DEFAULT_FROM_PORT: &str = "defaultFromPort";
pub const BROADCAST_FROM_PORT: &str = "broadcastFromPort";

/// Port hit radius in canvas units.
pub const PORT_RADIUS: f64 = 10.0;

/// A port is addressed by its owning node plus a name unique within that node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId {
    pub node: ObjectId,
    pub name: ObjectId,
}

impl PortId {
    pub fn new(node: ObjectId, name: &str) -> Self {
        Self {
            node,
            name: ObjectId::intern(name),
        }
    }
}

impl fmt::Debug for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Input port, one per node.
    To,
    /// Output port; `index` is its position along the bottom edge.
    From { index: usize },
}

/// Fill colors used for interactive feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct PortColors {
    pub origin: String,
    pub hover: String,
    pub error: String,
}

impl Default for PortColors {
    fn default() -> Self {
        Self {
            origin: "#DDDDDD".into(),
            hover: "#00C3FF".into(),
            error: "#FF4040".into(),
        }
    }
}

/// Current hover feedback state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortFeedback {
    #[default]
    Idle,
    Hover,
    Error,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    pub kind: PortKind,
    /// Offset from the anchor (`leftDiff` / `topDiff`).
    pub offset: Vec2,
    pub position: Point,
    /// Ids of the links attached, in attach order.
    pub links: SmallVec<[ObjectId; 2]>,
    pub enabled: bool,
    pub colors: PortColors,
    pub feedback: PortFeedback,
}

impl Port {
    pub fn new(id: PortId, kind: PortKind, offset: Vec2) -> Self {
        Self {
            id,
            kind,
            offset,
            position: Point::ZERO,
            links: SmallVec::new(),
            enabled: true,
            colors: PortColors::default(),
            feedback: PortFeedback::Idle,
        }
    }

    pub fn is_input(&self) -> bool {
        self.kind == PortKind::To
    }

    /// Fill for the current feedback state.
    pub fn fill(&self) -> &str {
        match self.feedback {
            PortFeedback::Idle => &self.colors.origin,
            PortFeedback::Hover => &self.colors.hover,
            PortFeedback::Error => &self.colors.error,
        }
    }

    /// Recompute the position from the owning node's geometry.
    pub fn update_position(&mut self, node: &Geometry) {
        self.position = anchor(node, self.kind) + self.offset;
    }
}

/// Top-center for the input port, bottom-center for outputs.
pub fn anchor(node: &Geometry, kind: PortKind) -> Point {
    let bounds = node.bounding_rect();
    let x = bounds.center().x;
    match kind {
        PortKind::To => Point::new(x, bounds.y0),
        PortKind::From { .. } => Point::new(x, bounds.y1),
    }
}

/// A port the layout wants to exist, before positioning.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    pub name: String,
    pub kind: PortKind,
    pub offset: Vec2,
}

/// Decides which ports a node carries and where they sit.
pub trait NodePortLayout {
    fn in_port(&self, node: &NodeShape) -> Option<PortSpec> {
        match node.in_port_type {
            InPortType::Single => Some(PortSpec {
                name: DEFAULT_IN_PORT.into(),
                kind: PortKind::To,
                offset: Vec2::ZERO,
            }),
            InPortType::None => None,
        }
    }

    fn from_ports(&self, node: &NodeShape, geometry: &Geometry) -> Vec<PortSpec>;
}

/// Single output centered on the bottom edge.
pub struct DefaultPortLayout;

impl NodePortLayout for DefaultPortLayout {
    fn from_ports(&self, node: &NodeShape, _geometry: &Geometry) -> Vec<PortSpec> {
        let name = match node.out_port_type {
            OutPortType::None => return Vec::new(),
            OutPortType::Broadcast => BROADCAST_FROM_PORT,
            _ => DEFAULT_FROM_PORT,
        };
        vec![PortSpec {
            name: name.into(),
            kind: PortKind::From { index: 0 },
            offset: Vec2::ZERO,
        }]
    }
}

/// N named outputs, each centered in an equal slice of the bottom edge.
/// Used by branching logic nodes (filter / switch).
pub struct BranchingPortLayout;

impl NodePortLayout for BranchingPortLayout {
    fn from_ports(&self, node: &NodeShape, geometry: &Geometry) -> Vec<PortSpec> {
        let n = node.out_ports.len();
        if n == 0 {
            return Vec::new();
        }
        let width = geometry.scaled_size().width;
        let slice = width / n as f64;
        node.out_ports
            .iter()
            .enumerate()
            .map(|(index, name)| PortSpec {
                name: name.clone(),
                kind: PortKind::From { index },
                offset: Vec2::new(slice * (index as f64 + 0.5) - width / 2.0, 0.0),
            })
            .collect()
    }
}

/// Pick the layout strategy for a node.
pub fn layout_for(node: &NodeShape) -> &'static dyn NodePortLayout {
    let branching = matches!(
        node.out_port_type,
        OutPortType::Static | OutPortType::Dynamic
    );
    if branching && !node.out_ports.is_empty() {
        return &BranchingPortLayout;
    }
    &DefaultPortLayout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(out: OutPortType, ports: &[&str]) -> NodeShape {
        NodeShape {
            out_port_type: out,
            out_ports: ports.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn default_layout_anchors_top_and_bottom_center() {
        let geometry = Geometry::new(0.0, 0.0, 200.0, 60.0);
        let shape = node(OutPortType::Single, &[]);
        let layout = layout_for(&shape);
        let input = layout.in_port(&shape).unwrap();
        let outputs = layout.from_ports(&shape, &geometry);
        assert_eq!(outputs.len(), 1);

        let mut to = Port::new(PortId::new(ObjectId::intern("n"), &input.name), input.kind, input.offset);
        to.update_position(&geometry);
        assert_eq!(to.position, Point::new(100.0, 0.0));

        let spec = &outputs[0];
        let mut from = Port::new(PortId::new(ObjectId::intern("n"), &spec.name), spec.kind, spec.offset);
        from.update_position(&geometry);
        assert_eq!(from.position, Point::new(100.0, 60.0));
    }

    #[test]
    fn branching_layout_splits_bottom_edge() {
        let geometry = Geometry::new(0.0, 0.0, 200.0, 60.0);
        let shape = node(OutPortType::Static, &["true", "false"]);
        let specs = layout_for(&shape).from_ports(&shape, &geometry);
        let xs: Vec<f64> = specs.iter().map(|s| s.offset.x).collect();
        assert_eq!(xs, vec![-50.0, 50.0]);
        assert_eq!(specs[1].kind, PortKind::From { index: 1 });
    }

    #[test]
    fn trigger_nodes_have_no_input() {
        let mut shape = node(OutPortType::Broadcast, &[]);
        shape.in_port_type = InPortType::None;
        let layout = layout_for(&shape);
        assert!(layout.in_port(&shape).is_none());
        let specs = layout.from_ports(&shape, &Geometry::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(specs[0].name, BROADCAST_FROM_PORT);
    }
}
