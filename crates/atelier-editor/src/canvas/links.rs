use super::{AddOptions, Canvas};
use crate::events::EditorEvent;
use crate::modes::{LinkDraft, Mode};
use atelier_core::factory::construct;
use atelier_core::graph::LinkSide;
use atelier_core::id::ObjectId;
use atelier_core::model::KindTag;
use atelier_core::port::{BROADCAST_FROM_PORT, Port, PortFeedback, PortId, layout_for};
use atelier_render::hit_port;
use atelier_render::link_path;
use atelier_render::path::bounds as path_bounds;
use kurbo::Point;
use serde_json::json;

impl Canvas {
    // ─── Ports ───────────────────────────────────────────────────────────

    /// Build a node's ports from its port layout. Existing ports are
    /// replaced; detach their links first.
    pub fn create_ports(&mut self, node: ObjectId) -> bool {
        let Some(obj) = self.registry.get(node) else {
            log::warn!("node {node} not found");
            return false;
        };
        let Some(shape) = obj.as_node() else {
            log::warn!("{node} is not a node");
            return false;
        };
        let layout = layout_for(shape);
        let mut ports = Vec::new();
        if let Some(spec) = layout.in_port(shape) {
            ports.push(Port::new(PortId::new(node, &spec.name), spec.kind, spec.offset));
        }
        for spec in layout.from_ports(shape, &obj.geometry) {
            ports.push(Port::new(PortId::new(node, &spec.name), spec.kind, spec.offset));
        }
        let geometry = obj.geometry.clone();
        self.ports.insert_ports(node, ports, &geometry);
        true
    }

    /// Rebuild a node's ports after its output list changed. Links whose
    /// ports survive are reattached; the rest are removed.
    pub fn recreate_ports(&mut self, node: ObjectId) -> bool {
        if self.registry.get(node).and_then(|o| o.as_node()).is_none() {
            log::warn!("{node} is not a node");
            return false;
        }
        let attached: Vec<(ObjectId, PortId, PortId)> = self
            .ports
            .links_of_node(node)
            .into_iter()
            .filter_map(|link| self.ports.link(link).map(|r| (link, r.from, r.to)))
            .collect();
        for (link, _, _) in &attached {
            self.ports.remove_link(*link, None);
        }
        self.create_ports(node);
        for (link, from, to) in attached {
            match self.ports.connect(link, from, to) {
                Ok(index) => {
                    if let Some(shape) = self.registry.get_mut(link).and_then(|o| o.as_link_mut()) {
                        shape.from_port_index = index;
                    }
                    self.sync_link(link);
                }
                Err(e) => {
                    log::debug!("dropping link {link}: {e}");
                    if self.registry.remove(link).is_some() {
                        self.events.push(EditorEvent::Removed { id: link });
                    }
                }
            }
            self.sync_broadcast_count(from);
        }
        self.render();
        true
    }

    /// Refresh everything derived from an object's geometry: port
    /// positions, attached link paths, DOM mirrors.
    pub fn set_coords(&mut self, id: ObjectId) {
        let Some(obj) = self.registry.get(id) else {
            return;
        };
        match obj.tag() {
            KindTag::Node => {
                let geometry = obj.geometry.clone();
                for link in self.ports.update_positions(id, &geometry) {
                    self.sync_link(link);
                }
            }
            KindTag::Link => self.sync_link(id),
            _ => self.mirror(id),
        }
    }

    /// Snap a link's endpoints to its ports and recompute its bounds.
    pub(crate) fn sync_link(&mut self, id: ObjectId) {
        let Some((start, end)) = self.ports.endpoints(id) else {
            return;
        };
        let Some(obj) = self.registry.get_mut(id) else {
            return;
        };
        let Some(link) = obj.as_link_mut() else {
            return;
        };
        link.x1 = start.x;
        link.y1 = start.y;
        link.x2 = end.x;
        link.y2 = end.y;
        let bounds = path_bounds(&link_path(start, end, link.line_style));
        let g = &mut obj.geometry;
        g.left = bounds.x0;
        g.top = bounds.y0;
        g.width = bounds.width();
        g.height = bounds.height();
    }

    /// Mirror a broadcast port's link count onto its node.
    pub(crate) fn sync_broadcast_count(&mut self, port: PortId) {
        if port.name.as_str() != BROADCAST_FROM_PORT {
            return;
        }
        let Some(count) = self.ports.port(port).map(|p| p.links.len()) else {
            return;
        };
        if let Some(node) = self.registry.get_mut(port.node).and_then(|o| o.as_node_mut()) {
            node.broadcast_count = count;
        }
    }

    /// Hover feedback for the port under `point`.
    pub(crate) fn update_port_hover(&mut self, point: Point) {
        let hit = hit_port(&self.ports, point);
        if hit == self.hovered_port {
            return;
        }
        self.ports.clear_feedback();
        self.hovered_port = hit;
        if let Some(port) = hit {
            let feedback = self.port_feedback(port);
            self.ports.set_feedback(port, feedback);
        }
        self.render();
    }

    fn port_feedback(&self, port: PortId) -> PortFeedback {
        let Some(p) = self.ports.port(port) else {
            return PortFeedback::Idle;
        };
        match &self.mode {
            Mode::Link(draft) if p.is_input() => match self.ports.can_connect(draft.from, port) {
                Ok(()) => PortFeedback::Hover,
                Err(_) => PortFeedback::Error,
            },
            Mode::Selection if !p.is_input() && p.enabled && self.config.editable => {
                PortFeedback::Hover
            }
            _ => PortFeedback::Idle,
        }
    }

    // ─── Drawing links ───────────────────────────────────────────────────

    /// Start drawing a link from an output port.
    pub fn start_link(&mut self, from: PortId) -> bool {
        if !self.config.editable {
            return false;
        }
        let Some(port) = self.ports.port(from) else {
            log::warn!("port {from:?} not found");
            return false;
        };
        if port.is_input() || !port.enabled {
            log::warn!("port {from:?} cannot start a link");
            return false;
        }
        let start = port.position;
        self.enter_mode(
            Mode::Link(LinkDraft {
                from,
                start,
                pointer: start,
            }),
            None,
        );
        self.overlay.provisional_link = Some([start.x, start.y, start.x, start.y]);
        self.push_overlay();
        self.render();
        true
    }

    /// Complete the link being drawn onto `to`. Invalid targets leave the
    /// scene untouched.
    pub fn link_generate(&mut self, to: PortId) -> Option<ObjectId> {
        let Mode::Link(draft) = &self.mode else {
            log::warn!("no link is being drawn");
            return None;
        };
        let from = draft.from;
        self.connect_ports(from, to)
    }

    /// Create a link object between two ports.
    pub fn connect_ports(&mut self, from: PortId, to: PortId) -> Option<ObjectId> {
        if let Err(e) = self.ports.can_connect(from, to) {
            log::warn!("cannot link {from:?} -> {to:?}: {e}");
            return None;
        }
        let descriptor = json!({
            "type": "link",
            "fromNode": from.node.as_str(),
            "fromPort": from.name.as_str(),
            "toNode": to.node.as_str(),
            "toPort": to.name.as_str(),
            "lineStyle": self.config.link_style,
        });
        let obj = match construct(descriptor) {
            Ok(obj) => obj,
            Err(e) => {
                log::warn!("cannot build link: {e}");
                return None;
            }
        };
        self.add_object(obj, AddOptions::default())
    }

    /// Leave link mode, dropping the provisional link.
    pub fn finish_link(&mut self) -> bool {
        if !matches!(self.mode, Mode::Link(_)) {
            return false;
        }
        self.enter_mode(Mode::Selection, None);
        true
    }

    // ─── Removing links ──────────────────────────────────────────────────

    /// Remove a link. `side` limits the port bookkeeping to one end; the
    /// other end is assumed to be going away with its node.
    pub fn remove_link(&mut self, id: ObjectId, side: Option<LinkSide>) -> bool {
        self.clear_selection();
        let removed = self.detach_link(id, side);
        if removed {
            self.record("remove link");
        }
        removed
    }

    pub(crate) fn detach_link(&mut self, id: ObjectId, side: Option<LinkSide>) -> bool {
        let from = self.ports.link(id).map(|r| r.from);
        if let Some(detached) = self.ports.remove_link(id, side) {
            for (sibling, index) in detached.reindexed {
                if let Some(link) = self.registry.get_mut(sibling).and_then(|o| o.as_link_mut()) {
                    link.from_port_index = Some(index);
                }
            }
            if let (Some(count), Some(from)) = (detached.broadcast_count, from) {
                if let Some(node) = self.registry.get_mut(from.node).and_then(|o| o.as_node_mut()) {
                    node.broadcast_count = count;
                }
            }
        }
        if self.registry.remove(id).is_none() {
            return false;
        }
        self.selection.remove(id);
        self.events.push(EditorEvent::Removed { id });
        self.render();
        true
    }
}
