use super::{Canvas, PendingLoad};
use crate::align::{self, Alignment};
use crate::events::EditorEvent;
use crate::modes::configure_object;
use crate::registry::Registry;
use crate::selection::Selection;
use crate::surface::LoadTicket;
use atelier_core::clipboard::Clipboard;
use atelier_core::error::{EditorError, EditorResult};
use atelier_core::factory::construct;
use atelier_core::geometry::Geometry;
use atelier_core::graph::LinkSide;
use atelier_core::id::ObjectId;
use atelier_core::model::{Flags, GroupProps, KindTag, ObjectKind, SceneObject};
use atelier_core::port::PortId;
use atelier_core::script::check_script;
use atelier_render::{object_bounds, union_bounds};
use kurbo::{Rect, Size, Vec2};
use serde_json::{Map, Value};

/// Keys a patch may never change.
const IMMUTABLE_KEYS: &[&str] = &["id", "type", "fromNode", "fromPort", "toNode", "toPort"];

/// How an object enters the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddOptions {
    /// Center on the visible area.
    pub centered: bool,
    /// Coming from a document or snapshot: keep the stored position and
    /// skip the history record.
    pub loaded: bool,
    /// Paint-order index. `None` appends; links default to just above the
    /// workarea.
    pub index: Option<usize>,
}

fn awaiting_decode(obj: &SceneObject) -> Option<String> {
    let image = obj.as_image()?;
    let src = image.src.clone()?;
    let g = &obj.geometry;
    (g.width <= 0.0 || g.height <= 0.0).then_some(src)
}

impl Canvas {
    // ─── Adding ──────────────────────────────────────────────────────────

    /// Build an object from a JSON descriptor and add it.
    pub fn add(&mut self, descriptor: Value, centered: bool) -> Option<ObjectId> {
        let obj = match construct(descriptor) {
            Ok(obj) => obj,
            Err(e) => {
                log::warn!("cannot add object: {e}");
                return None;
            }
        };
        self.add_object(obj, AddOptions {
            centered,
            ..AddOptions::default()
        })
    }

    /// Add a constructed object. Images without a known size are held
    /// until the host reports the decode through `complete_image_load`.
    pub fn add_object(&mut self, mut obj: SceneObject, options: AddOptions) -> Option<ObjectId> {
        if obj.is_workarea() {
            log::warn!("the workarea cannot be added");
            return None;
        }
        if self.registry.contains(obj.id) {
            log::warn!("object {} already exists", obj.id);
            return None;
        }
        if let Some(src) = awaiting_decode(&obj) {
            let id = obj.id;
            let ticket = self.issue_ticket(PendingLoad::Object {
                obj: Box::new(obj),
                options,
            });
            log::debug!("waiting on {ticket:?} for image {id}");
            self.surface.decode_image(ticket, &src);
            return Some(id);
        }

        let id = obj.id;
        self.prepare(&mut obj);
        if options.centered && !options.loaded && obj.as_link().is_none() {
            obj.geometry.set_center(self.visual_center());
        }
        let autoplay = !self.config.editable
            && obj
                .metadata
                .animation
                .as_ref()
                .is_some_and(|a| a.autoplay);

        if let Some(link) = obj.as_link() {
            let from = PortId {
                node: link.from_node,
                name: link.from_port,
            };
            let to = PortId {
                node: link.to_node,
                name: link.to_port,
            };
            match self.ports.connect(id, from, to) {
                Ok(index) => {
                    if let Some(link) = obj.as_link_mut() {
                        link.from_port_index = index;
                    }
                }
                Err(e) => {
                    log::warn!("cannot link {from:?} -> {to:?}: {e}");
                    return None;
                }
            }
            self.registry.insert(obj, options.index.or(Some(1)));
            self.sync_broadcast_count(from);
            self.sync_link(id);
        } else {
            let is_node = obj.as_node().is_some();
            self.registry.insert(obj, options.index);
            if is_node {
                self.create_ports(id);
            }
            self.mirror(id);
        }

        if autoplay {
            self.play_animation(id);
        }
        self.events.push(EditorEvent::Added { id });
        if !options.loaded {
            self.record("add");
        }
        self.render();
        Some(id)
    }

    /// Interactivity flags for a fresh object under the current mode.
    fn prepare(&self, obj: &mut SceneObject) {
        obj.flags = Flags::for_editable(self.config.editable, obj.flags.locked);
        if matches!(obj.kind, ObjectKind::Node(_) | ObjectKind::Link(_)) {
            obj.flags.has_controls = false;
        }
        configure_object(obj, self.mode.kind(), self.config.editable, None);
    }

    /// Host answer to `RenderSurface::decode_image`. Returns whether the
    /// ticket was still current.
    pub fn complete_image_load(&mut self, ticket: LoadTicket, result: Result<Size, String>) -> bool {
        let Some(load) = self.loads.remove(&ticket) else {
            log::debug!("ignoring stale {ticket:?}");
            return false;
        };
        match load {
            PendingLoad::Object { mut obj, options } => {
                let size = match result {
                    Ok(size) => size,
                    Err(msg) => {
                        log::error!("failed to decode image {}: {msg}", obj.id);
                        return false;
                    }
                };
                obj.geometry.width = size.width;
                obj.geometry.height = size.height;
                self.events.set_loading(options.loaded);
                let added = self.add_object(*obj, options).is_some();
                self.events.set_loading(self.loading);
                added
            }
            PendingLoad::Workarea { generation } => self.complete_workarea_load(generation, result),
        }
    }

    /// Drop a queued image that has not been added yet.
    fn cancel_pending(&mut self, id: ObjectId) -> bool {
        let ticket = self.loads.iter().find_map(|(ticket, load)| match load {
            PendingLoad::Object { obj, .. } if obj.id == id => Some(*ticket),
            _ => None,
        });
        ticket.is_some_and(|t| self.loads.remove(&t).is_some())
    }

    // ─── Removing ────────────────────────────────────────────────────────

    /// Remove the selection.
    pub fn remove(&mut self) -> bool {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return false;
        }
        self.clear_selection();
        let mut removed = false;
        for id in ids {
            removed |= self.remove_object(id);
        }
        if removed {
            self.record("remove");
        }
        removed
    }

    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let id = ObjectId::intern(id);
        if self.cancel_pending(id) {
            return true;
        }
        if !self.registry.contains(id) {
            log::warn!("object {id} not found");
            return false;
        }
        self.clear_selection();
        let removed = self.remove_object(id);
        if removed {
            self.record("remove");
        }
        removed
    }

    /// Remove one object and everything hanging off it. Nodes take their
    /// ports and links with them. No history record.
    pub(crate) fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(obj) = self.registry.get(id) else {
            return false;
        };
        if obj.is_workarea() {
            log::warn!("the workarea cannot be removed");
            return false;
        }
        match obj.tag() {
            KindTag::Link => return self.detach_link(id, None),
            KindTag::Node => {
                for link in self.ports.incoming(id) {
                    self.detach_link(link, Some(LinkSide::From));
                }
                for link in self.ports.outgoing(id) {
                    self.detach_link(link, Some(LinkSide::To));
                }
                self.ports.remove_node(id);
            }
            _ => {}
        }
        self.release_mode_target(id);
        self.animator.forget(id);
        let Some(obj) = self.registry.remove(id) else {
            return false;
        };
        if obj.is_dom_mirrored() {
            self.surface.remove_element(id);
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.selection.remove(id);
        self.events.push(EditorEvent::Removed { id });
        self.render();
        true
    }

    // ─── Duplicate / clipboard ───────────────────────────────────────────

    /// Clone the selection, offset by `duplicate_offset`. The clones become
    /// the selection.
    pub fn duplicate(&mut self) -> Vec<ObjectId> {
        let ids = self.selection.ids().to_vec();
        self.duplicate_ids(&ids)
    }

    pub fn duplicate_by_id(&mut self, id: &str) -> Option<ObjectId> {
        self.duplicate_ids(&[ObjectId::intern(id)]).into_iter().next()
    }

    fn duplicate_ids(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let sources: Vec<SceneObject> = ids
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .filter(|o| !o.is_workarea() && o.as_link().is_none())
            .cloned()
            .collect();
        if sources.is_empty() {
            log::warn!("nothing to duplicate");
            return Vec::new();
        }
        let clones = self.batch("duplicate", |canvas| {
            sources
                .into_iter()
                .filter_map(|mut obj| {
                    obj.name = Some(format!("{}_clone", obj.label()));
                    obj.id = ObjectId::fresh(obj.tag().as_str());
                    reset_fanout(&mut obj);
                    obj.geometry.translate(offset);
                    canvas.add_object(obj, AddOptions::default())
                })
                .collect::<Vec<_>>()
        });
        self.set_selection(Selection::many(clones.iter().copied()));
        clones
    }

    /// Copy the selection into the clipboard. Links are left behind.
    pub fn copy(&mut self) -> bool {
        let objects: Vec<SceneObject> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .filter(|o| !o.is_workarea() && o.as_link().is_none())
            .cloned()
            .collect();
        let Some(bounds) = union_bounds(objects.iter()) else {
            log::warn!("nothing selected to copy");
            return false;
        };
        match Clipboard::capture(&objects, bounds.origin()) {
            Ok(clipboard) => {
                log::debug!("copied {} object(s)", clipboard.len());
                self.clipboard = Some(clipboard);
                true
            }
            Err(e) => {
                log::warn!("copy failed: {e}");
                false
            }
        }
    }

    /// Paste the clipboard. Each paste lands `duplicate_offset` further
    /// from the previous one.
    pub fn paste(&mut self) -> Vec<ObjectId> {
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let Some(clipboard) = self.clipboard.as_mut() else {
            log::warn!("clipboard is empty");
            return Vec::new();
        };
        let shift = clipboard.next_paste_shift(offset);
        let objects = match clipboard.restore() {
            Ok(objects) => objects,
            Err(e) => {
                log::error!("paste failed: {e}");
                return Vec::new();
            }
        };
        let pasted = self.batch("paste", |canvas| {
            objects
                .into_iter()
                .filter_map(|mut obj| {
                    obj.id = ObjectId::fresh(obj.tag().as_str());
                    reset_fanout(&mut obj);
                    obj.geometry.translate(shift);
                    canvas.add_object(obj, AddOptions::default())
                })
                .collect::<Vec<_>>()
        });
        self.set_selection(Selection::many(pasted.iter().copied()));
        pasted
    }

    pub fn cut(&mut self) -> bool {
        self.copy() && self.remove()
    }

    // ─── Property patches ────────────────────────────────────────────────

    /// Set one property on the active object.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        let Some(id) = self.selection.active() else {
            log::warn!("no active object to set `{key}` on");
            return false;
        };
        self.set_by_id(id.as_str(), key, value)
    }

    /// Apply a property patch to the active object.
    pub fn set_object(&mut self, patch: Value) -> bool {
        let Some(id) = self.selection.active() else {
            log::warn!("no active object to patch");
            return false;
        };
        self.set_object_by_id(id.as_str(), patch)
    }

    pub fn set_by_id(&mut self, id: &str, key: &str, value: Value) -> bool {
        let mut patch = Map::new();
        patch.insert(key.to_string(), value);
        self.set_object_by_id(id, Value::Object(patch))
    }

    /// Apply a property patch. Only keys whose value differs are written.
    pub fn set_object_by_id(&mut self, id: &str, patch: Value) -> bool {
        let id = ObjectId::intern(id);
        match self.patch(id, patch) {
            Ok(changed) => changed,
            Err(e @ EditorError::UnsafeScript(_)) => {
                log::error!("{id}: {e}");
                false
            }
            Err(e) => {
                log::warn!("cannot modify {id}: {e}");
                false
            }
        }
    }

    fn patch(&mut self, id: ObjectId, patch: Value) -> EditorResult<bool> {
        let Value::Object(patch) = patch else {
            return Err(EditorError::InvalidOperation(
                "a patch must be a JSON object".into(),
            ));
        };
        let obj = self.registry.get(id).ok_or(EditorError::NotFound(id))?;
        let Value::Object(mut bag) = serde_json::to_value(obj)? else {
            return Err(EditorError::InvalidOperation(format!(
                "{id} is not a property bag"
            )));
        };

        let mut changed = Vec::new();
        for (key, value) in patch {
            if bag.get(&key) == Some(&value) {
                continue;
            }
            if IMMUTABLE_KEYS.contains(&key.as_str()) {
                return Err(EditorError::InvalidOperation(format!(
                    "`{key}` cannot be changed"
                )));
            }
            bag.insert(key.clone(), value);
            changed.push(key);
        }
        if changed.is_empty() {
            return Ok(false);
        }
        let touched = |key: &str| changed.iter().any(|k| k == key);

        let mut updated: SceneObject = serde_json::from_value(Value::Object(bag))?;
        if touched("trigger") {
            if let Some(code) = &updated.metadata.trigger.code {
                check_script(code)?;
            }
        }
        if touched("locked") {
            self.prepare(&mut updated);
        }
        let rebuild_ports =
            updated.as_node().is_some() && (touched("outPorts") || touched("outPortType"));

        if let Some(slot) = self.registry.get_mut(id) {
            *slot = updated;
        }
        if rebuild_ports {
            self.recreate_ports(id);
        } else {
            self.set_coords(id);
        }
        log::debug!("{id}: set {}", changed.join(", "));
        self.events.push(EditorEvent::Modified { id });
        self.record("modify");
        self.render();
        Ok(true)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select every selectable object. Locked objects and DOM-mirrored
    /// elements are left out.
    pub fn all_select(&mut self) -> bool {
        let ids: Vec<ObjectId> = self
            .registry
            .render_list()
            .iter()
            .filter(|o| {
                !o.is_workarea() && o.flags.evented && !o.flags.locked && !o.is_dom_mirrored()
            })
            .map(|o| o.id)
            .collect();
        match ids.len() {
            0 => false,
            1 => {
                self.set_selection(Selection::single(ids[0]));
                true
            }
            _ => {
                self.set_selection(Selection::many(ids));
                true
            }
        }
    }

    pub fn select(&mut self, id: &str) -> bool {
        let id = ObjectId::intern(id);
        match self.registry.get(id) {
            Some(obj) if !obj.is_workarea() => {
                self.set_selection(Selection::single(id));
                true
            }
            _ => {
                log::warn!("cannot select {id}");
                false
            }
        }
    }

    pub fn deselect(&mut self) {
        self.clear_selection();
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    pub fn bring_forward(&mut self) -> bool {
        self.reorder("bring forward", Registry::bring_forward)
    }

    pub fn send_backwards(&mut self) -> bool {
        self.reorder("send backwards", Registry::send_backwards)
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.reorder("bring to front", Registry::bring_to_front)
    }

    pub fn send_to_back(&mut self) -> bool {
        self.reorder("send to back", Registry::send_to_back)
    }

    fn reorder(&mut self, description: &str, op: fn(&mut Registry, ObjectId) -> bool) -> bool {
        let Some(id) = self.selection.active() else {
            return false;
        };
        let moved = op(&mut self.registry, id);
        if moved {
            self.record(description);
            self.render();
        }
        moved
    }

    // ─── Arrangement ─────────────────────────────────────────────────────

    /// Align a multi-selection against its common frame.
    pub fn align(&mut self, alignment: Alignment) -> bool {
        if !self.selection.is_multi() {
            log::warn!("align needs more than one selected object");
            return false;
        }
        let members: Vec<(ObjectId, Rect)> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .filter(|o| o.as_link().is_none())
            .map(|o| (o.id, object_bounds(o)))
            .collect();
        let moves = align::align(alignment, &members);
        if moves.is_empty() {
            return false;
        }
        for (id, delta) in moves {
            if let Some(obj) = self.registry.get_mut(id) {
                obj.geometry.translate(delta);
            }
            self.set_coords(id);
            self.events.push(EditorEvent::Modified { id });
        }
        self.record("align");
        self.render();
        true
    }

    /// Nudge the selection. Movement locks are honored per axis.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> bool {
        let ids = self.selection.ids().to_vec();
        let mut moved = false;
        for id in ids {
            let Some(obj) = self.registry.get_mut(id) else {
                continue;
            };
            if obj.as_link().is_some() {
                continue;
            }
            let delta = Vec2::new(
                if obj.flags.lock_movement_x { 0.0 } else { dx },
                if obj.flags.lock_movement_y { 0.0 } else { dy },
            );
            if delta == Vec2::ZERO {
                continue;
            }
            obj.geometry.translate(delta);
            self.set_coords(id);
            self.events.push(EditorEvent::Modified { id });
            moved = true;
        }
        if moved {
            self.record("nudge");
            self.render();
        }
        moved
    }

    /// Fold a multi-selection into a group. Nodes, links and DOM elements
    /// cannot be grouped.
    pub fn to_group(&mut self) -> Option<ObjectId> {
        if !self.selection.is_multi() {
            log::warn!("grouping needs more than one selected object");
            return None;
        }
        let ids = self.selection.ids().to_vec();
        let members: Vec<SceneObject> = ids
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .cloned()
            .collect();
        if members.iter().any(|o| {
            matches!(o.tag(), KindTag::Node | KindTag::Link) || o.is_dom_mirrored()
        }) {
            log::warn!("nodes, links and elements cannot be grouped");
            return None;
        }
        let bounds = union_bounds(members.iter())?;
        let origin = bounds.origin().to_vec2();
        let children = members
            .into_iter()
            .map(|mut child| {
                child.geometry.translate(-origin);
                child.flags = Flags::default();
                child
            })
            .collect();
        let mut group = SceneObject::new(
            ObjectId::fresh("group"),
            ObjectKind::Group(GroupProps { objects: children }),
            Geometry::new(bounds.x0, bounds.y0, bounds.width(), bounds.height()),
        );
        group.appearance.fill = None;

        self.clear_selection();
        let id = self.batch("group", |canvas| {
            for id in &ids {
                canvas.remove_object(*id);
            }
            canvas.add_object(group, AddOptions::default())
        })?;
        self.set_selection(Selection::single(id));
        Some(id)
    }

    /// Break the active group back into individual objects, which become
    /// the selection.
    pub fn to_active_selection(&mut self) -> Vec<ObjectId> {
        let Some(group) = self.active_object().cloned() else {
            return Vec::new();
        };
        let group_id = group.id;
        let frame = group.geometry;
        let ObjectKind::Group(props) = group.kind else {
            log::warn!("{group_id} is not a group");
            return Vec::new();
        };
        self.clear_selection();
        let ids = self.batch("ungroup", |canvas| {
            canvas.remove_object(group_id);
            props
                .objects
                .into_iter()
                .filter_map(|mut child| {
                    let g = &mut child.geometry;
                    g.left = frame.left + g.left * frame.scale_x;
                    g.top = frame.top + g.top * frame.scale_y;
                    g.scale_x *= frame.scale_x;
                    g.scale_y *= frame.scale_y;
                    if canvas.registry.contains(child.id) {
                        child.id = ObjectId::fresh(child.tag().as_str());
                    }
                    canvas.add_object(child, AddOptions::default())
                })
                .collect::<Vec<_>>()
        });
        self.set_selection(Selection::many(ids.iter().copied()));
        ids
    }
}

/// Copies start with no fanned-out links.
fn reset_fanout(obj: &mut SceneObject) {
    if let Some(node) = obj.as_node_mut() {
        node.broadcast_count = 0;
    }
}
