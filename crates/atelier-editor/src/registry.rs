//! Object registry.
//!
//! Objects live in paint order with the workarea pinned at index 0. Export
//! and `get_objects` walk this list. Ids are unique.

use atelier_core::id::ObjectId;
use atelier_core::model::SceneObject;

#[derive(Debug, Default, Clone)]
pub struct Registry {
    render: Vec<SceneObject>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.render.len()
    }

    pub fn is_empty(&self) -> bool {
        self.render.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.render.iter().position(|o| o.id == id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.render.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.render.iter_mut().find(|o| o.id == id)
    }

    /// Paint-ordered objects, workarea first.
    pub fn render_list(&self) -> &[SceneObject] {
        &self.render
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.render.iter_mut()
    }

    pub fn workarea(&self) -> Option<&SceneObject> {
        self.render.first().filter(|o| o.is_workarea())
    }

    pub fn workarea_mut(&mut self) -> Option<&mut SceneObject> {
        self.render.first_mut().filter(|o| o.is_workarea())
    }

    /// Insert at `index` in paint order (clamped above the workarea).
    /// Returns `false` if the id is already present.
    pub fn insert(&mut self, obj: SceneObject, index: Option<usize>) -> bool {
        if self.contains(obj.id) {
            log::warn!("object {} already registered", obj.id);
            return false;
        }
        if obj.is_workarea() {
            self.render.insert(0, obj);
            return true;
        }
        let floor = self.floor();
        let at = index.map_or(self.render.len(), |i| i.clamp(floor, self.render.len()));
        self.render.insert(at, obj);
        true
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let idx = self.index_of(id)?;
        Some(self.render.remove(idx))
    }

    /// Drop everything except the workarea.
    pub fn clear_objects(&mut self) -> Vec<SceneObject> {
        let floor = self.floor();
        let removed: Vec<SceneObject> = self.render.drain(floor..).collect();
        removed
    }

    /// Lowest index a non-workarea object may occupy.
    fn floor(&self) -> usize {
        usize::from(self.workarea().is_some())
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Move to `index`, never below the workarea. Returns whether it moved.
    pub fn move_to(&mut self, id: ObjectId, index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        if self.render[from].is_workarea() {
            return false;
        }
        let to = index.clamp(self.floor(), self.render.len() - 1);
        if from == to {
            return false;
        }
        let obj = self.render.remove(from);
        self.render.insert(to, obj);
        true
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        self.index_of(id).is_some_and(|i| self.move_to(id, i + 1))
    }

    pub fn send_backwards(&mut self, id: ObjectId) -> bool {
        self.index_of(id)
            .is_some_and(|i| i > self.floor() && self.move_to(id, i - 1))
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        let last = self.render.len().saturating_sub(1);
        self.move_to(id, last)
    }

    /// Directly above the workarea, which stays pinned at 0.
    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        let floor = self.floor();
        self.move_to(id, floor)
    }
}
