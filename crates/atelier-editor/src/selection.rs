use atelier_core::id::ObjectId;
use smallvec::SmallVec;

/// The active object(s). One id is a plain selection, more is an active
/// multi-selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: SmallVec<[ObjectId; 4]>,
}

impl Selection {
    pub fn single(id: ObjectId) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        Self { ids }
    }

    pub fn many(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        let mut out: SmallVec<[ObjectId; 4]> = SmallVec::new();
        for id in ids {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        Self { ids: out }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    /// The single active object, if exactly one is selected.
    pub fn active(&self) -> Option<ObjectId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    /// Shift-click behavior: add if absent, remove if present.
    pub fn toggle(&mut self, id: ObjectId) {
        if let Some(pos) = self.ids.iter().position(|i| *i == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|i| *i != id);
        before != self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
