//! Notifications for the host UI.
//!
//! Handlers push `EditorEvent`s instead of invoking callbacks; the host
//! drains the queue after each call (or each frame) and updates its panels.

use atelier_core::id::ObjectId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ObjectAction {
    /// Open a hyperlink.
    Link { url: String, target: Option<String> },
    /// Run a trigger script in the host sandbox.
    Script { code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Record,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    Added { id: ObjectId },
    Removed { id: ObjectId },
    Modified { id: ObjectId },
    Selected { ids: Vec<ObjectId> },
    Zoomed { ratio: f64 },
    Tooltip { id: ObjectId, visible: bool },
    Action { id: ObjectId, action: ObjectAction },
    Imported { count: usize },
    Transaction { kind: TransactionKind, description: String },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<EditorEvent>,
    /// While set, `Added` is swallowed (loading from a document).
    suppress_added: bool,
}

impl EventQueue {
    pub fn push(&mut self, event: EditorEvent) {
        if self.suppress_added && matches!(event, EditorEvent::Added { .. }) {
            return;
        }
        log::trace!("event {event:?}");
        self.events.push(event);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.suppress_added = loading;
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }
}
