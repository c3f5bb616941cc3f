//! Canvas controller for atelier documents.
//!
//! `Canvas` is the entry point. Hosts feed it `InputEvent`s, drain
//! `EditorEvent`s, and implement `RenderSurface` to paint, decode images
//! and mirror DOM elements.

pub mod align;
pub mod animation;
pub mod canvas;
pub mod crop;
pub mod events;
pub mod grid;
pub mod guidelines;
pub mod history;
pub mod input;
pub mod modes;
pub mod registry;
pub mod selection;
pub mod shortcuts;
pub mod surface;
pub mod viewport;

pub use align::Alignment;
pub use canvas::{AddOptions, Canvas};
pub use events::{EditorEvent, ObjectAction, TransactionKind};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use modes::{InteractionMode, ObjectPredicate};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use surface::{
    Cursor, ElementFrame, LoadTicket, NullSurface, Overlay, RecordingSurface, RenderSurface,
};
