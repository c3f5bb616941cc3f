pub mod clipboard;
pub mod color;
pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod model;
pub mod port;
pub mod script;
pub mod serialize;
pub mod workarea;
pub mod workflow;

pub use clipboard::Clipboard;
pub use color::Color;
pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use factory::construct;
pub use geometry::{Geometry, OriginX, OriginY};
pub use graph::{ConnectError, LinkSide, PortGraph};
pub use id::ObjectId;
pub use model::*;
pub use port::{Port, PortFeedback, PortId, PortKind};
pub use serialize::{export_objects, parse_document};
pub use workflow::WorkflowDocument;

// Re-export kurbo so downstream crates share one geometry vocabulary.
pub use kurbo;
