//! Render-layer queries the canvas controller relies on.
//!
//! Nothing here paints: the host draws. These are the geometric answers a
//! retained scene graph would otherwise provide (what is under the pointer,
//! how big a selection is, what a link's edge looks like).

pub mod bounds;
pub mod hit;
pub mod path;

pub use bounds::{object_bounds, union_bounds};
pub use hit::{hit_port, hit_test, hit_test_filtered, hit_test_rect};
pub use path::link_path;
