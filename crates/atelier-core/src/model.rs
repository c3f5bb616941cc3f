//! Scene object model.
//!
//! Every renderable entity on the canvas is a `SceneObject`: identity,
//! geometry, appearance, behavioral flags and free-form metadata, plus a
//! kind-specific payload (`ObjectKind`). The JSON form is a flat property
//! bag with a `type` tag, which is what import/export exchange.

use crate::geometry::Geometry;
use crate::id::ObjectId;
use serde::{Deserialize, Serialize};

// ─── Appearance ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "rgba(0,0,0,0.3)".into(),
            blur: 15.0,
            offset_x: 10.0,
            offset_y: 10.0,
        }
    }
}

/// Render state. Paints are CSS strings; `color::Color` parses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appearance {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub shadow: Option<Shadow>,
    pub visible: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            fill: Some("rgba(0, 0, 0, 1)".into()),
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            shadow: None,
            visible: true,
        }
    }
}

// ─── Behavior ────────────────────────────────────────────────────────────

/// Interactivity flags. Reconfigured whenever the interaction mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flags {
    pub selectable: bool,
    pub evented: bool,
    pub locked: bool,
    pub has_controls: bool,
    pub has_borders: bool,
    pub lock_movement_x: bool,
    pub lock_movement_y: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            locked: false,
            has_controls: true,
            has_borders: true,
            lock_movement_x: false,
            lock_movement_y: false,
        }
    }
}

impl Flags {
    /// Defaults derived from the canvas `editable` option.
    pub fn for_editable(editable: bool, locked: bool) -> Self {
        Self {
            selectable: editable,
            evented: true,
            locked,
            has_controls: editable && !locked,
            has_borders: editable,
            lock_movement_x: !editable || locked,
            lock_movement_y: !editable || locked,
        }
    }
}

// ─── Metadata bags ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tooltip {
    pub enabled: bool,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    #[default]
    Url,
    Script,
}

/// What happens when a non-editable canvas is clicked on this object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trigger {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub url: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hyperlink {
    pub enabled: bool,
    pub url: Option<String>,
    pub target: Option<String>,
}

/// Easing curve for animations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    CubicBezier(f64, f64, f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    None,
    Fade,
    Bounce,
    Shake,
    Scaling,
    Rotation,
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

/// Declarative per-object animation. Type-specific parameters are optional
/// and fall back to the defaults documented on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationDescriptor {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    /// Milliseconds before the first frame.
    pub delay: f64,
    /// Milliseconds per pass.
    pub duration: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub autoplay: bool,
    pub easing: Easing,
    /// fade: target opacity (default 0).
    pub opacity: Option<f64>,
    /// bounce/shake: axis of motion.
    pub axis: Axis,
    /// bounce/shake: distance in px (default 10 for shake, 20 for bounce).
    pub offset: Option<f64>,
    /// scaling: factor applied to the current scale (default 2).
    pub scale: Option<f64>,
    /// rotation: degrees added to the current angle (default 360).
    pub angle: Option<f64>,
    /// flash: target fill / stroke colors.
    pub fill: Option<String>,
    pub stroke: Option<String>,
}

impl Default for AnimationDescriptor {
    fn default() -> Self {
        Self {
            kind: AnimationKind::None,
            delay: 0.0,
            duration: 1000.0,
            looping: false,
            autoplay: false,
            easing: Easing::default(),
            opacity: None,
            axis: Axis::Horizontal,
            offset: None,
            scale: None,
            angle: None,
            fill: None,
            stroke: None,
        }
    }
}

/// Free-form metadata carried through import/export untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub animation: Option<AnimationDescriptor>,
    pub tooltip: Tooltip,
    pub trigger: Trigger,
    pub user_property: serde_json::Map<String, serde_json::Value>,
    pub link: Hyperlink,
}

// ─── Kind payloads ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkareaLayout {
    #[default]
    Fixed,
    Responsive,
    Fullscreen,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkareaProps {
    pub layout: WorkareaLayout,
    /// Background image, if any.
    pub src: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Circle,
    Ellipse,
    Triangle,
    Line,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeProps {
    pub shape: ShapeKind,
    pub rx: f64,
    pub ry: f64,
}

/// Children are positioned relative to the group's left/top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupProps {
    pub objects: Vec<SceneObject>,
}

/// Source-pixel region an image was cropped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    pub src: Option<String>,
    pub crop: Option<CropRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    pub text_align: String,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Text".into(),
            font_size: 32.0,
            font_family: "Arial".into(),
            font_weight: "normal".into(),
            text_align: "left".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyPoint {
    pub x: f64,
    pub y: f64,
}

/// Vertices relative to the polygon's left/top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolygonProps {
    pub points: Vec<PolyPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementProps {
    pub html: String,
    pub css: String,
    pub js: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoProps {
    pub src: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IframeProps {
    pub src: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InPortType {
    #[default]
    Single,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutPortType {
    /// One output port holding at most one link.
    #[default]
    Single,
    /// Named output ports fixed by `out_ports`.
    Static,
    /// Output ports whose count follows `out_ports` as it changes at runtime.
    Dynamic,
    /// One output port fanning out to any number of links.
    Broadcast,
    None,
}

/// A workflow node: a rectangle with an input port on top and output
/// ports along the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeShape {
    pub node_clazz: String,
    pub description: Option<String>,
    pub configuration: serde_json::Value,
    pub icon: Option<String>,
    pub in_port_type: InPortType,
    pub out_port_type: OutPortType,
    /// Output port names for `static`/`dynamic` nodes.
    pub out_ports: Vec<String>,
    /// Number of links currently fanned out of a `broadcast` node.
    pub broadcast_count: usize,
    /// Set when the node's configuration failed validation.
    pub error: bool,
    pub error_message: Option<String>,
}

impl Default for NodeShape {
    fn default() -> Self {
        Self {
            node_clazz: String::new(),
            description: None,
            configuration: serde_json::Value::Object(Default::default()),
            icon: None,
            in_port_type: InPortType::Single,
            out_port_type: OutPortType::Single,
            out_ports: Vec::new(),
            broadcast_count: 0,
            error: false,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Curved,
    Straight,
    Orthogonal,
}

/// A directed edge from one node's output port to another node's input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkShape {
    pub from_node: ObjectId,
    pub from_port: ObjectId,
    pub to_node: ObjectId,
    pub to_port: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port_index: Option<usize>,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub x1: f64,
    #[serde(default)]
    pub y1: f64,
    #[serde(default)]
    pub x2: f64,
    #[serde(default)]
    pub y2: f64,
}

/// Kind-specific payload, tagged by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Workarea(WorkareaProps),
    Shape(ShapeProps),
    Group(GroupProps),
    Image(ImageProps),
    Text(TextProps),
    Polygon(PolygonProps),
    Node(NodeShape),
    Link(LinkShape),
    Element(ElementProps),
    Video(VideoProps),
    Iframe(IframeProps),
}

/// Dataless discriminant of `ObjectKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Workarea,
    Shape,
    Group,
    Image,
    Text,
    Polygon,
    Node,
    Link,
    Element,
    Video,
    Iframe,
}

impl KindTag {
    pub fn as_str(self) -> &'static str {
        match self {
            KindTag::Workarea => "workarea",
            KindTag::Shape => "shape",
            KindTag::Group => "group",
            KindTag::Image => "image",
            KindTag::Text => "text",
            KindTag::Polygon => "polygon",
            KindTag::Node => "node",
            KindTag::Link => "link",
            KindTag::Element => "element",
            KindTag::Video => "video",
            KindTag::Iframe => "iframe",
        }
    }
}

/// Coarse grouping used by handlers to pick a code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperType {
    Shape,
    Image,
    Element,
    Node,
    Link,
    Drawing,
}

impl ObjectKind {
    pub fn tag(&self) -> KindTag {
        match self {
            ObjectKind::Workarea(_) => KindTag::Workarea,
            ObjectKind::Shape(_) => KindTag::Shape,
            ObjectKind::Group(_) => KindTag::Group,
            ObjectKind::Image(_) => KindTag::Image,
            ObjectKind::Text(_) => KindTag::Text,
            ObjectKind::Polygon(_) => KindTag::Polygon,
            ObjectKind::Node(_) => KindTag::Node,
            ObjectKind::Link(_) => KindTag::Link,
            ObjectKind::Element(_) => KindTag::Element,
            ObjectKind::Video(_) => KindTag::Video,
            ObjectKind::Iframe(_) => KindTag::Iframe,
        }
    }
}

// ─── Scene objects ───────────────────────────────────────────────────────

/// A renderable entity on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub appearance: Appearance,
    #[serde(flatten)]
    pub flags: Flags,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl SceneObject {
    pub fn new(id: ObjectId, kind: ObjectKind, geometry: Geometry) -> Self {
        Self {
            id,
            name: None,
            kind,
            geometry,
            appearance: Appearance::default(),
            flags: Flags::default(),
            metadata: Metadata::default(),
        }
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn super_type(&self) -> SuperType {
        match &self.kind {
            ObjectKind::Image(_) | ObjectKind::Workarea(_) => SuperType::Image,
            ObjectKind::Element(_) | ObjectKind::Video(_) | ObjectKind::Iframe(_) => {
                SuperType::Element
            }
            ObjectKind::Node(_) => SuperType::Node,
            ObjectKind::Link(_) => SuperType::Link,
            ObjectKind::Polygon(_) => SuperType::Drawing,
            ObjectKind::Shape(_) | ObjectKind::Group(_) | ObjectKind::Text(_) => SuperType::Shape,
        }
    }

    pub fn is_workarea(&self) -> bool {
        matches!(self.kind, ObjectKind::Workarea(_))
    }

    /// Element kinds mirrored by a parallel DOM node.
    pub fn is_dom_mirrored(&self) -> bool {
        self.super_type() == SuperType::Element
    }

    pub fn as_node(&self) -> Option<&NodeShape> {
        match &self.kind {
            ObjectKind::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut NodeShape> {
        match &mut self.kind {
            ObjectKind::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&LinkShape> {
        match &self.kind {
            ObjectKind::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_link_mut(&mut self) -> Option<&mut LinkShape> {
        match &mut self.kind {
            ObjectKind::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageProps> {
        match &self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageProps> {
        match &mut self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}
