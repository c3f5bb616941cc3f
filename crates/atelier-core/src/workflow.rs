//! Workflow document: the node/link view of a diagram.
//!
//! Unlike the scene document this keeps only what a workflow engine needs:
//! nodes with their configuration, links as port references, and the
//! viewport so the diagram reopens where it was left.

use crate::error::{EditorError, EditorResult};
use crate::geometry::Geometry;
use crate::id::ObjectId;
use crate::model::{LinkShape, NodeShape, ObjectKind, SceneObject};
use crate::port::DEFAULT_IN_PORT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePlacement {
    pub left: f64,
    pub top: f64,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub node_clazz: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub properties: NodePlacement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkPlacement {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowLink {
    pub from_node: ObjectId,
    pub from_port: ObjectId,
    pub to_node: ObjectId,
    #[serde(default = "default_to_port")]
    pub to_port: ObjectId,
    #[serde(default)]
    pub properties: LinkPlacement,
}

fn default_to_port() -> ObjectId {
    ObjectId::intern(DEFAULT_IN_PORT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub nodes: Vec<WorkflowNode>,
    pub links: Vec<WorkflowLink>,
    /// `[a, b, c, d, e, f]` affine coefficients.
    #[serde(default = "identity")]
    pub viewport_transform: [f64; 6],
}

fn identity() -> [f64; 6] {
    [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
}

impl WorkflowDocument {
    /// Collect nodes (in `order`) and links from scene objects.
    ///
    /// Fails on the first node flagged with a configuration error.
    pub fn from_objects<'a>(
        objects: impl IntoIterator<Item = &'a SceneObject>,
        order: &[ObjectId],
        viewport_transform: [f64; 6],
    ) -> EditorResult<Self> {
        let mut nodes = Vec::new();
        let mut links = Vec::new();
        for obj in objects {
            match &obj.kind {
                ObjectKind::Node(node) => {
                    if node.error {
                        return Err(EditorError::Validation {
                            node: obj.id,
                            message: node
                                .error_message
                                .clone()
                                .unwrap_or_else(|| "invalid configuration".into()),
                        });
                    }
                    nodes.push(WorkflowNode {
                        id: obj.id,
                        name: obj.name.clone(),
                        description: node.description.clone(),
                        node_clazz: node.node_clazz.clone(),
                        configuration: node.configuration.clone(),
                        properties: NodePlacement {
                            left: obj.geometry.left,
                            top: obj.geometry.top,
                            icon: node.icon.clone(),
                        },
                    });
                }
                ObjectKind::Link(link) => links.push(WorkflowLink {
                    from_node: link.from_node,
                    from_port: link.from_port,
                    to_node: link.to_node,
                    to_port: link.to_port,
                    properties: LinkPlacement {
                        left: obj.geometry.left,
                        top: obj.geometry.top,
                    },
                }),
                _ => {}
            }
        }
        let rank = |id: &ObjectId| order.iter().position(|o| o == id).unwrap_or(usize::MAX);
        nodes.sort_by_key(|n| rank(&n.id));
        Ok(Self {
            nodes,
            links,
            viewport_transform,
        })
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Scene objects for every node, then every link.
    ///
    /// Port layout fields (`inPortType`, `outPorts`, ...) are taken from
    /// `catalog` by `nodeClazz` when the host knows the class.
    pub fn into_objects(
        self,
        catalog: impl Fn(&str) -> Option<NodeShape>,
    ) -> (Vec<SceneObject>, Vec<SceneObject>) {
        let nodes = self
            .nodes
            .into_iter()
            .map(|n| {
                let mut shape = catalog(&n.node_clazz).unwrap_or_default();
                shape.node_clazz = n.node_clazz;
                shape.description = n.description;
                shape.configuration = n.configuration;
                shape.icon = n.properties.icon;
                let mut obj = SceneObject::new(
                    n.id,
                    ObjectKind::Node(shape),
                    Geometry::new(n.properties.left, n.properties.top, 200.0, 40.0),
                );
                obj.name = n.name;
                obj
            })
            .collect();
        let links = self
            .links
            .into_iter()
            .map(|l| {
                SceneObject::new(
                    ObjectId::fresh("link"),
                    ObjectKind::Link(LinkShape {
                        from_node: l.from_node,
                        from_port: l.from_port,
                        to_node: l.to_node,
                        to_port: l.to_port,
                        from_port_index: None,
                        line_style: Default::default(),
                        x1: 0.0,
                        y1: 0.0,
                        x2: 0.0,
                        y2: 0.0,
                    }),
                    Geometry::new(l.properties.left, l.properties.top, 0.0, 0.0),
                )
            })
            .collect();
        (nodes, links)
    }
}
