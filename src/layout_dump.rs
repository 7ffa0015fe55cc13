use crate::error::{ConvertError, Result};
use crate::ir::LineageGraph;
use crate::layout::DiagramLayout;
use crate::render::write_output;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: usize,
    pub name: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub description: Option<DescriptionDump>,
}

#[derive(Debug, Serialize)]
pub struct DescriptionDump {
    pub side: String,
    pub fallback: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub exit: [f32; 2],
    pub entry: [f32; 2],
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub exit: [f32; 2],
    pub entry: [f32; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &DiagramLayout, graph: &LineageGraph) -> Self {
        let nodes: Vec<NodeDump> = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id,
                name: node.name.clone(),
                kind: graph
                    .node(&node.name)
                    .map(|n| n.kind.as_str())
                    .unwrap_or_default()
                    .to_string(),
                x: node.rect.x,
                y: node.rect.y,
                width: node.rect.width,
                height: node.rect.height,
                description: node.description.as_ref().map(|d| DescriptionDump {
                    side: d.side.as_str().to_string(),
                    fallback: d.fallback,
                    x: d.rect.x,
                    y: d.rect.y,
                    width: d.rect.width,
                    height: d.rect.height,
                    exit: [d.anchors.exit.x, d.anchors.exit.y],
                    entry: [d.anchors.entry.x, d.anchors.entry.y],
                }),
            })
            .collect();

        // Edges are resolved by node id; ids need not be dense.
        let edges = layout
            .edges
            .iter()
            .filter_map(|edge| {
                let from = layout.node_by_id(edge.from)?;
                let to = layout.node_by_id(edge.to)?;
                Some(EdgeDump {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    kind: edge.kind.as_str().to_string(),
                    exit: [edge.anchors.exit.x, edge.anchors.exit.y],
                    entry: [edge.anchors.entry.x, edge.anchors.entry.y],
                })
            })
            .collect();

        LayoutDump {
            width: layout.canvas.width,
            height: layout.canvas.height,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &DiagramLayout, graph: &LineageGraph) -> Result<()> {
    let dump = LayoutDump::from_layout(layout, graph);
    let json = serde_json::to_string_pretty(&dump).map_err(|err| ConvertError::Write {
        path: path.to_path_buf(),
        source: err.into(),
    })?;
    write_output(&json, path)
}
