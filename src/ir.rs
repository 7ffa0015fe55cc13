use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Unit,
    ExternalSource,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::ExternalSource => "external-source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    DerivedFrom,
    SourcedFrom,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DerivedFrom => "derived-from",
            Self::SourcedFrom => "sourced-from",
        }
    }
}

/// Descriptive metadata carried by a node. Opaque to the layout stages
/// except for `description`, which drives label placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeAttributes {
    pub origin_path: String,
    pub description: String,
    pub package_name: String,
    pub materialization: Option<String>,
    pub manifest_id: String,
    pub table_name: Option<String>,
    pub tested: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub name: String,
    pub kind: NodeKind,
    pub attributes: NodeAttributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// Directed lineage graph. Nodes and edges keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    pub project_name: Option<String>,
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(project_name: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            ..Self::default()
        }
    }

    /// Inserts a node unless one with the same name exists. Returns whether
    /// the node was inserted; the first write wins.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        attributes: NodeAttributes,
    ) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.nodes.len());
        self.nodes.push(GraphNode {
            name,
            kind,
            attributes,
        });
        true
    }

    /// Appends an edge when both endpoints are known. Edges that reference
    /// nodes outside the graph are dropped and `false` is returned.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        if !self.index.contains_key(from) || !self.index.contains_key(to) {
            return false;
        }
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
        true
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn edges_touching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |edge| edge.touches(name))
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.index.get(name).map(|&idx| &self.nodes[idx])
    }

    pub fn attributes(&self, name: &str) -> Option<&NodeAttributes> {
        self.node(name).map(|node| &node.attributes)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
