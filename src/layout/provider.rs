// Layout providers: the built-in layered layout and caller-supplied positions.

use super::layered::layered_positions;
use super::{Point, Size};
use crate::config::LayoutConfig;
use crate::ir::LineageGraph;
use crate::text_metrics::node_box_size;
use std::collections::HashMap;

/// Raw output of a layout provider: node positions in layout space and the
/// box sizes the provider laid out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLayout {
    pub positions: HashMap<String, Point>,
    pub sizes: HashMap<String, Size>,
}

impl RawLayout {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<Point> {
        self.positions.get(name).copied()
    }

    pub fn size(&self, name: &str) -> Option<Size> {
        self.sizes.get(name).copied()
    }

    fn insert(&mut self, name: &str, position: Point) {
        self.positions.insert(name.to_string(), position);
        self.sizes.insert(name.to_string(), node_box_size(name));
    }
}

/// Computes an abstract layout for a graph. Implementations never fail
/// loudly: an unusable result is reported as an empty [`RawLayout`], which
/// the pipeline turns into [`crate::ConvertError::LayoutUnavailable`].
pub trait LayoutProvider {
    fn compute_layout(&self, graph: &LineageGraph, config: &LayoutConfig) -> RawLayout;
}

/// Left-to-right layered layout: sources in the first column, each model
/// one column after its deepest upstream dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout;

impl LayoutProvider for LayeredLayout {
    fn compute_layout(&self, graph: &LineageGraph, config: &LayoutConfig) -> RawLayout {
        let positions = layered_positions(graph, config);
        let mut layout = RawLayout::default();
        for (node, position) in graph.nodes().zip(positions) {
            if !position.x.is_finite() || !position.y.is_finite() {
                tracing::warn!(node = %node.name, "layered layout produced a non-finite position");
                continue;
            }
            layout.insert(&node.name, position);
        }
        if layout.is_empty() && !graph.is_empty() {
            tracing::warn!(nodes = graph.node_count(), "layered layout returned no positions");
        }
        layout
    }
}

/// Positions supplied by the caller, e.g. from a previously saved layout.
/// Nodes without an entry are left out of the diagram.
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    positions: Vec<(String, Point)>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, x: f32, y: f32) -> Self {
        self.positions.push((name.into(), Point::new(x, y)));
        self
    }
}

impl FromIterator<(String, Point)> for FixedLayout {
    fn from_iter<I: IntoIterator<Item = (String, Point)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl LayoutProvider for FixedLayout {
    fn compute_layout(&self, graph: &LineageGraph, _config: &LayoutConfig) -> RawLayout {
        let mut layout = RawLayout::default();
        for (name, position) in &self.positions {
            if graph.contains(name) {
                layout.insert(name, *position);
            }
        }
        layout
    }
}
