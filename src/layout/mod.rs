pub mod geometry;
pub mod label_placement;
mod layered;
pub mod mapping;
pub mod provider;
pub mod routing;
pub(crate) mod types;
pub use mapping::CoordinateMapper;
pub use provider::{FixedLayout, LayeredLayout, LayoutProvider, RawLayout};
pub use types::*;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::ir::LineageGraph;
use crate::text_metrics::node_box_size;
use label_placement::place_description;
use rand::Rng;
use routing::edge_anchors;
use std::collections::HashMap;

/// Runs the provider once and turns its output into canvas geometry: node
/// boxes, description labels and edge anchors.
///
/// Nodes the provider did not position are left out, together with every
/// edge touching them. An empty provider result is fatal.
pub fn compute_diagram_layout<R: Rng + ?Sized>(
    graph: &LineageGraph,
    provider: &dyn LayoutProvider,
    config: &Config,
    rng: &mut R,
) -> Result<DiagramLayout> {
    let raw = provider.compute_layout(graph, &config.layout);
    if raw.is_empty() {
        return Err(ConvertError::LayoutUnavailable {
            nodes: graph.node_count(),
        });
    }

    let placed: Vec<(&str, Point, Size)> = graph
        .nodes()
        .filter_map(|node| {
            let position = raw.position(&node.name)?;
            let size = raw.size(&node.name).unwrap_or_else(|| node_box_size(&node.name));
            Some((node.name.as_str(), position, size))
        })
        .collect();

    let largest = placed.iter().fold(Size::default(), |acc, (_, _, size)| {
        Size::new(acc.width.max(size.width), acc.height.max(size.height))
    });
    let Some(mapper) = CoordinateMapper::fit(
        placed.iter().map(|(_, position, _)| *position),
        largest,
        &config.canvas,
    ) else {
        return Err(ConvertError::LayoutUnavailable {
            nodes: graph.node_count(),
        });
    };
    let (scale_x, scale_y) = mapper.scale();
    tracing::debug!(scale_x, scale_y, nodes = placed.len(), "mapped layout onto canvas");

    let mut nodes: Vec<NodeLayout> = placed
        .iter()
        .enumerate()
        .map(|(id, (name, position, size))| NodeLayout {
            id,
            name: (*name).to_string(),
            rect: mapper.map_rect(*position, *size),
            description: None,
        })
        .collect();
    let ids: HashMap<&str, usize> = placed
        .iter()
        .enumerate()
        .map(|(id, (name, _, _))| (*name, id))
        .collect();

    let rects: Vec<Rect> = nodes.iter().map(|node| node.rect).collect();
    for node in &mut nodes {
        let Some(attributes) = graph.attributes(&node.name) else {
            continue;
        };
        if attributes.description.is_empty() {
            continue;
        }
        let obstacles: Vec<Rect> = rects
            .iter()
            .enumerate()
            .filter(|(id, _)| *id != node.id)
            .map(|(_, rect)| *rect)
            .collect();
        let segments: Vec<(Point, Point)> = graph
            .edges_touching(&node.name)
            .filter_map(|edge| {
                let from = ids.get(edge.from.as_str())?;
                let to = ids.get(edge.to.as_str())?;
                Some((rects[*from].center(), rects[*to].center()))
            })
            .collect();
        let description = place_description(
            &attributes.description,
            &node.rect,
            &obstacles,
            &segments,
            &config.placement,
        );
        if description.fallback {
            tracing::debug!(node = %node.name, "no free slot for description, placed below node");
        }
        node.description = Some(description);
    }

    let mut edges = Vec::with_capacity(graph.edge_count());
    for edge in graph.edges() {
        let (Some(&from), Some(&to)) = (ids.get(edge.from.as_str()), ids.get(edge.to.as_str()))
        else {
            continue;
        };
        let anchors = edge_anchors(
            rects[from].center(),
            rects[to].center(),
            &config.routing,
            rng,
        );
        edges.push(EdgeLayout {
            from,
            to,
            kind: edge.kind,
            anchors,
        });
    }

    Ok(DiagramLayout {
        canvas: Size::new(config.canvas.width, config.canvas.height),
        nodes,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeKind, NodeAttributes, NodeKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn graph_with(descriptions: &[(&str, &str)]) -> LineageGraph {
        let mut graph = LineageGraph::new();
        for (name, description) in descriptions {
            graph.add_node(
                *name,
                NodeKind::Unit,
                NodeAttributes {
                    description: description.to_string(),
                    ..NodeAttributes::default()
                },
            );
        }
        graph
    }

    #[test]
    fn empty_provider_result_is_fatal() {
        let graph = graph_with(&[("a", "")]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = compute_diagram_layout(&graph, &FixedLayout::new(), &Config::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ConvertError::LayoutUnavailable { nodes: 1 }));
    }

    #[test]
    fn ids_follow_graph_order_of_positioned_nodes() {
        let graph = graph_with(&[("a", ""), ("skipped", ""), ("c", "")]);
        let provider = FixedLayout::new().with("c", 500.0, 0.0).with("a", 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_diagram_layout(&graph, &provider, &Config::default(), &mut rng).unwrap();
        let names: Vec<_> = layout.nodes.iter().map(|n| (n.id, n.name.as_str())).collect();
        assert_eq!(names, vec![(0, "a"), (1, "c")]);
    }

    #[test]
    fn boxes_stay_inside_the_margins() {
        let graph = graph_with(&[
            ("a", ""),
            ("a_model_with_a_remarkably_long_name_for_width", ""),
            ("c", ""),
        ]);
        let provider = FixedLayout::new()
            .with("a", -4000.0, 20.0)
            .with("a_model_with_a_remarkably_long_name_for_width", 9000.0, 7000.0)
            .with("c", 100.0, -350.0);
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_diagram_layout(&graph, &provider, &config, &mut rng).unwrap();
        for node in &layout.nodes {
            assert!(node.rect.x >= 500.0 && node.rect.right() <= 11500.0 + 1e-2, "{node:?}");
            assert!(node.rect.y >= 500.0 && node.rect.bottom() <= 9500.0 + 1e-2, "{node:?}");
        }
    }

    #[test]
    fn edges_to_unplaced_nodes_are_skipped() {
        let mut graph = graph_with(&[("a", ""), ("b", ""), ("c", "")]);
        graph.add_edge("a", "b", EdgeKind::DerivedFrom);
        graph.add_edge("b", "c", EdgeKind::DerivedFrom);
        let provider = FixedLayout::new().with("a", 0.0, 0.0).with("b", 400.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_diagram_layout(&graph, &provider, &Config::default(), &mut rng).unwrap();
        assert_eq!(layout.edges.len(), 1);
        assert_eq!((layout.edges[0].from, layout.edges[0].to), (0, 1));
    }

    #[test]
    fn only_described_nodes_get_labels() {
        let graph = graph_with(&[("a", "orders placed per day"), ("b", "")]);
        let provider = FixedLayout::new().with("a", 0.0, 0.0).with("b", 1000.0, 1000.0);
        let mut rng = StdRng::seed_from_u64(0);
        let layout = compute_diagram_layout(&graph, &provider, &Config::default(), &mut rng).unwrap();
        assert_eq!(layout.description_count(), 1);
        assert!(layout.node("a").unwrap().description.is_some());
    }
}
