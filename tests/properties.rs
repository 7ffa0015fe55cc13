//! Property tests for the geometry, mapping, placement and routing stages.

use lineage_drawio::config::{CanvasConfig, LayoutConfig, PlacementConfig, RoutingConfig};
use lineage_drawio::layout::geometry::{closest_anchor_pair, point_segment_distance, rects_overlap};
use lineage_drawio::layout::label_placement::place_description;
use lineage_drawio::layout::routing::edge_anchors;
use lineage_drawio::layout::{CoordinateMapper, Point, Rect, Size};
use lineage_drawio::{EdgeKind, LayeredLayout, LayoutProvider, LineageGraph, NodeAttributes, NodeKind};
use lineage_drawio::text_metrics::{description_box_size, node_box_size};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn point() -> impl Strategy<Value = Point> {
    (-1.0e5f32..1.0e5, -1.0e5f32..1.0e5).prop_map(|(x, y)| Point::new(x, y))
}

/// Random DAG: edges only point from a lower to a higher node index.
fn dag() -> impl Strategy<Value = LineageGraph> {
    (1usize..30)
        .prop_flat_map(|nodes| (Just(nodes), prop::collection::vec((0..nodes, 0..nodes), 0..60)))
        .prop_map(|(nodes, pairs)| {
            let mut graph = LineageGraph::new();
            for idx in 0..nodes {
                graph.add_node(format!("model_{idx}"), NodeKind::Unit, NodeAttributes::default());
            }
            for (a, b) in pairs {
                if a != b {
                    let (from, to) = (a.min(b), a.max(b));
                    graph.add_edge(&format!("model_{from}"), &format!("model_{to}"), EdgeKind::DerivedFrom);
                }
            }
            graph
        })
}

fn rect() -> impl Strategy<Value = Rect> {
    (-5000f32..5000.0, -5000f32..5000.0, 1f32..400.0, 1f32..200.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

proptest! {
    #[test]
    fn mapped_boxes_stay_inside_margins(
        positions in prop::collection::vec(point(), 1..40),
        name_len in 0usize..60,
    ) {
        let config = CanvasConfig::default();
        let size = node_box_size(&"n".repeat(name_len));
        let mapper = CoordinateMapper::fit(positions.iter().copied(), size, &config).unwrap();
        for position in &positions {
            let rect = mapper.map_rect(*position, size);
            prop_assert!(rect.x >= config.margin);
            prop_assert!(rect.y >= config.margin);
            prop_assert!(rect.right() <= config.width - config.margin + 1e-2);
            prop_assert!(rect.bottom() <= config.height - config.margin + 1e-2);
        }
    }

    #[test]
    fn degenerate_segment_distance_is_point_distance(p in point(), a in point()) {
        let d = point_segment_distance(p, a, a);
        prop_assert!((d - p.distance(a)).abs() <= 1e-3 * d.max(1.0));
    }

    #[test]
    fn segment_distance_never_exceeds_endpoint_distance(p in point(), a in point(), b in point()) {
        let d = point_segment_distance(p, a, b);
        let nearest_end = p.distance(a).min(p.distance(b));
        prop_assert!(d <= nearest_end + 1e-2 * nearest_end.max(1.0));
    }

    #[test]
    fn closest_anchor_distance_is_symmetric(a in rect(), b in rect()) {
        let (_, ab) = closest_anchor_pair(&a, &b);
        let (_, ba) = closest_anchor_pair(&b, &a);
        prop_assert!((ab - ba).abs() <= 1e-3 * ab.max(1.0));
    }

    #[test]
    fn edge_anchors_stay_on_the_unit_square(
        from in point(),
        to in point(),
        jitter in 0f32..2.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pair = edge_anchors(from, to, &RoutingConfig { jitter }, &mut rng);
        for value in [pair.exit.x, pair.exit.y, pair.entry.x, pair.entry.y] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn placed_labels_avoid_other_nodes(
        obstacles in prop::collection::vec(rect(), 0..12),
        description_len in 1usize..200,
    ) {
        let config = PlacementConfig::default();
        let node = Rect::new(0.0, 0.0, 150.0, 40.0);
        let description = "d".repeat(description_len);
        let placed = place_description(&description, &node, &obstacles, &[], &config);
        prop_assert!(placed.rect.width > 0.0 && placed.rect.height > 0.0);
        if !placed.fallback {
            for obstacle in &obstacles {
                prop_assert!(!rects_overlap(&placed.rect, obstacle, config.buffer));
            }
        }
        let placed_size = Size::new(placed.rect.width, placed.rect.height);
        prop_assert_eq!(placed_size, description_box_size(&description));
    }

    #[test]
    fn layered_layout_places_every_node_apart(graph in dag()) {
        let layout = LayeredLayout.compute_layout(&graph, &LayoutConfig::default());
        prop_assert_eq!(layout.positions.len(), graph.node_count());

        let boxes: Vec<Rect> = graph
            .nodes()
            .map(|node| {
                let center = layout.position(&node.name).unwrap();
                let size = layout.size(&node.name).unwrap();
                Rect::new(center.x - size.width / 2.0, center.y - size.height / 2.0, size.width, size.height)
            })
            .collect();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                let apart = a.right() <= b.x + 1e-2
                    || b.right() <= a.x + 1e-2
                    || a.bottom() <= b.y + 1e-2
                    || b.bottom() <= a.y + 1e-2;
                prop_assert!(apart, "{:?} overlaps {:?}", a, b);
            }
        }
        for edge in graph.edges() {
            let from = layout.position(&edge.from).unwrap();
            let to = layout.position(&edge.to).unwrap();
            prop_assert!(from.x < to.x);
        }
    }
}
