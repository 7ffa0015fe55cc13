// Left-to-right layered layout.
//
// Ranks come from the longest path over a topological order, so every edge
// points to a later column. Edges spanning several ranks are split through
// zero-size dummy slots; ranks are then reordered by barycenter sweeps and
// the cross axis is assigned by pulling each slot toward the mean of its
// placed neighbors. Every phase runs a fixed number of passes.

use super::{Point, Size};
use crate::config::LayoutConfig;
use crate::ir::LineageGraph;
use crate::text_metrics::node_box_size;
use petgraph::Direction;
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

const ORDERING_SWEEPS: usize = 4;
const PLACEMENT_SWEEPS: usize = 2;

/// Layer assignment of every real node, in graph order.
pub(super) fn longest_path_ranks(dag: &DiGraph<usize, ()>) -> Vec<usize> {
    let order: Vec<NodeIndex> = match toposort(dag, None) {
        Ok(order) => order,
        Err(cycle) => {
            tracing::debug!(node = cycle.node_id().index(), "dependency cycle, ranking by components");
            // Components come out in reverse topological order; edges inside
            // a component that point backwards are ignored below.
            kosaraju_scc(dag).into_iter().rev().flatten().collect()
        }
    };
    let mut position = vec![0usize; dag.node_count()];
    for (idx, node) in order.iter().enumerate() {
        position[node.index()] = idx;
    }

    let mut ranks = vec![0usize; dag.node_count()];
    for &node in &order {
        let rank = ranks[node.index()];
        for next in dag.neighbors_directed(node, Direction::Outgoing) {
            if position[next.index()] > position[node.index()] {
                ranks[next.index()] = ranks[next.index()].max(rank + 1);
            }
        }
    }
    ranks
}

/// Slots of the layered graph: the real nodes first, dummies after them.
struct Layers {
    ranks: Vec<Vec<usize>>,
    rank_of: Vec<usize>,
    sizes: Vec<Size>,
    upstream: Vec<Vec<usize>>,
    downstream: Vec<Vec<usize>>,
}

impl Layers {
    fn build(ranks: &[usize], sizes: Vec<Size>, edges: &[(usize, usize)]) -> Self {
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        let mut layers = Self {
            ranks: vec![Vec::new(); max_rank + 1],
            rank_of: ranks.to_vec(),
            upstream: vec![Vec::new(); sizes.len()],
            downstream: vec![Vec::new(); sizes.len()],
            sizes,
        };
        for (slot, &rank) in ranks.iter().enumerate() {
            layers.ranks[rank].push(slot);
        }

        for &(from, to) in edges {
            let (from_rank, to_rank) = (ranks[from], ranks[to]);
            if to_rank <= from_rank {
                continue;
            }
            let mut prev = from;
            for rank in from_rank + 1..to_rank {
                let dummy = layers.add_slot(rank, Size::new(0.0, 0.0));
                layers.link(prev, dummy);
                prev = dummy;
            }
            layers.link(prev, to);
        }
        layers
    }

    fn add_slot(&mut self, rank: usize, size: Size) -> usize {
        let slot = self.sizes.len();
        self.sizes.push(size);
        self.rank_of.push(rank);
        self.upstream.push(Vec::new());
        self.downstream.push(Vec::new());
        self.ranks[rank].push(slot);
        slot
    }

    fn link(&mut self, from: usize, to: usize) {
        self.downstream[from].push(to);
        self.upstream[to].push(from);
    }

    /// Barycenter crossing reduction, alternating downward and upward sweeps.
    fn reorder(&mut self) {
        let mut position = vec![0usize; self.sizes.len()];
        for layer in &self.ranks {
            for (idx, &slot) in layer.iter().enumerate() {
                position[slot] = idx;
            }
        }
        if self.ranks.len() <= 1 {
            return;
        }
        for _ in 0..ORDERING_SWEEPS {
            for rank in 1..self.ranks.len() {
                sort_by_barycenter(&mut self.ranks[rank], &self.upstream, &mut position);
            }
            for rank in (0..self.ranks.len() - 1).rev() {
                sort_by_barycenter(&mut self.ranks[rank], &self.downstream, &mut position);
            }
        }
    }

    /// Column center of every rank along the main axis.
    fn columns(&self, rank_spacing: f32) -> Vec<f32> {
        let mut cursor = 0.0;
        self.ranks
            .iter()
            .map(|layer| {
                let width = layer
                    .iter()
                    .map(|&slot| self.sizes[slot].width)
                    .fold(0.0f32, f32::max);
                let center = cursor + width / 2.0;
                cursor += width + rank_spacing;
                center
            })
            .collect()
    }

    /// Cross-axis center of every slot.
    fn rows(&self, node_spacing: f32) -> Vec<f32> {
        let mut cross: Vec<Option<f32>> = vec![None; self.sizes.len()];
        for _ in 0..PLACEMENT_SWEEPS {
            for layer in &self.ranks {
                self.place_layer(layer, &self.upstream, node_spacing, &mut cross);
            }
            for layer in self.ranks.iter().rev() {
                self.place_layer(layer, &self.downstream, node_spacing, &mut cross);
            }
        }
        cross.into_iter().map(|center| center.unwrap_or(0.0)).collect()
    }

    /// Pulls each slot toward the mean of its placed neighbors, keeping the
    /// rank order and `node_spacing` between boxes, then recenters the rank
    /// on the mean of the wanted positions.
    fn place_layer(
        &self,
        layer: &[usize],
        neighbors: &[Vec<usize>],
        node_spacing: f32,
        cross: &mut [Option<f32>],
    ) {
        if layer.is_empty() {
            return;
        }
        let wanted: Vec<f32> = layer
            .iter()
            .map(|&slot| {
                let placed: Vec<f32> = neighbors[slot].iter().filter_map(|&n| cross[n]).collect();
                if placed.is_empty() {
                    cross[slot].unwrap_or(0.0)
                } else {
                    placed.iter().sum::<f32>() / placed.len() as f32
                }
            })
            .collect();

        let mut assigned = Vec::with_capacity(layer.len());
        let mut prev: Option<(f32, f32)> = None;
        for (&slot, &want) in layer.iter().zip(&wanted) {
            let half = self.sizes[slot].height / 2.0;
            let center = match prev {
                Some((prev_center, prev_half)) => want.max(prev_center + prev_half + half + node_spacing),
                None => want,
            };
            assigned.push(center);
            prev = Some((center, half));
        }

        let count = layer.len() as f32;
        let shift = wanted.iter().sum::<f32>() / count - assigned.iter().sum::<f32>() / count;
        for (&slot, center) in layer.iter().zip(assigned) {
            cross[slot] = Some(center + shift);
        }
    }
}

fn sort_by_barycenter(layer: &mut Vec<usize>, neighbors: &[Vec<usize>], position: &mut [usize]) {
    if layer.len() > 1 {
        let mut keyed: Vec<(f32, usize, usize)> = layer
            .iter()
            .map(|&slot| {
                let current = position[slot];
                let around = &neighbors[slot];
                let key = if around.is_empty() {
                    current as f32
                } else {
                    around.iter().map(|&n| position[n] as f32).sum::<f32>() / around.len() as f32
                };
                (key, current, slot)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        *layer = keyed.into_iter().map(|(_, _, slot)| slot).collect();
    }
    for (idx, &slot) in layer.iter().enumerate() {
        position[slot] = idx;
    }
}

/// Node centers in graph order. The topmost box edge sits on `margin`, the
/// first column starts at `margin`.
pub(super) fn layered_positions(graph: &LineageGraph, config: &LayoutConfig) -> Vec<Point> {
    let names: Vec<&str> = graph.nodes().map(|node| node.name.as_str()).collect();
    if names.is_empty() {
        return Vec::new();
    }
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(idx, name)| (*name, idx)).collect();

    let mut dag: DiGraph<usize, ()> = DiGraph::with_capacity(names.len(), graph.edge_count());
    for idx in 0..names.len() {
        dag.add_node(idx);
    }
    let mut edges = Vec::new();
    for edge in graph.edges() {
        let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        else {
            continue;
        };
        // parallel edges and self loops do not change the layering
        if from == to || dag.contains_edge(NodeIndex::new(from), NodeIndex::new(to)) {
            continue;
        }
        dag.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        edges.push((from, to));
    }

    let ranks = longest_path_ranks(&dag);
    let sizes = names.iter().map(|name| node_box_size(name)).collect();
    let mut layers = Layers::build(&ranks, sizes, &edges);
    layers.reorder();

    let columns = layers.columns(config.rank_spacing);
    let rows = layers.rows(config.node_spacing);
    let top = (0..names.len())
        .map(|slot| rows[slot] - layers.sizes[slot].height / 2.0)
        .fold(f32::INFINITY, f32::min);

    (0..names.len())
        .map(|slot| {
            Point::new(
                config.margin + columns[layers.rank_of[slot]],
                config.margin + rows[slot] - top,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeKind, NodeAttributes, NodeKind};
    use crate::layout::Rect;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> LineageGraph {
        let mut graph = LineageGraph::new();
        for name in nodes {
            graph.add_node(*name, NodeKind::Unit, NodeAttributes::default());
        }
        for (from, to) in edges {
            graph.add_edge(from, to, EdgeKind::DerivedFrom);
        }
        graph
    }

    fn boxes(graph: &LineageGraph, positions: &[Point]) -> Vec<(String, Rect)> {
        graph
            .nodes()
            .zip(positions)
            .map(|(node, center)| {
                let size = node_box_size(&node.name);
                let rect = Rect::new(
                    center.x - size.width / 2.0,
                    center.y - size.height / 2.0,
                    size.width,
                    size.height,
                );
                (node.name.clone(), rect)
            })
            .collect()
    }

    fn position(graph: &LineageGraph, positions: &[Point], name: &str) -> Point {
        let idx = graph.nodes().position(|node| node.name == name).unwrap();
        positions[idx]
    }

    #[test]
    fn chain_advances_one_column_per_rank() {
        let g = graph(&["raw", "stg", "mart"], &[("raw", "stg"), ("stg", "mart")]);
        let positions = layered_positions(&g, &LayoutConfig::default());
        let (a, b, c) = (positions[0], positions[1], positions[2]);
        assert!(a.x < b.x && b.x < c.x, "{a:?} {b:?} {c:?}");
        assert_eq!(a.y, b.y);
        assert_eq!(b.y, c.y);
        assert_eq!(b.x - a.x, 150.0 + LayoutConfig::default().rank_spacing);
    }

    #[test]
    fn ranks_follow_the_longest_path() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d"), ("a", "d")],
        );
        let mut dag: DiGraph<usize, ()> = DiGraph::new();
        for idx in 0..4 {
            dag.add_node(idx);
        }
        for (from, to) in [(0, 1), (1, 2), (0, 2), (2, 3), (0, 3)] {
            dag.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        assert_eq!(longest_path_ranks(&dag), vec![0, 1, 2, 3]);

        let positions = layered_positions(&g, &LayoutConfig::default());
        assert!(positions.windows(2).all(|pair| pair[0].x < pair[1].x));
    }

    #[test]
    fn siblings_share_a_column_without_overlapping() {
        let g = graph(
            &["src", "left", "right", "sink"],
            &[("src", "left"), ("src", "right"), ("left", "sink"), ("right", "sink")],
        );
        let config = LayoutConfig::default();
        let positions = layered_positions(&g, &config);
        let left = position(&g, &positions, "left");
        let right = position(&g, &positions, "right");
        assert_eq!(left.x, right.x);
        assert!((left.y - right.y).abs() >= 40.0 + config.node_spacing - 1e-3);
        // the sink sits between its two parents
        let sink = position(&g, &positions, "sink");
        assert!((sink.y - (left.y + right.y) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn barycenter_ordering_removes_a_crossing() {
        // Insertion order puts `c` above `d`, but `d` hangs off `a` (top) and
        // `c` off `b` (bottom).
        let g = graph(&["a", "b", "c", "d"], &[("a", "d"), ("b", "c")]);
        let positions = layered_positions(&g, &LayoutConfig::default());
        let a = position(&g, &positions, "a");
        let b = position(&g, &positions, "b");
        let c = position(&g, &positions, "c");
        let d = position(&g, &positions, "d");
        assert!(a.y < b.y);
        assert!(d.y < c.y, "d={d:?} c={c:?}");
    }

    #[test]
    fn cycles_still_get_positions() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let positions = layered_positions(&g, &LayoutConfig::default());
        assert_eq!(positions.len(), 3);
        assert!(positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn dbt_shaped_graph_is_laid_out_without_overlaps() {
        let g = graph(
            &[
                "raw_customers",
                "raw_orders",
                "raw_payments",
                "stg_customers",
                "stg_orders",
                "stg_payments",
                "int_order_payments",
                "customers",
                "orders",
                "calendar",
            ],
            &[
                ("raw_customers", "stg_customers"),
                ("raw_orders", "stg_orders"),
                ("raw_payments", "stg_payments"),
                ("stg_orders", "int_order_payments"),
                ("stg_payments", "int_order_payments"),
                ("stg_customers", "customers"),
                ("int_order_payments", "customers"),
                ("int_order_payments", "orders"),
                ("calendar", "orders"),
            ],
        );
        let config = LayoutConfig::default();
        let positions = layered_positions(&g, &config);
        assert_eq!(positions.len(), 10);

        let placed = boxes(&g, &positions);
        for (i, (a_name, a)) in placed.iter().enumerate() {
            assert!(a.x >= config.margin - 1e-3 && a.y >= config.margin - 1e-3, "{a_name}: {a:?}");
            for (b_name, b) in &placed[i + 1..] {
                let apart = a.right() <= b.x || b.right() <= a.x || a.bottom() <= b.y || b.bottom() <= a.y;
                assert!(apart, "{a_name} overlaps {b_name}");
            }
        }
        for edge in g.edges() {
            let from = position(&g, &positions, &edge.from);
            let to = position(&g, &positions, &edge.to);
            assert!(from.x < to.x, "{} -> {}", edge.from, edge.to);
        }
    }

    #[test]
    fn empty_graph_has_no_positions() {
        assert!(layered_positions(&LineageGraph::new(), &LayoutConfig::default()).is_empty());
    }
}
