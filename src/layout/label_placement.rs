// Placement of node description labels.
//
// Each label gets one of six fixed slots around its node. Slots that collide
// with another node box are rejected; the rest are scored by how far they sit
// from other nodes and from the edges touching the owning node.

use super::geometry::{closest_anchor_pair, point_segment_distance, rects_overlap};
use super::{DescriptionLayout, Point, Rect, Side, Size};
use crate::config::PlacementConfig;
use crate::text_metrics::{description_box_size, escaped_len};

/// One slot under evaluation. Only lives while a label is being placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    pub side: Side,
    pub origin: Point,
    pub size: Size,
}

impl PlacementCandidate {
    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.origin, self.size)
    }
}

/// Slot order for a description whose escaped text is `description_len`
/// characters long. Long texts
/// try the vertical slots first, short ones the horizontal slots. Later
/// entries repeat earlier sides on purpose; a repeat can never beat the first
/// occurrence because ties keep the earlier candidate.
pub fn candidate_sides(description_len: usize, config: &PlacementConfig) -> [Side; 6] {
    let long = description_len > config.long_description;
    [
        if long { Side::Top } else { Side::Right },
        if long { Side::Bottom } else { Side::Left },
        Side::Right,
        Side::Left,
        Side::Top,
        Side::Bottom,
    ]
}

fn candidate_origin(node: &Rect, label: Size, side: Side, buffer: f32) -> Point {
    match side {
        Side::Top => Point::new(node.x, node.y - label.height - buffer),
        Side::Bottom => Point::new(node.x, node.bottom() + buffer),
        Side::Right => Point::new(node.right() + buffer, node.y),
        Side::Left => Point::new(node.x - label.width - buffer, node.y),
    }
}

pub fn placement_candidates(
    node: &Rect,
    label: Size,
    description_len: usize,
    config: &PlacementConfig,
) -> Vec<PlacementCandidate> {
    candidate_sides(description_len, config)
        .into_iter()
        .map(|side| PlacementCandidate {
            side,
            origin: candidate_origin(node, label, side, config.buffer),
            size: label,
        })
        .collect()
}

/// Score of a label rectangle, or `None` when it collides with a node box.
/// Higher is better. Distances to edges closer than the hug distance are
/// weighted up before being compared with the node distance.
pub fn score_candidate(
    rect: &Rect,
    obstacles: &[Rect],
    edge_segments: &[(Point, Point)],
    config: &PlacementConfig,
) -> Option<f32> {
    let center = rect.center();
    let mut min_node_distance = f32::INFINITY;
    for obstacle in obstacles {
        if rects_overlap(rect, obstacle, config.buffer) {
            return None;
        }
        min_node_distance = min_node_distance.min(center.distance(obstacle.center()));
    }

    let min_edge_distance = edge_segments
        .iter()
        .map(|&(a, b)| point_segment_distance(center, a, b))
        .fold(f32::INFINITY, f32::min);
    let edge_term = if min_edge_distance < config.edge_hug_distance {
        min_edge_distance * config.edge_hug_weight
    } else {
        min_edge_distance
    };
    Some(min_node_distance.min(edge_term))
}

/// Places the description label of the node occupying `node`.
///
/// `obstacles` are the boxes of every other node and `edge_segments` the
/// center-to-center segments of the edges touching this node. The result
/// always carries a usable geometry: when every slot collides the label is
/// put directly below the node.
pub fn place_description(
    description: &str,
    node: &Rect,
    obstacles: &[Rect],
    edge_segments: &[(Point, Point)],
    config: &PlacementConfig,
) -> DescriptionLayout {
    let size = description_box_size(description);
    let candidates = placement_candidates(node, size, escaped_len(description), config);

    let mut best: Option<(f32, PlacementCandidate)> = None;
    for candidate in candidates {
        let Some(score) = score_candidate(&candidate.rect(), obstacles, edge_segments, config)
        else {
            continue;
        };
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, candidate));
        }
    }

    let (rect, side, fallback) = match best {
        Some((_, candidate)) => (candidate.rect(), candidate.side, false),
        None => {
            let origin = Point::new(
                node.x,
                node.bottom() + config.buffer * config.fallback_offset_factor,
            );
            (Rect::from_origin(origin, size), Side::Bottom, true)
        }
    };
    let (anchors, _) = closest_anchor_pair(&rect, node);
    DescriptionLayout {
        rect,
        side,
        anchors,
        fallback,
    }
}
