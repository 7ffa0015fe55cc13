// Pure geometry shared by label placement and edge routing.

use super::{Anchor, AnchorPair, Point, Rect};

/// Mid-edge anchors in the order used for tie-breaking.
const MID_EDGE_ANCHORS: [Anchor; 4] = [Anchor::TOP, Anchor::BOTTOM, Anchor::LEFT, Anchor::RIGHT];

pub fn point_segment_distance(point: Point, a: Point, b: Point) -> f32 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 {
        return point.distance(a);
    }
    let t = (((point.x - a.x) * vx + (point.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    point.distance(Point::new(a.x + vx * t, a.y + vy * t))
}

/// Separating-axis test: the rectangles overlap unless a gap wider than
/// `buffer` separates them on either axis.
pub fn rects_overlap(a: &Rect, b: &Rect, buffer: f32) -> bool {
    !(a.right() + buffer < b.x
        || a.x > b.right() + buffer
        || a.bottom() + buffer < b.y
        || a.y > b.bottom() + buffer)
}

/// Closest pair of mid-edge anchors between `from` and `to`. The first pair
/// found wins ties, iterating top, bottom, left, right on both rectangles.
pub fn closest_anchor_pair(from: &Rect, to: &Rect) -> (AnchorPair, f32) {
    let mut best = AnchorPair {
        exit: Anchor::TOP,
        entry: Anchor::TOP,
    };
    let mut best_distance = f32::INFINITY;
    for exit in MID_EDGE_ANCHORS {
        let from_point = from.point_at(exit);
        for entry in MID_EDGE_ANCHORS {
            let distance = from_point.distance(to.point_at(entry));
            if distance < best_distance {
                best_distance = distance;
                best = AnchorPair { exit, entry };
            }
        }
    }
    (best, best_distance)
}
