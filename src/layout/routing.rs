use rand::Rng;

use super::{Anchor, AnchorPair, Point};
use crate::config::RoutingConfig;

// ── Edge side selection ──────────────────────────────────────────────
/// Mid-edge position around which attachment anchors are jittered.
const MID_ANCHOR: f32 = 0.5;

fn jittered<R: Rng + ?Sized>(rng: &mut R, jitter: f32) -> f32 {
    if jitter.is_nan() || jitter <= 0.0 {
        return MID_ANCHOR;
    }
    // Anything wider than the whole side only adds clamping.
    let jitter = jitter.min(1.0);
    (MID_ANCHOR + rng.gen_range(-jitter..=jitter)).clamp(0.0, 1.0)
}

/// Attachment anchors for an edge between two node centers.
///
/// The dominant axis of the center delta picks the sides: left/right when
/// the nodes are further apart horizontally, top/bottom otherwise, always on
/// the sides facing each other. The cross-axis coordinate of each end is
/// jittered independently so parallel edges do not share an anchor.
pub fn edge_anchors<R: Rng + ?Sized>(
    from: Point,
    to: Point,
    config: &RoutingConfig,
    rng: &mut R,
) -> AnchorPair {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > dy.abs() {
        let (exit_x, entry_x) = if dx > 0.0 { (1.0, 0.0) } else { (0.0, 1.0) };
        AnchorPair {
            exit: Anchor::new(exit_x, jittered(rng, config.jitter)),
            entry: Anchor::new(entry_x, jittered(rng, config.jitter)),
        }
    } else {
        let (exit_y, entry_y) = if dy > 0.0 { (1.0, 0.0) } else { (0.0, 1.0) };
        AnchorPair {
            exit: Anchor::new(jittered(rng, config.jitter), exit_y),
            entry: Anchor::new(jittered(rng, config.jitter), entry_y),
        }
    }
}
