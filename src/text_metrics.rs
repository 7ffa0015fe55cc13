//! Character-count based size estimates.
//!
//! The diagram editor measures text itself, so boxes only need to be large
//! enough for collision tests and a readable first render. Every size in the
//! crate comes from the functions below so the layout, placement and
//! serialization stages agree on a node's footprint.

use crate::layout::Size;
use quick_xml::escape::escape;

pub const NODE_CHAR_WIDTH: f32 = 10.0;
pub const NODE_MIN_WIDTH: f32 = 150.0;
pub const NODE_MAX_WIDTH: f32 = 350.0;
pub const NODE_HEIGHT: f32 = 40.0;

pub const LABEL_MIN_WIDTH: f32 = 150.0;
pub const LABEL_MAX_WIDTH: f32 = 250.0;
pub const LABEL_WIDTH_CHARS_PER_STEP: usize = 20;
pub const LABEL_WIDTH_STEP: f32 = 10.0;
pub const LABEL_MIN_HEIGHT: f32 = 50.0;
pub const LABEL_MAX_HEIGHT: f32 = 120.0;
pub const LABEL_HEIGHT_CHARS_PER_STEP: usize = 25;
pub const LABEL_HEIGHT_STEP: f32 = 5.0;
pub const LABEL_LINE_HEIGHT: f32 = 12.0;

pub const TAG_CHAR_WIDTH: f32 = 6.0;
pub const TAG_MIN_WIDTH: f32 = 50.0;
pub const TAG_MAX_WIDTH: f32 = 150.0;
pub const TAG_HEIGHT: f32 = 15.0;

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Length of `text` as stored in the document, with markup characters
/// expanded to their entities (`'` counts as `&apos;`).
pub fn escaped_len(text: &str) -> usize {
    char_len(&escape(text))
}

/// Box of a node, derived from its display name only.
pub fn node_box_size(name: &str) -> Size {
    let width = (char_len(name) as f32 * NODE_CHAR_WIDTH).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH);
    Size::new(width, NODE_HEIGHT)
}

/// Box of a description label. Long texts grow the box in steps; explicit
/// line breaks add a line each. Length is measured on the escaped text.
pub fn description_box_size(description: &str) -> Size {
    let len = escaped_len(description);
    let newlines = description.matches('\n').count();
    let width = (LABEL_MIN_WIDTH + (len / LABEL_WIDTH_CHARS_PER_STEP) as f32 * LABEL_WIDTH_STEP)
        .clamp(LABEL_MIN_WIDTH, LABEL_MAX_WIDTH);
    let height = (LABEL_MIN_HEIGHT
        + (len / LABEL_HEIGHT_CHARS_PER_STEP) as f32 * LABEL_HEIGHT_STEP
        + newlines as f32 * LABEL_LINE_HEIGHT)
        .clamp(LABEL_MIN_HEIGHT, LABEL_MAX_HEIGHT);
    Size::new(width, height)
}

/// Width of the small text tags (table name, package, materialization).
pub fn tag_width(text: &str) -> f32 {
    (char_len(text) as f32 * TAG_CHAR_WIDTH).clamp(TAG_MIN_WIDTH, TAG_MAX_WIDTH)
}
