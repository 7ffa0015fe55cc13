use crate::ir::EdgeKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas units, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point on the perimeter addressed by fractional coordinates.
    pub fn point_at(&self, anchor: Anchor) -> Point {
        Point::new(self.x + self.width * anchor.x, self.y + self.height * anchor.y)
    }
}

/// Fractional (0.0..=1.0) position on a rectangle where a connector ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const TOP: Anchor = Anchor::new(0.5, 0.0);
    pub const BOTTOM: Anchor = Anchor::new(0.5, 1.0);
    pub const LEFT: Anchor = Anchor::new(0.0, 0.5);
    pub const RIGHT: Anchor = Anchor::new(1.0, 0.5);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where a connector leaves its source element and enters its target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AnchorPair {
    pub exit: Anchor,
    pub entry: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionLayout {
    pub rect: Rect,
    pub side: Side,
    /// Exit on the label box, entry on the node box.
    pub anchors: AnchorPair,
    /// Set when no candidate slot was free and the label went below the node.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    /// Numeric id assigned in layout-iteration order.
    pub id: usize,
    pub name: String,
    pub rect: Rect,
    pub description: Option<DescriptionLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    pub anchors: AnchorPair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    pub canvas: Size,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
}

impl DiagramLayout {
    pub fn node(&self, name: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn node_by_id(&self, id: usize) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn description_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.description.is_some())
            .count()
    }
}
