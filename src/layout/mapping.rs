// Layout space -> canvas space.

use super::{Point, Rect, Size};
use crate::config::CanvasConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisMap {
    min: f32,
    scale: f32,
    margin: f32,
    far: f32,
}

impl AxisMap {
    /// `largest_box` is the biggest node extent along this axis. The scale is
    /// shrunk when the boxes would otherwise cross the far margin.
    fn fit(
        min: f32,
        max: f32,
        canvas_dim: f32,
        margin: f32,
        largest_box: f32,
        config: &CanvasConfig,
    ) -> Self {
        let usable = (canvas_dim - 2.0 * margin).max(0.0);
        let far = canvas_dim - margin;
        let extent = max - min;
        if extent <= 0.0 {
            return Self {
                min,
                scale: 1.0,
                margin,
                far,
            };
        }
        let mut scale = usable / extent * config.fit_scale * config.placement_scale;
        let room = (usable - largest_box).max(0.0);
        if extent * scale > room {
            scale = room / extent;
        }
        Self {
            min,
            scale,
            margin,
            far,
        }
    }

    fn map(&self, value: f32) -> f32 {
        self.margin + (value - self.min) * self.scale
    }

    /// Start of a box of length `len`, kept inside the margins.
    fn place(&self, value: f32, len: f32) -> f32 {
        self.map(value).min(self.far - len).max(self.margin)
    }
}

/// Deterministic rescaling of raw layout positions into the canvas, with
/// independent scale factors per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    x: AxisMap,
    y: AxisMap,
}

impl CoordinateMapper {
    /// Builds a mapper over the given raw positions. Returns `None` when there
    /// is nothing to map.
    pub fn fit<I>(positions: I, largest_box: Size, config: &CanvasConfig) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for point in iter {
            min_x = min_x.min(point.x);
            max_x = max_x.max(point.x);
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }
        Some(Self {
            x: AxisMap::fit(min_x, max_x, config.width, config.margin, largest_box.width, config),
            y: AxisMap::fit(min_y, max_y, config.height, config.margin, largest_box.height, config),
        })
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.x.scale, self.y.scale)
    }

    pub fn map_point(&self, raw: Point) -> Point {
        Point::new(self.x.map(raw.x), self.y.map(raw.y))
    }

    /// Canvas rectangle of a node. The mapped raw position becomes the top-left
    /// corner, clamped so the whole box stays inside the margins.
    pub fn map_rect(&self, raw: Point, size: Size) -> Rect {
        Rect::new(
            self.x.place(raw.x, size.width),
            self.y.place(raw.y, size.height),
            size.width,
            size.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasConfig {
        CanvasConfig::default()
    }

    #[test]
    fn empty_positions_have_no_mapper() {
        assert!(CoordinateMapper::fit(Vec::new(), Size::new(150.0, 40.0), &canvas()).is_none());
    }

    #[test]
    fn zero_extent_falls_back_to_unit_scale() {
        let points = vec![Point::new(42.0, -7.0), Point::new(42.0, -7.0)];
        let mapper = CoordinateMapper::fit(points, Size::new(150.0, 40.0), &canvas()).unwrap();
        assert_eq!(mapper.scale(), (1.0, 1.0));
        let mapped = mapper.map_point(Point::new(42.0, -7.0));
        assert_eq!(mapped, Point::new(500.0, 500.0));
    }

    #[test]
    fn min_corner_lands_on_margin() {
        let points = vec![Point::new(-300.0, 10.0), Point::new(900.0, 610.0)];
        let mapper = CoordinateMapper::fit(points, Size::new(150.0, 40.0), &canvas()).unwrap();
        assert_eq!(mapper.map_point(Point::new(-300.0, 10.0)), Point::new(500.0, 500.0));
    }

    #[test]
    fn applies_breathing_room_when_boxes_fit() {
        // usable 11000 x 9000 over an extent of 1000: naive scales 11 and 9
        let points = vec![Point::new(0.0, 0.0), Point::new(1000.0, 1000.0)];
        let config = CanvasConfig {
            placement_scale: 0.5,
            ..canvas()
        };
        let mapper = CoordinateMapper::fit(points, Size::new(150.0, 40.0), &config).unwrap();
        let (sx, sy) = mapper.scale();
        assert!((sx - 11.0 * 1.2 * 0.5).abs() < 1e-4);
        assert!((sy - 9.0 * 1.2 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn shrinks_when_boxes_would_cross_far_margin() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1000.0, 1000.0)];
        let largest = Size::new(350.0, 40.0);
        let mapper = CoordinateMapper::fit(points, largest, &canvas()).unwrap();
        let far = mapper.map_rect(Point::new(1000.0, 1000.0), largest);
        assert!(far.right() <= 12000.0 - 500.0 + 1e-3);
        assert!(far.bottom() <= 10000.0 - 500.0 + 1e-3);
    }

    #[test]
    fn default_factors_fill_up_to_the_far_margin() {
        // 1.2 * 0.85 = 1.02 overshoots the usable span, so the default
        // factors always end in the shrink branch: the farthest box ends
        // exactly on the far margin.
        let points = vec![Point::new(0.0, 0.0), Point::new(1000.0, 1000.0)];
        let largest = Size::new(150.0, 40.0);
        let mapper = CoordinateMapper::fit(points, largest, &canvas()).unwrap();
        let (sx, sy) = mapper.scale();
        assert!((sx - (11000.0 - 150.0) / 1000.0).abs() < 1e-4);
        assert!((sy - (9000.0 - 40.0) / 1000.0).abs() < 1e-4);

        let far = mapper.map_rect(Point::new(1000.0, 1000.0), largest);
        assert!((far.right() - 11500.0).abs() < 1e-2);
        assert!((far.bottom() - 9500.0).abs() < 1e-2);
    }
}
