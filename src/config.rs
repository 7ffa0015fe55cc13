use crate::error::{ConvertError, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CANVAS_WIDTH: f32 = 12000.0;
pub const DEFAULT_CANVAS_HEIGHT: f32 = 10000.0;
pub const DEFAULT_CANVAS_MARGIN: f32 = 500.0;
/// Breathing room applied on top of the naive fit scale.
pub const DEFAULT_FIT_SCALE: f32 = 1.2;
/// Under-fill applied when placing node boxes, leaving room for labels.
pub const DEFAULT_PLACEMENT_SCALE: f32 = 0.85;

/// Layered layout separations, in layout units (graphviz inches * 72).
pub const DEFAULT_NODE_SPACING: f32 = 288.0;
pub const DEFAULT_RANK_SPACING: f32 = 360.0;
pub const DEFAULT_LAYOUT_MARGIN: f32 = 8.0;

pub const DEFAULT_LABEL_BUFFER: f32 = 40.0;
pub const DEFAULT_EDGE_HUG_DISTANCE: f32 = 80.0;
pub const DEFAULT_EDGE_HUG_WEIGHT: f32 = 2.0;
pub const DEFAULT_LONG_DESCRIPTION: usize = 50;
pub const DEFAULT_FALLBACK_OFFSET_FACTOR: f32 = 1.5;

pub const DEFAULT_ANCHOR_JITTER: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub fit_scale: f32,
    pub placement_scale: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            margin: DEFAULT_CANVAS_MARGIN,
            fit_scale: DEFAULT_FIT_SCALE,
            placement_scale: DEFAULT_PLACEMENT_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: DEFAULT_NODE_SPACING,
            rank_spacing: DEFAULT_RANK_SPACING,
            margin: DEFAULT_LAYOUT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    /// Gap kept between a label and every node box.
    pub buffer: f32,
    /// Edge distance below which the edge term is weighted.
    pub edge_hug_distance: f32,
    pub edge_hug_weight: f32,
    /// Descriptions longer than this prefer vertical slots.
    pub long_description: usize,
    pub fallback_offset_factor: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_LABEL_BUFFER,
            edge_hug_distance: DEFAULT_EDGE_HUG_DISTANCE,
            edge_hug_weight: DEFAULT_EDGE_HUG_WEIGHT,
            long_description: DEFAULT_LONG_DESCRIPTION,
            fallback_offset_factor: DEFAULT_FALLBACK_OFFSET_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Half-width of the uniform jitter around the mid-edge anchor.
    pub jitter: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_ANCHOR_JITTER,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub canvas: CanvasConfig,
    pub layout: LayoutConfig,
    pub placement: PlacementConfig,
    pub routing: RoutingConfig,
    pub theme: Theme,
}

fn finite_non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ConvertError::ConfigInvalid {
        field,
        value,
        expected: "finite and non-negative",
    })
}

fn finite_positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        return Ok(());
    }
    Err(ConvertError::ConfigInvalid {
        field,
        value,
        expected: "finite and positive",
    })
}

impl Config {
    pub fn from_json5(contents: &str) -> Result<Self> {
        let config: Self = json5::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the layout stages cannot work with: NaN, infinities,
    /// negative distances and canvases whose margins leave no drawing area.
    pub fn validate(&self) -> Result<()> {
        let canvas = &self.canvas;
        finite_positive("canvas.width", canvas.width)?;
        finite_positive("canvas.height", canvas.height)?;
        finite_non_negative("canvas.margin", canvas.margin)?;
        let narrowest = canvas.width.min(canvas.height);
        if canvas.margin * 2.0 >= narrowest {
            return Err(ConvertError::ConfigInvalid {
                field: "canvas.margin",
                value: canvas.margin,
                expected: "less than half the canvas width and height",
            });
        }
        finite_positive("canvas.fitScale", canvas.fit_scale)?;
        finite_positive("canvas.placementScale", canvas.placement_scale)?;

        finite_non_negative("layout.nodeSpacing", self.layout.node_spacing)?;
        finite_non_negative("layout.rankSpacing", self.layout.rank_spacing)?;
        finite_non_negative("layout.margin", self.layout.margin)?;

        let placement = &self.placement;
        finite_non_negative("placement.buffer", placement.buffer)?;
        finite_non_negative("placement.edgeHugDistance", placement.edge_hug_distance)?;
        finite_non_negative("placement.edgeHugWeight", placement.edge_hug_weight)?;
        finite_non_negative("placement.fallbackOffsetFactor", placement.fallback_offset_factor)?;

        finite_non_negative("routing.jitter", self.routing.jitter)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| ConvertError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_json5(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.canvas.width, 12000.0);
        assert_eq!(config.canvas.height, 10000.0);
        assert_eq!(config.placement.buffer, 40.0);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = Config::from_json5(
            r##"{
                // tighter canvas for small projects
                canvas: { width: 4000, margin: 100 },
                routing: { jitter: 0 },
                theme: { sourceFill: "#ff9900" },
            }"##,
        )
        .unwrap();
        assert_eq!(config.canvas.width, 4000.0);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.canvas.margin, 100.0);
        assert_eq!(config.canvas.fit_scale, DEFAULT_FIT_SCALE);
        assert_eq!(config.routing.jitter, 0.0);
        assert_eq!(config.theme.source_fill, "#ff9900");
        assert_eq!(config.theme.model_fill, Theme::classic().model_fill);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let err = Config::from_json5("{ canvas: ").unwrap_err();
        assert!(matches!(err, ConvertError::ConfigParse(_)));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn non_finite_and_negative_values_are_rejected() {
        let cases = [
            ("{ routing: { jitter: Infinity } }", "routing.jitter"),
            ("{ routing: { jitter: NaN } }", "routing.jitter"),
            ("{ routing: { jitter: -0.1 } }", "routing.jitter"),
            ("{ placement: { buffer: -5 } }", "placement.buffer"),
            ("{ canvas: { width: 0 } }", "canvas.width"),
            ("{ canvas: { height: -Infinity } }", "canvas.height"),
            ("{ canvas: { fitScale: NaN } }", "canvas.fitScale"),
            ("{ canvas: { placementScale: 0 } }", "canvas.placementScale"),
            ("{ canvas: { width: 800, margin: 400 } }", "canvas.margin"),
        ];
        for (input, expected) in cases {
            let err = Config::from_json5(input).unwrap_err();
            match err {
                ConvertError::ConfigInvalid { field, .. } => assert_eq!(field, expected, "{input}"),
                other => panic!("{input}: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn zero_jitter_and_buffer_are_allowed() {
        let config = Config::from_json5("{ routing: { jitter: 0 }, placement: { buffer: 0 } }").unwrap();
        assert_eq!(config.routing.jitter, 0.0);
        assert_eq!(config.placement.buffer, 0.0);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.json5"))).unwrap_err();
        assert!(matches!(err, ConvertError::ConfigRead { .. }));
    }
}
