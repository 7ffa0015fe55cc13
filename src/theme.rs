use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub font_size: f32,
    pub source_fill: String,
    pub staging_fill: String,
    pub intermediate_fill: String,
    pub model_fill: String,
    pub node_stroke: String,
    pub untested_stroke: String,
    pub untested_stroke_width: f32,
    pub description_fill: String,
    pub description_stroke: String,
    pub description_opacity: u8,
    pub derived_edge_color: String,
    pub sourced_edge_color: String,
    pub table_tag_background: String,
    pub package_tag_background: String,
    pub materialization_tag_background: String,
    pub legend_background: String,
}

impl Theme {
    /// Palette of the draw.io lineage diagrams: yellow sources, grey staging
    /// models, blue intermediate models and green marts.
    pub fn classic() -> Self {
        Self {
            font_size: 10.0,
            source_fill: "#ffcc00".to_string(),
            staging_fill: "#afbab3".to_string(),
            intermediate_fill: "#99ccff".to_string(),
            model_fill: "#c2f0c2".to_string(),
            node_stroke: "#000000".to_string(),
            untested_stroke: "#ff0000".to_string(),
            untested_stroke_width: 2.0,
            description_fill: "#D3D3D3".to_string(),
            description_stroke: "#FFFF00".to_string(),
            description_opacity: 50,
            derived_edge_color: "#000000".to_string(),
            sourced_edge_color: "#0000FF".to_string(),
            table_tag_background: "#E6E6FA".to_string(),
            package_tag_background: "#EEC231".to_string(),
            materialization_tag_background: "#D3D3D3".to_string(),
            legend_background: "#f5f5f5".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
