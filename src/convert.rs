use crate::config::Config;
use crate::error::Result;
use crate::ir::LineageGraph;
use crate::layout::{DiagramLayout, LayoutProvider, compute_diagram_layout};
use crate::manifest::{Manifest, build_graph};
use crate::render::{render_drawio, write_output};
use rand::Rng;
use std::path::Path;

/// Everything produced by one conversion.
#[derive(Debug, Clone)]
pub struct Diagram {
    pub graph: LineageGraph,
    pub layout: DiagramLayout,
    pub document: String,
}

/// Manifest to draw.io document, entirely in memory.
pub fn convert<R: Rng + ?Sized>(
    manifest: &Manifest,
    provider: &dyn LayoutProvider,
    config: &Config,
    rng: &mut R,
) -> Result<Diagram> {
    let graph = build_graph(manifest);
    let layout = compute_diagram_layout(&graph, provider, config, rng)?;
    let document = render_drawio(&layout, &graph, &config.theme)?;
    tracing::info!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        descriptions = layout.description_count(),
        "rendered diagram"
    );
    Ok(Diagram {
        graph,
        layout,
        document,
    })
}

/// Reads `input`, converts it and writes the document to `output`. Nothing is
/// written unless every earlier stage succeeded.
pub fn convert_file<R: Rng + ?Sized>(
    input: &Path,
    output: &Path,
    provider: &dyn LayoutProvider,
    config: &Config,
    rng: &mut R,
) -> Result<Diagram> {
    let manifest = Manifest::from_path(input)?;
    let diagram = convert(&manifest, provider, config, rng)?;
    write_output(&diagram.document, output)?;
    tracing::info!(path = %output.display(), "saved diagram");
    Ok(diagram)
}
