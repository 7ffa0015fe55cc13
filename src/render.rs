use crate::error::{ConvertError, Result};
use crate::ir::{EdgeKind, GraphNode, LineageGraph, NodeKind};
use crate::layout::{AnchorPair, DescriptionLayout, DiagramLayout, NodeLayout, Rect};
use crate::manifest::is_package_model;
use crate::text_metrics::{TAG_HEIGHT, tag_width};
use crate::theme::Theme;
use once_cell::sync::Lazy;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use regex::Regex;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;

static STAGING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|/)stg_").unwrap());
static INTERMEDIATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|/)int_").unwrap());

const FIRST_EDGE_ID: usize = 1000;
const PACKAGE_TAG_LIFT: f32 = 20.0;
const MATERIALIZATION_TAG_GAP: f32 = 5.0;

const LEGEND_ORIGIN: (f32, f32) = (50.0, 50.0);
const LEGEND_SIZE: (f32, f32) = (200.0, 360.0);
const LEGEND_ENTRY_SIZE: (f32, f32) = (80.0, 30.0);
const LEGEND_ENTRY_TOP: f32 = 40.0;
const LEGEND_ENTRY_SPACING: f32 = 40.0;

enum Geometry {
    Bounds(Rect),
    Relative,
}

/// Thin layer over the quick-xml writer for the two cell shapes draw.io
/// uses: vertices with bounds and edges with relative geometry.
struct CellWriter {
    writer: Writer<Vec<u8>>,
}

impl CellWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn cell(&mut self, attributes: &[(&str, &str)], geometry: Geometry) -> Result<()> {
        self.open("mxCell", attributes)?;
        match geometry {
            Geometry::Bounds(rect) => {
                let (x, y) = (num(rect.x), num(rect.y));
                let (width, height) = (num(rect.width), num(rect.height));
                self.empty(
                    "mxGeometry",
                    &[
                        ("x", x.as_str()),
                        ("y", y.as_str()),
                        ("width", width.as_str()),
                        ("height", height.as_str()),
                        ("as", "geometry"),
                    ],
                )?;
            }
            Geometry::Relative => {
                self.empty("mxGeometry", &[("relative", "1"), ("as", "geometry")])?;
            }
        }
        self.close("mxCell")
    }

    fn vertex(&mut self, id: &str, value: &str, style: &str, parent: &str, rect: Rect) -> Result<()> {
        self.cell(
            &[
                ("id", id),
                ("value", value),
                ("style", style),
                ("vertex", "1"),
                ("parent", parent),
            ],
            Geometry::Bounds(rect),
        )
    }

    fn connector(&mut self, id: &str, source: &str, target: &str, style: &str) -> Result<()> {
        self.cell(
            &[
                ("id", id),
                ("edge", "1"),
                ("source", source),
                ("target", target),
                ("parent", "1"),
                ("style", style),
            ],
            Geometry::Relative,
        )
    }

    fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }
}

fn num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn anchor_style(anchors: &AnchorPair) -> String {
    format!(
        "exitX={:.2};exitY={:.2};entryX={:.2};entryY={:.2};",
        anchors.exit.x, anchors.exit.y, anchors.entry.x, anchors.entry.y
    )
}

/// HTML cell text: escaped, with line breaks kept visible.
fn html_text(text: &str) -> String {
    escape(text).replace('\n', "<br>")
}

fn tag_value(background: &str, text: &str) -> String {
    format!(
        "<span style=\"background-color:{background};padding:2px;\">{}</span>",
        escape(text)
    )
}

fn tag_style(align: &str, vertical: &str, theme: &Theme) -> String {
    format!(
        "text;fontSize={};html=1;align={align};verticalAlign={vertical};strokeColor=none;",
        theme.font_size
    )
}

fn node_fill<'a>(node: &GraphNode, theme: &'a Theme) -> &'a str {
    let path = node.attributes.origin_path.as_str();
    if node.kind == NodeKind::ExternalSource {
        &theme.source_fill
    } else if STAGING_RE.is_match(&node.name) || STAGING_RE.is_match(path) {
        &theme.staging_fill
    } else if INTERMEDIATE_RE.is_match(&node.name) || INTERMEDIATE_RE.is_match(path) {
        &theme.intermediate_fill
    } else {
        &theme.model_fill
    }
}

fn node_style(node: &GraphNode, package: bool, theme: &Theme) -> String {
    let shape = match node.kind {
        NodeKind::ExternalSource => "step",
        NodeKind::Unit if package => "rectangle",
        NodeKind::Unit => "rectangle;rounded=1",
    };
    let border = if node.attributes.tested || node.kind == NodeKind::ExternalSource {
        String::new()
    } else {
        format!(
            "strokeColor={};strokeWidth={};",
            theme.untested_stroke, theme.untested_stroke_width
        )
    };
    format!(
        "shape={shape};fillColor={};strokeColor={};{border}fontSize={};whiteSpace=wrap;html=1;align=center;verticalAlign=middle;",
        node_fill(node, theme),
        theme.node_stroke,
        theme.font_size
    )
}

fn write_legend(out: &mut CellWriter, theme: &Theme) -> Result<()> {
    let group = "legend_group";
    let (width, height) = LEGEND_SIZE;
    out.cell(
        &[("id", group), ("vertex", "1"), ("parent", "1")],
        Geometry::Bounds(Rect::new(LEGEND_ORIGIN.0, LEGEND_ORIGIN.1, width, height)),
    )?;
    let frame_style = format!(
        "shape=rectangle;fillColor={};opacity=70;strokeColor={};strokeWidth=1;fontSize={};whiteSpace=wrap;html=1;",
        theme.legend_background, theme.node_stroke, theme.font_size
    );
    out.vertex(
        "legend_frame",
        "",
        &frame_style,
        group,
        Rect::new(0.0, 0.0, width, height),
    )?;
    out.vertex(
        "legend_title",
        "<b>Legend:</b>",
        "text;fontSize=12;html=1;align=left;",
        group,
        Rect::new(10.0, 10.0, 100.0, 20.0),
    )?;

    let fs = theme.font_size;
    let entry = |fill: &str, extra: &str, shape: &str| {
        format!("shape={shape};fillColor={fill};{extra}fontSize={fs};whiteSpace=wrap;html=1;align=center;")
    };
    let untested = format!(
        "strokeColor={};strokeWidth={};",
        theme.untested_stroke, theme.untested_stroke_width
    );
    let description = format!(
        "opacity={};strokeColor={};strokeWidth=1.5;",
        theme.description_opacity, theme.description_stroke
    );
    let entries = [
        ("legend_source", "Source", entry(&theme.source_fill, "", "step")),
        ("legend_int", "int_ model", entry(&theme.intermediate_fill, "", "rectangle;rounded=1")),
        ("legend_stg", "stg_ model", entry(&theme.staging_fill, "", "rectangle;rounded=1")),
        ("legend_green", "Model", entry(&theme.model_fill, "", "rectangle;rounded=1")),
        ("legend_no_tests", "Model without tests", entry(&theme.model_fill, &untested, "rectangle;rounded=1")),
        ("legend_desc", "Model description", entry(&theme.description_fill, &description, "rectangle")),
        ("legend_package", "Model from dbt_packages", entry(&theme.model_fill, "", "rectangle")),
        (
            "legend_table_name",
            "(schema.name / db.dataset.table)",
            tag_style("left", "top", theme),
        ),
    ];
    let (entry_width, entry_height) = LEGEND_ENTRY_SIZE;
    for (idx, (id, value, style)) in entries.iter().enumerate() {
        let y = LEGEND_ENTRY_TOP + idx as f32 * LEGEND_ENTRY_SPACING;
        out.vertex(id, value, style, group, Rect::new(10.0, y, entry_width, entry_height))?;
    }
    Ok(())
}

fn write_description(
    out: &mut CellWriter,
    node_id: &str,
    idx: usize,
    text: &str,
    description: &DescriptionLayout,
    theme: &Theme,
) -> Result<()> {
    let text_id = format!("text{idx}");
    let style = format!(
        "shape=rectangle;fillColor={};opacity={};strokeColor={};strokeWidth=1.5;fontSize={};whiteSpace=wrap;html=1;align=left;verticalAlign=top;",
        theme.description_fill, theme.description_opacity, theme.description_stroke, theme.font_size
    );
    out.vertex(&text_id, &html_text(text), &style, "1", description.rect)?;

    let arrow_style = format!(
        "edgeStyle=elbowEdgeStyle;rounded=1;html=1;strokeColor={};endArrow=block;{}jettySize=auto;orthogonal=1",
        theme.description_stroke,
        anchor_style(&description.anchors)
    );
    out.connector(&format!("desc_arrow{idx}"), &text_id, node_id, &arrow_style)
}

/// Serializes a computed layout as an indented draw.io document.
///
/// Cell ids: `id{n}` for nodes, `text{n}`/`desc_arrow{n}` for description
/// labels, `table_name_label{n}`, `package_label_{k}` and
/// `materialization_label{n}` for tags, `e{1000+k}` for graph edges.
pub fn render_drawio(layout: &DiagramLayout, graph: &LineageGraph, theme: &Theme) -> Result<String> {
    let mut out = CellWriter::new();
    out.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.open("mxfile", &[("host", "lineage-drawio")])?;
    out.open("diagram", &[("id", "diagram1"), ("name", "Page-1")])?;
    let page_width = num(layout.canvas.width);
    let page_height = num(layout.canvas.height);
    out.open(
        "mxGraphModel",
        &[
            ("dx", "0"),
            ("dy", "0"),
            ("grid", "1"),
            ("gridSize", "10"),
            ("guides", "1"),
            ("tooltips", "1"),
            ("connect", "1"),
            ("arrows", "1"),
            ("fold", "1"),
            ("page", "1"),
            ("pageWidth", page_width.as_str()),
            ("pageHeight", page_height.as_str()),
        ],
    )?;
    out.open("root", &[])?;
    out.empty("mxCell", &[("id", "0")])?;
    out.empty("mxCell", &[("id", "1"), ("parent", "0")])?;

    write_legend(&mut out, theme)?;

    let mut package_labels = 0usize;
    for placed in &layout.nodes {
        let Some(node) = graph.node(&placed.name) else {
            continue;
        };
        package_labels += write_node(&mut out, placed, node, graph, theme, package_labels)?;
    }

    for (idx, edge) in layout.edges.iter().enumerate() {
        let color = match edge.kind {
            EdgeKind::DerivedFrom => &theme.derived_edge_color,
            EdgeKind::SourcedFrom => &theme.sourced_edge_color,
        };
        let style = format!(
            "edgeStyle=orthogonalEdgeStyle;curved=1;html=1;jettySize=auto;{}strokeColor={color};endArrow=block;orthogonal=1;",
            anchor_style(&edge.anchors)
        );
        out.connector(
            &format!("e{}", FIRST_EDGE_ID + idx),
            &format!("id{}", edge.from),
            &format!("id{}", edge.to),
            &style,
        )?;
    }

    out.close("root")?;
    out.close("mxGraphModel")?;
    out.close("diagram")?;
    out.close("mxfile")?;
    out.finish()
}

/// Writes one node with its tags and description. Returns how many package
/// labels were emitted (0 or 1).
fn write_node(
    out: &mut CellWriter,
    placed: &NodeLayout,
    node: &GraphNode,
    graph: &LineageGraph,
    theme: &Theme,
    package_labels: usize,
) -> Result<usize> {
    let idx = placed.id;
    let node_id = format!("id{idx}");
    let attributes = &node.attributes;
    let rect = placed.rect;
    let package = node.kind == NodeKind::Unit
        && is_package_model(attributes, graph.project_name.as_deref());

    let value = format!(
        "{}<br>{}",
        html_text(&node.name),
        html_text(&attributes.origin_path)
    );
    out.vertex(&node_id, &value, &node_style(node, package, theme), "1", rect)?;

    if let Some(table) = attributes.table_name.as_deref().filter(|t| !t.is_empty()) {
        let width = tag_width(table);
        out.vertex(
            &format!("table_name_label{idx}"),
            &tag_value(&theme.table_tag_background, table),
            &tag_style("right", "bottom", theme),
            "1",
            Rect::new(rect.right() - width, rect.bottom(), width, TAG_HEIGHT),
        )?;
    }

    let mut emitted = 0;
    if package && !attributes.package_name.is_empty() {
        emitted = 1;
        out.vertex(
            &format!("package_label_{}", package_labels + 1),
            &tag_value(&theme.package_tag_background, &attributes.package_name),
            &tag_style("left", "top", theme),
            "1",
            Rect::new(
                rect.x,
                rect.y - PACKAGE_TAG_LIFT,
                tag_width(&attributes.package_name),
                TAG_HEIGHT,
            ),
        )?;
    }

    if node.kind == NodeKind::Unit {
        if let Some(materialization) = attributes.materialization.as_deref() {
            out.vertex(
                &format!("materialization_label{idx}"),
                &tag_value(&theme.materialization_tag_background, materialization),
                &tag_style("left", "top", theme),
                "1",
                Rect::new(
                    rect.x,
                    rect.bottom() + MATERIALIZATION_TAG_GAP,
                    tag_width(materialization),
                    TAG_HEIGHT,
                ),
            )?;
        }
    }

    if let Some(description) = &placed.description {
        write_description(out, &node_id, idx, &attributes.description, description, theme)?;
    }
    Ok(emitted)
}

/// Writes `document` to `path` through a temporary file in the same
/// directory that is renamed over the target once fully written, so a
/// failed write never leaves a truncated document behind.
pub fn write_output(document: &str, path: &Path) -> Result<()> {
    let write_error = |source: std::io::Error| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    staged.write_all(document.as_bytes()).map_err(write_error)?;
    staged.flush().map_err(write_error)?;
    staged.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}
