//! Conversion of a Graphviz layout into a drawio (mxGraph XML) document.
//!
//! Input is the output of `dot -Tjson0`: node centres and edge splines in
//! points with the origin at the bottom left, node sizes in inches. drawio
//! puts the origin at the top left, so y is flipped against the bounding box.

use std::collections::HashMap;
use std::fmt::{self, Write};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::label::strip_parenthetical;
use crate::domain::{ColorRole, DiagramNode, DiagramTree, EdgeKind, Palette, Shape};

const POINTS_PER_INCH: f64 = 72.0;

/// Laid-out graph as emitted by `dot -Tjson0`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphLayout {
    #[serde(default)]
    pub bb: Option<String>,
    #[serde(default)]
    pub objects: Vec<LayoutObject>,
    #[serde(default)]
    pub edges: Vec<LayoutEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutObject {
    #[serde(rename = "_gvid")]
    pub gvid: usize,
    pub name: String,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutEdge {
    #[serde(rename = "_gvid")]
    pub gvid: usize,
    pub tail: usize,
    pub head: usize,
    #[serde(default)]
    pub pos: Option<String>,
}

impl GraphLayout {
    pub fn parse(json: &str) -> ApplicationResult<Self> {
        serde_json::from_str(json).map_err(|e| ApplicationError::OperationFailed {
            context: "parse graphviz json layout".into(),
            source: Box::new(e),
        })
    }

    /// Height of the bounding box, used to flip the y axis.
    fn height(&self) -> f64 {
        self.bb
            .as_deref()
            .and_then(|bb| bb.split(',').nth(3))
            .and_then(|h| h.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Builds mxGraph XML from a diagram and its Graphviz layout.
#[derive(Debug, Clone)]
pub struct DrawioConverter<'a> {
    palette: &'a Palette,
    diagram_id: String,
}

impl<'a> DrawioConverter<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self {
            palette,
            diagram_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_diagram_id(mut self, id: impl Into<String>) -> Self {
        self.diagram_id = id.into();
        self
    }

    pub fn convert(
        &self,
        tree: &DiagramTree,
        layout: &GraphLayout,
        name: &str,
    ) -> ApplicationResult<String> {
        let mut xml = String::new();
        self.write_document(&mut xml, tree, layout, name)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("write drawio document: {name}"),
                source: Box::new(e),
            })?;
        debug!(
            "convert: {} nodes, {} edges -> {} bytes",
            tree.node_count(),
            tree.edge_count(),
            xml.len()
        );
        Ok(xml)
    }

    fn write_document(
        &self,
        xml: &mut String,
        tree: &DiagramTree,
        layout: &GraphLayout,
        name: &str,
    ) -> fmt::Result {
        let flip = layout.height();
        let objects: HashMap<&str, &LayoutObject> =
            layout.objects.iter().map(|o| (o.name.as_str(), o)).collect();
        let names: HashMap<usize, &str> =
            layout.objects.iter().map(|o| (o.gvid, o.name.as_str())).collect();

        writeln!(xml, r#"<mxfile host="algotree" type="device">"#)?;
        writeln!(
            xml,
            r#"  <diagram id="{}" name="{}">"#,
            xml_escape(&self.diagram_id),
            xml_escape(name)
        )?;
        writeln!(
            xml,
            r#"    <mxGraphModel grid="1" gridSize="10" guides="1" arrows="1" connect="1" page="0">"#
        )?;
        writeln!(xml, "      <root>")?;
        writeln!(xml, r#"        <mxCell id="0"/>"#)?;
        writeln!(xml, r#"        <mxCell id="1" parent="0"/>"#)?;

        for node in tree.nodes() {
            let key = node.key.to_string();
            let rect = match objects.get(key.as_str()).and_then(|o| node_rect(o, flip)) {
                Some(rect) => rect,
                None => {
                    warn!("convert: no layout for node {}", key);
                    continue;
                }
            };
            writeln!(
                xml,
                r#"        <mxCell id="n{}" value="{}" style="{}" vertex="1" parent="1">"#,
                key,
                xml_escape(&self.node_value(node)),
                self.node_style(node)
            )?;
            writeln!(
                xml,
                r#"          <mxGeometry x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" as="geometry"/>"#,
                rect.x, rect.y, rect.width, rect.height
            )?;
            writeln!(xml, "        </mxCell>")?;
        }

        for (i, edge) in tree.edges().iter().enumerate() {
            let (source, target) = (edge.source.to_string(), edge.target.to_string());
            // json0 lists edges in input order; only trust the spline when
            // the endpoints agree
            let points = layout
                .edges
                .get(i)
                .filter(|e| {
                    names.get(&e.tail) == Some(&source.as_str())
                        && names.get(&e.head) == Some(&target.as_str())
                })
                .and_then(|e| e.pos.as_deref())
                .map(|pos| spline_points(pos, flip))
                .unwrap_or_default();

            let label = edge.label.as_deref().unwrap_or_default();
            writeln!(
                xml,
                r#"        <mxCell id="e{}" value="{}" style="{}" edge="1" parent="1" source="n{}" target="n{}">"#,
                i,
                xml_escape(label),
                self.edge_style(edge.kind),
                source,
                target
            )?;
            if points.is_empty() {
                writeln!(xml, r#"          <mxGeometry relative="1" as="geometry"/>"#)?;
            } else {
                writeln!(xml, r#"          <mxGeometry relative="1" as="geometry">"#)?;
                writeln!(xml, r#"            <Array as="points">"#)?;
                for (x, y) in points {
                    writeln!(xml, r#"              <mxPoint x="{:.1}" y="{:.1}"/>"#, x, y)?;
                }
                writeln!(xml, "            </Array>")?;
                writeln!(xml, "          </mxGeometry>")?;
            }
            writeln!(xml, "        </mxCell>")?;
        }

        writeln!(xml, "      </root>")?;
        writeln!(xml, "    </mxGraphModel>")?;
        writeln!(xml, "  </diagram>")?;
        writeln!(xml, "</mxfile>")
    }

    /// HTML label; answer cells become lines, taken ones highlighted.
    fn node_value(&self, node: &DiagramNode) -> String {
        let title = html_text(&node.title);
        if !node.is_table() {
            return title;
        }
        let mut value = format!("<b>{}</b>", title);
        if !node.members.is_empty() {
            let _ = write!(value, "<br/><i>{}</i>", html_text(&node.members.join(", ")));
        }
        if !node.answers.is_empty() {
            value.push_str("<hr/>");
        }
        let cells: Vec<String> = node
            .answers
            .iter()
            .map(|a| {
                let label = html_text(strip_parenthetical(&a.label));
                if a.taken {
                    format!(
                        r#"<span style="background-color:{}">{}</span>"#,
                        self.palette.color(node.taken_fill),
                        label
                    )
                } else {
                    label
                }
            })
            .collect();
        value.push_str(&cells.join("<br/>"));
        value
    }

    fn node_style(&self, node: &DiagramNode) -> String {
        let shape = match node.shape {
            Shape::DoubleOctagon => "shape=mxgraph.basic.octagon2;dx=10;strokeWidth=3;",
            Shape::Octagon => "shape=mxgraph.basic.octagon2;dx=10;",
            Shape::Box => "rounded=0;",
            Shape::Plain => "rounded=0;align=left;spacingLeft=4;",
        };
        format!(
            "{}whiteSpace=wrap;html=1;fillColor={};",
            shape,
            self.palette.color(node.fill)
        )
    }

    fn edge_style(&self, kind: EdgeKind) -> String {
        let (color, dashed) = match kind {
            EdgeKind::Continuation => (self.palette.color(ColorRole::Sequence), false),
            EdgeKind::Excludes => (self.palette.color(ColorRole::Edge), true),
            EdgeKind::Answer | EdgeKind::Leads => (self.palette.color(ColorRole::Edge), false),
        };
        format!(
            "curved=1;endArrow=classic;html=1;strokeColor={};{}",
            color,
            if dashed { "dashed=1;" } else { "" }
        )
    }
}

fn node_rect(object: &LayoutObject, flip: f64) -> Option<Rect> {
    let (cx, cy) = parse_point(object.pos.as_deref()?)?;
    let width = object.width.as_deref()?.parse::<f64>().ok()? * POINTS_PER_INCH;
    let height = object.height.as_deref()?.parse::<f64>().ok()? * POINTS_PER_INCH;
    Some(Rect {
        x: cx - width / 2.0,
        y: flip - cy - height / 2.0,
        width,
        height,
    })
}

/// Control points of a Graphviz spline, y flipped.
///
/// The `s,` and `e,` arrow endpoints are dropped; drawio attaches the edge
/// to its terminals itself.
fn spline_points(pos: &str, flip: f64) -> Vec<(f64, f64)> {
    pos.split_whitespace()
        .filter(|p| !p.starts_with("e,") && !p.starts_with("s,"))
        .filter_map(parse_point)
        .map(|(x, y)| (x, flip - y))
        .collect()
}

fn parse_point(s: &str) -> Option<(f64, f64)> {
    let (x, y) = s.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn html_text(s: &str) -> String {
    s.split('\n').map(xml_escape).collect::<Vec<_>>().join("<br/>")
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
