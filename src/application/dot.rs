//! Graphviz DOT emission for assembled diagrams.

use std::fmt::Write;

use crate::config::LabelConfig;
use crate::domain::label::{dot_escape, html_escape, question_wrap_len, wrap_label};
use crate::domain::{
    ColorRole, DiagramEdge, DiagramNode, DiagramTree, EdgeKind, NodeKey, Orientation, Palette,
    Port,
};

const TABLE_OPEN: &str =
    r#"<TABLE BORDER="0" CELLBORDER="1" CELLSPACING="0" CELLPADDING="4">"#;

/// Renders a [`DiagramTree`] to DOT text.
///
/// Output is deterministic: nodes and edges appear in insertion order.
#[derive(Debug, Clone, Copy)]
pub struct DotWriter<'a> {
    palette: &'a Palette,
    labels: &'a LabelConfig,
    orientation: Orientation,
}

impl<'a> DotWriter<'a> {
    pub fn new(palette: &'a Palette, labels: &'a LabelConfig, orientation: Orientation) -> Self {
        Self {
            palette,
            labels,
            orientation,
        }
    }

    pub fn write(&self, tree: &DiagramTree, name: &str) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "digraph \"{}\" {{", dot_escape(name));
        if self.orientation.is_horizontal() {
            let _ = writeln!(out, "  graph [rankdir=LR, splines=spline];");
        } else {
            let _ = writeln!(out, "  graph [splines=spline];");
        }

        for node in tree.nodes() {
            let _ = writeln!(out, "  {}", self.node_statement(node));
        }
        for edge in tree.edges() {
            let _ = writeln!(out, "  {}", self.edge_statement(edge));
        }
        out.push_str("}\n");
        out
    }

    fn node_statement(&self, node: &DiagramNode) -> String {
        if node.is_table() {
            return format!(
                "\"{}\" [shape={}, label=<{}>];",
                node.key,
                node.shape.as_str(),
                self.table_label(node)
            );
        }
        let label = wrap_label(&node.title, self.labels.wrap_width, "\n");
        format!(
            "\"{}\" [label=\"{}\", shape={}, style=filled, fillcolor=\"{}\"];",
            node.key,
            dot_escape(&label),
            node.shape.as_str(),
            self.palette.color(node.fill)
        )
    }

    /// HTML-like table: header cell plus one port per answer.
    pub fn table_label(&self, node: &DiagramNode) -> String {
        let header_color = self.palette.color(node.fill);
        let mut header = format!(
            "<B>{}</B>",
            html_lines(&node.title, question_wrap_len(&node.title))
        );
        if !node.members.is_empty() {
            let members = node.members.join(", ");
            header.push_str("<BR/>");
            header.push_str(&html_lines(&members, question_wrap_len(&node.title)));
        }

        let cells: Vec<String> = node
            .answers
            .iter()
            .map(|a| {
                let fill = if a.taken {
                    node.taken_fill
                } else {
                    ColorRole::Answer
                };
                format!(
                    r#"PORT="f{}" BGCOLOR="{}">{}"#,
                    a.id,
                    self.palette.color(fill),
                    html_lines(&a.label, self.labels.answer_wrap_width)
                )
            })
            .collect();
        let span = cells.len().max(1);

        let mut html = String::from(TABLE_OPEN);
        if self.orientation.is_horizontal() {
            let _ = write!(
                html,
                r#"<TR><TD ROWSPAN="{}" PORT="e" BGCOLOR="{}">{}</TD>"#,
                span, header_color, header
            );
            let mut rows = cells.iter();
            match rows.next() {
                Some(cell) => {
                    let _ = write!(html, "<TD {}</TD></TR>", cell);
                }
                None => html.push_str("</TR>"),
            }
            for cell in rows {
                let _ = write!(html, "<TR><TD {}</TD></TR>", cell);
            }
        } else {
            let _ = write!(
                html,
                r#"<TR><TD COLSPAN="{}" PORT="n" BGCOLOR="{}">{}</TD></TR>"#,
                span, header_color, header
            );
            if !cells.is_empty() {
                html.push_str("<TR>");
                for cell in &cells {
                    let _ = write!(html, "<TD {}</TD>", cell);
                }
                html.push_str("</TR>");
            }
        }
        html.push_str("</TABLE>");
        html
    }

    fn edge_statement(&self, edge: &DiagramEdge) -> String {
        let endpoint = |key: NodeKey, port: Option<Port>| match port {
            Some(p) => format!("\"{}\":{}", key, p),
            None => format!("\"{}\"", key),
        };
        let (color, style) = match edge.kind {
            EdgeKind::Continuation => (self.palette.color(ColorRole::Sequence), "solid"),
            EdgeKind::Excludes => (self.palette.color(ColorRole::Edge), "dashed"),
            EdgeKind::Answer | EdgeKind::Leads => (self.palette.color(ColorRole::Edge), "solid"),
        };
        let mut attrs = format!("color=\"{}\", style={}", color, style);
        if let Some(label) = &edge.label {
            let _ = write!(attrs, ", label=\"{}\"", dot_escape(label));
        }
        format!(
            "{} -> {} [{}];",
            endpoint(edge.source, edge.tail_port),
            endpoint(edge.target, edge.head_port),
            attrs
        )
    }
}

/// Wrap, escape every line, join with HTML breaks.
fn html_lines(s: &str, max_len: usize) -> String {
    wrap_label(s, max_len, "\n")
        .split('\n')
        .map(html_escape)
        .collect::<Vec<_>>()
        .join("<BR/>")
}
