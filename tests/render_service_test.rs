//! Tests for RenderService with a recording Graphviz stand-in

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use algotree::application::services::{diagram_stem, RenderService};
use algotree::application::ApplicationError;
use algotree::config::{OutputFormat, Settings};
use algotree::domain::{TreeAssembler, ViewMode};
use algotree::infrastructure::traits::RealFileSystem;
use algotree::infrastructure::InfraError;

use common::MockDot;

const LAYOUT: &str = r#"{
    "bb": "0,0,300,200",
    "objects": [
        {"_gvid": 0, "name": "12", "pos": "150,30", "width": "1.5", "height": "0.75"},
        {"_gvid": 1, "name": "struct21", "pos": "150,160", "width": "2", "height": "0.5"}
    ],
    "edges": [
        {"_gvid": 0, "tail": 1, "head": 0, "pos": "e,150,57 150,142 150,110 150,90 150,70"}
    ]
}"#;

fn service(temp: &TempDir, cmd: Arc<MockDot>) -> RenderService {
    let settings = Settings {
        output_dir: temp.path().to_path_buf(),
        dot_command: "dot-test".into(),
        ..Settings::default()
    };
    RenderService::new(Arc::new(RealFileSystem), cmd, Arc::new(settings))
}

#[test]
fn given_png_format_when_rendering_then_runs_dot_with_temp_source() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let graph = common::fixture_graph();
    let tree = TreeAssembler::new(&graph).assemble(12, ViewMode::Short).unwrap();
    let cmd = Arc::new(MockDot::default());
    let stem = temp.path().join("final_diagnoses").join("node012-Pneumonia-short");

    // Act
    let written = service(&temp, cmd.clone())
        .render(&tree, &stem, &[OutputFormat::Png])
        .unwrap();

    // Assert
    let png = temp.path().join("final_diagnoses/node012-Pneumonia-short.png");
    assert_eq!(written, vec![png.clone()]);
    assert!(png.is_file());
    assert!(!temp.path().join("final_diagnoses/node012-Pneumonia-short.dot").exists());

    let calls = cmd.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0], "dot-test");
    assert_eq!(calls[0][1], "-Tpng");
    assert_eq!(calls[0][2], "-o");
    assert!(calls[0][4].ends_with(".dot"));
}

#[test]
fn given_dot_and_svg_formats_when_rendering_then_source_kept_and_reused() {
    let temp = TempDir::new().unwrap();
    let graph = common::fixture_graph();
    let tree = TreeAssembler::new(&graph).assemble(12, ViewMode::Short).unwrap();
    let cmd = Arc::new(MockDot::default());
    let stem = temp.path().join("node012-Pneumonia-short");

    let written = service(&temp, cmd.clone())
        .render(&tree, &stem, &[OutputFormat::Dot, OutputFormat::Svg])
        .unwrap();

    let dot = temp.path().join("node012-Pneumonia-short.dot");
    assert_eq!(written.len(), 2);
    let source = std::fs::read_to_string(&dot).unwrap();
    assert!(source.starts_with("digraph \"node012-Pneumonia-short\""));
    assert!(source.contains(r#""struct21":f211 -> "12""#));
    assert_eq!(cmd.calls()[0][4], dot.to_string_lossy());
}

#[test]
fn given_drawio_format_when_rendering_then_converts_json_layout() {
    let temp = TempDir::new().unwrap();
    let graph = common::fixture_graph();
    let tree = TreeAssembler::new(&graph).assemble(12, ViewMode::Short).unwrap();
    let cmd = Arc::new(MockDot::with_layout(LAYOUT));
    let stem = temp.path().join("node012-Pneumonia-short");

    service(&temp, cmd.clone())
        .render(&tree, &stem, &[OutputFormat::Drawio])
        .unwrap();

    let xml = std::fs::read_to_string(temp.path().join("node012-Pneumonia-short.xml")).unwrap();
    assert!(xml.contains(r#"<mxCell id="n12""#));
    assert!(xml.contains(r#"<mxCell id="nstruct21""#));
    assert!(xml.contains(r#"source="nstruct21" target="n12""#));
    assert_eq!(cmd.calls()[0][1], "-Tjson0");
}

#[test]
fn given_failing_layout_when_rendering_then_render_error_with_exit_code() {
    let temp = TempDir::new().unwrap();
    let graph = common::fixture_graph();
    let tree = TreeAssembler::new(&graph).assemble(12, ViewMode::Short).unwrap();
    let cmd = Arc::new(MockDot::failing(2, "syntax error in line 3"));

    let err = service(&temp, cmd)
        .render(&tree, &temp.path().join("x"), &[OutputFormat::Png])
        .unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, source } => {
            assert!(context.contains("syntax error"));
            match source.downcast_ref::<InfraError>() {
                Some(InfraError::Render { exit_code, .. }) => assert_eq!(*exit_code, Some(2)),
                other => panic!("unexpected source: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn given_node_when_building_stem_then_id_label_and_mode_suffix() {
    let graph = common::fixture_graph();

    let md = graph.by_id(10).unwrap();
    let fd = graph.by_id(12).unwrap();
    let cc = graph.by_id(1).unwrap();

    assert_eq!(diagram_stem(md, ViewMode::Focus, 25), "node010-Pneumonia-mdfocus");
    assert_eq!(diagram_stem(fd, ViewMode::Full, 25), "node012-Pneumonia-full");
    assert_eq!(diagram_stem(cc, ViewMode::Focus, 25), "node001-Cough-ccfocus");
}
