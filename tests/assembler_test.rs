//! Tests for TreeAssembler view modes over the fixture algorithm

mod common;

use std::collections::HashSet;

use rstest::{fixture, rstest};

use algotree::domain::{
    AlgorithmGraph, ColorRole, DomainError, EdgeKind, NodeKey, Orientation, Port, Severity,
    Shape, TreeAssembler, ViewMode,
};
use algotree::util::testing;

#[fixture]
fn graph() -> AlgorithmGraph {
    testing::init_test_setup();
    common::fixture_graph()
}

#[rstest]
fn given_severe_final_diagnosis_root_when_assembling_then_severe_doubleoctagon(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(11, ViewMode::Short)
        .unwrap();

    let root = tree.root();
    assert_eq!(root.key, NodeKey::Plain(11));
    assert_eq!(root.shape, Shape::DoubleOctagon);
    assert_eq!(root.fill, ColorRole::Severity(Severity::Severe));
    assert!(root.is_root);
}

#[rstest]
fn given_management_predecessor_when_assembling_short_then_omitted(graph: AlgorithmGraph) {
    let tree = TreeAssembler::new(&graph)
        .assemble(12, ViewMode::Short)
        .unwrap();

    assert!(tree.contains(NodeKey::Struct(21)));
    assert!(!tree.contains(NodeKey::Struct(22)));
    assert_eq!(tree.node_count(), 2);
    assert_eq!(tree.edge_count(), 1);
    assert!(tree.is_taken(211));
    assert!(!tree.is_taken(221));
}

#[rstest]
fn given_management_predecessor_when_assembling_full_then_kept(graph: AlgorithmGraph) {
    let tree = TreeAssembler::new(&graph)
        .assemble(12, ViewMode::Full)
        .unwrap();

    assert!(tree.contains(NodeKey::Struct(22)));
}

#[rstest]
fn given_final_diagnosis_when_assembling_full_then_every_reachable_question_once(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(11, ViewMode::Full)
        .unwrap();

    let keys: Vec<NodeKey> = tree.nodes().iter().map(|n| n.key).collect();
    let unique: HashSet<NodeKey> = keys.iter().copied().collect();
    assert_eq!(keys.len(), unique.len(), "duplicate nodes: {keys:?}");

    // predecessor chain 11 <- 30 <- 21 <- 20
    for id in [20, 21, 30] {
        assert!(tree.contains(NodeKey::Struct(id)), "missing {id}");
    }
    // members of 30 without predecessors have nothing to connect to
    for id in [23, 24, 31] {
        assert!(!tree.contains(NodeKey::Struct(id)), "unconnected {id}");
    }
    assert_eq!(tree.node_count(), 4);
}

#[rstest]
#[case(11, ViewMode::Full)]
#[case(10, ViewMode::Full)]
#[case(30, ViewMode::Short)]
#[case(35, ViewMode::Short)]
#[case(35, ViewMode::Full)]
#[case(10, ViewMode::Short)]
#[case(10, ViewMode::Focus)]
#[case(1, ViewMode::Focus)]
fn given_any_root_when_assembling_then_every_node_has_an_edge(
    graph: AlgorithmGraph,
    #[case] id: u32,
    #[case] mode: ViewMode,
) {
    let tree = TreeAssembler::new(&graph).assemble(id, mode).unwrap();

    let connected: HashSet<NodeKey> = tree
        .edges()
        .iter()
        .flat_map(|e| [e.source, e.target])
        .collect();
    let floating: Vec<NodeKey> = tree
        .nodes()
        .iter()
        .filter(|n| !n.is_root && !connected.contains(&n.key))
        .map(|n| n.key)
        .collect();
    assert!(floating.is_empty(), "nodes without edges: {floating:?}");
}

#[rstest]
fn given_nested_sequence_when_assembling_full_then_outside_predecessor_lands_on_entry_point(
    graph: AlgorithmGraph,
) {
    // 35 = [26, 34], 34 = [25]; 34 is entered from 20:202 (captured by 35)
    // and from 21:212 (not captured)
    let tree = TreeAssembler::new(&graph)
        .assemble(35, ViewMode::Full)
        .unwrap();

    let redirected = tree
        .edges()
        .iter()
        .find(|e| e.source == NodeKey::Struct(21) && e.tail_port == Some(Port::Answer(212)))
        .expect("edge from Q2:212");
    assert_eq!(redirected.target, NodeKey::Struct(25));
    assert_eq!(redirected.head_port, Some(Port::North));

    assert!(!tree.contains(NodeKey::Struct(34)));
    assert!(tree.edges().iter().all(|e| e.target != NodeKey::Struct(34)));
    assert!(!tree.contains(NodeKey::Struct(26)));
    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.edge_count(), 3);
}

#[rstest]
fn given_sequence_root_when_assembling_short_then_captured_predecessor_drawn_once(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(35, ViewMode::Short)
        .unwrap();

    let from_q1: Vec<NodeKey> = tree
        .edges()
        .iter()
        .filter(|e| e.source == NodeKey::Struct(20))
        .map(|e| e.target)
        .collect();
    assert_eq!(from_q1, vec![NodeKey::Plain(35)]);

    let into_nested: Vec<(NodeKey, Option<Port>)> = tree
        .edges()
        .iter()
        .filter(|e| e.target == NodeKey::Struct(34))
        .map(|e| (e.source, e.tail_port))
        .collect();
    assert_eq!(into_nested, vec![(NodeKey::Struct(21), Some(Port::Answer(212)))]);
    assert_eq!(tree.node_count(), 4);
    assert!(tree.is_taken(202));
    assert!(tree.is_taken(212));
}

#[rstest]
fn given_taken_sequence_when_assembling_full_then_continuation_onto_taken_answer(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(11, ViewMode::Full)
        .unwrap();

    let continuation = tree
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::Continuation)
        .expect("continuation edge");
    assert_eq!(continuation.source, NodeKey::Struct(21));
    assert_eq!(continuation.tail_port, Some(Port::Answer(211)));
    assert_eq!(continuation.target, NodeKey::Struct(30));
    assert_eq!(continuation.head_port, Some(Port::Answer(301)));

    let sequence = tree.node(NodeKey::Struct(30)).unwrap();
    assert_eq!(sequence.members, vec!["Q4".to_string(), "QS2".to_string()]);
    assert!(sequence.answers.iter().any(|a| a.id == 301 && a.taken));
}

#[rstest]
fn given_main_diagnosis_when_assembling_short_then_leads_to_final_diagnoses(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(10, ViewMode::Short)
        .unwrap();

    let leads: Vec<NodeKey> = tree
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Leads)
        .map(|e| e.target)
        .collect();
    assert_eq!(leads, vec![NodeKey::Plain(11), NodeKey::Plain(12)]);

    let excludes = tree
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::Excludes)
        .expect("excludes edge");
    assert_eq!(excludes.source, NodeKey::Plain(11));
    assert_eq!(excludes.target, NodeKey::Plain(12));
    assert_eq!(excludes.label.as_deref(), Some("excludes"));
}

#[rstest]
fn given_main_diagnosis_when_assembling_focus_then_final_diagnosis_predecessors_drawn(
    graph: AlgorithmGraph,
) {
    let short = TreeAssembler::new(&graph)
        .assemble(10, ViewMode::Short)
        .unwrap();
    let focus = TreeAssembler::new(&graph)
        .assemble(10, ViewMode::Focus)
        .unwrap();

    let into_fd11 = |tree: &algotree::domain::DiagramTree| {
        tree.edges()
            .iter()
            .any(|e| e.target == NodeKey::Plain(11) && e.kind == EdgeKind::Answer)
    };
    assert!(!into_fd11(&short));
    assert!(into_fd11(&focus));
    assert!(!focus.contains(NodeKey::Struct(22)));
}

#[rstest]
fn given_chief_complaint_when_assembling_focus_then_links_main_diagnoses(
    graph: AlgorithmGraph,
) {
    let tree = TreeAssembler::new(&graph)
        .assemble(1, ViewMode::Focus)
        .unwrap();

    for md in [10, 13] {
        assert!(tree.edges().iter().any(|e| e.source == NodeKey::Plain(1)
            && e.target == NodeKey::Plain(md)
            && e.kind == EdgeKind::Leads));
    }
    assert!(tree.contains(NodeKey::Plain(14)));
}

#[rstest]
#[case(1, ViewMode::Short)]
#[case(1, ViewMode::Full)]
#[case(11, ViewMode::Focus)]
fn given_unsupported_root_when_assembling_then_errors(
    graph: AlgorithmGraph,
    #[case] id: u32,
    #[case] mode: ViewMode,
) {
    let err = TreeAssembler::new(&graph).assemble(id, mode).unwrap_err();

    assert!(matches!(err, DomainError::UnsupportedRoot { .. }));
}

#[rstest]
fn given_unknown_root_when_assembling_then_node_not_found(graph: AlgorithmGraph) {
    let err = TreeAssembler::new(&graph)
        .assemble(999, ViewMode::Short)
        .unwrap_err();

    assert_eq!(err, DomainError::NodeNotFound(999));
}

#[rstest]
#[case(Orientation::TopToBottom, Port::North)]
#[case(Orientation::LeftToRight, Port::East)]
fn given_orientation_when_assembling_then_question_edges_enter_header_port(
    graph: AlgorithmGraph,
    #[case] orientation: Orientation,
    #[case] port: Port,
) {
    let tree = TreeAssembler::new(&graph)
        .with_orientation(orientation)
        .assemble(10, ViewMode::Short)
        .unwrap();

    let into_q21 = tree
        .edges()
        .iter()
        .find(|e| e.target == NodeKey::Struct(21))
        .expect("edge into Q2");
    assert_eq!(into_q21.head_port, Some(port));
}

#[rstest]
fn given_same_root_when_assembling_twice_then_identical(graph: AlgorithmGraph) {
    let assembler = TreeAssembler::new(&graph);

    let first = assembler.assemble(11, ViewMode::Full).unwrap();
    let second = assembler.assemble(11, ViewMode::Full).unwrap();

    assert_eq!(first, second);
}
