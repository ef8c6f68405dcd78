//! Per-diagram node/edge accumulator.
//!
//! A `DiagramTree` is built by the assembler for one root and dropped after
//! rendering. Nodes and edges keep insertion order; inserting a node or edge
//! whose key is already present is a no-op.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{AnswerId, NodeClass, NodeId};
use crate::domain::style::{ColorRole, Shape};

/// Layout direction of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    TopToBottom,
    LeftToRight,
}

impl Orientation {
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Orientation::LeftToRight)
    }

    /// Port on which edges enter a question table.
    pub fn head_port(&self) -> Port {
        match self {
            Orientation::TopToBottom => Port::North,
            Orientation::LeftToRight => Port::East,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::TopToBottom => write!(f, "top-to-bottom"),
            Orientation::LeftToRight => write!(f, "left-to-right"),
        }
    }
}

/// Graphviz node identifier. Question tables get a `struct` prefix so they
/// never collide with plain diagnosis IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Plain(NodeId),
    Struct(NodeId),
}

impl NodeKey {
    pub fn id(&self) -> NodeId {
        match self {
            NodeKey::Plain(id) | NodeKey::Struct(id) => *id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Plain(id) => write!(f, "{}", id),
            NodeKey::Struct(id) => write!(f, "struct{}", id),
        }
    }
}

/// Edge endpoint port on a table node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Answer(AnswerId),
    North,
    East,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Answer(id) => write!(f, "f{}", id),
            Port::North => write!(f, "n"),
            Port::East => write!(f, "e"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCell {
    pub id: AnswerId,
    pub label: String,
    pub taken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramNode {
    pub key: NodeKey,
    pub index: Index,
    pub class: NodeClass,
    pub shape: Shape,
    pub fill: ColorRole,
    pub taken_fill: ColorRole,
    /// `"{reference}. {label}"`, parenthetical stripped, not yet wrapped
    pub title: String,
    /// Member references shown under a sequence header
    pub members: Vec<String>,
    /// Empty for anything but question and sequence tables
    pub answers: Vec<AnswerCell>,
    pub is_root: bool,
}

impl DiagramNode {
    pub fn is_table(&self) -> bool {
        self.shape == Shape::Plain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Question answer leading into a node
    Answer,
    /// Answer leading into a taken answer of a sequence
    Continuation,
    /// Final diagnosis ruling out another
    Excludes,
    /// Hierarchy link (chief complaint to main diagnosis to final diagnosis)
    Leads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: NodeKey,
    pub tail_port: Option<Port>,
    pub target: NodeKey,
    pub head_port: Option<Port>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEdge {
    pub source: NodeKey,
    pub tail_port: Option<Port>,
    pub target: NodeKey,
    pub head_port: Option<Port>,
    pub kind: EdgeKind,
    pub label: Option<String>,
}

impl DiagramEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source,
            tail_port: self.tail_port,
            target: self.target,
            head_port: self.head_port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramTree {
    root: NodeKey,
    nodes: Vec<DiagramNode>,
    node_index: HashMap<NodeKey, usize>,
    edges: Vec<DiagramEdge>,
    edge_keys: HashSet<EdgeKey>,
    taken: BTreeSet<AnswerId>,
}

impl DiagramTree {
    pub fn new(root: DiagramNode) -> Self {
        let key = root.key;
        let mut tree = Self {
            root: key,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            taken: BTreeSet::new(),
        };
        tree.add_node(root);
        tree
    }

    pub fn root(&self) -> &DiagramNode {
        // the root is inserted first and never removed
        &self.nodes[0]
    }

    pub fn root_key(&self) -> NodeKey {
        self.root
    }

    /// Returns false when the key was already present.
    pub fn add_node(&mut self, node: DiagramNode) -> bool {
        if self.node_index.contains_key(&node.key) {
            return false;
        }
        self.node_index.insert(node.key, self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Returns false when an edge with the same endpoints and ports exists.
    pub fn add_edge(&mut self, edge: DiagramEdge) -> bool {
        if !self.edge_keys.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn record_answer(&mut self, answer: AnswerId) {
        self.taken.insert(answer);
    }

    pub fn is_taken(&self, answer: AnswerId) -> bool {
        self.taken.contains(&answer)
    }

    /// Taken answers among a node's cells, in cell order.
    pub fn taken_answers_of(&self, key: NodeKey) -> Vec<AnswerId> {
        self.node(key)
            .map(|n| {
                n.answers
                    .iter()
                    .filter(|a| self.taken.contains(&a.id))
                    .map(|a| a.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mark every recorded answer on its table cell.
    pub fn highlight_answers(&mut self) {
        for node in &mut self.nodes {
            for cell in &mut node.answers {
                cell.taken = self.taken.contains(&cell.id);
            }
        }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.node_index.contains_key(&key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&DiagramNode> {
        self.node_index.get(&key).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generational_arena::Arena;

    fn table(key: NodeKey, index: Index, answers: &[AnswerId]) -> DiagramNode {
        DiagramNode {
            key,
            index,
            class: NodeClass::Question,
            shape: Shape::Plain,
            fill: ColorRole::Question,
            taken_fill: ColorRole::AnswerTaken,
            title: "Q. Fever".into(),
            members: vec![],
            answers: answers
                .iter()
                .map(|&id| AnswerCell {
                    id,
                    label: format!("A{id}"),
                    taken: false,
                })
                .collect(),
            is_root: false,
        }
    }

    fn answer_edge(source: NodeId, answer: AnswerId, target: NodeKey) -> DiagramEdge {
        DiagramEdge {
            source: NodeKey::Struct(source),
            tail_port: Some(Port::Answer(answer)),
            target,
            head_port: None,
            kind: EdgeKind::Answer,
            label: None,
        }
    }

    fn indices() -> (Index, Index) {
        let mut arena = Arena::new();
        (arena.insert(()), arena.insert(()))
    }

    #[test]
    fn given_same_edge_twice_when_adding_then_tree_unchanged() {
        let (a, b) = indices();
        let mut tree = DiagramTree::new(table(NodeKey::Plain(1), a, &[]));
        tree.add_node(table(NodeKey::Struct(2), b, &[21]));

        assert!(tree.add_edge(answer_edge(2, 21, NodeKey::Plain(1))));
        let once = tree.clone();
        assert!(!tree.add_edge(answer_edge(2, 21, NodeKey::Plain(1))));

        assert_eq!(tree, once);
        assert_eq!(tree.edge_count(), 1);
    }

    #[test]
    fn given_different_ports_when_adding_then_distinct_edges() {
        let (a, _) = indices();
        let mut tree = DiagramTree::new(table(NodeKey::Plain(1), a, &[]));

        tree.add_edge(answer_edge(2, 21, NodeKey::Plain(1)));
        tree.add_edge(answer_edge(2, 22, NodeKey::Plain(1)));

        assert_eq!(tree.edge_count(), 2);
    }

    #[test]
    fn given_duplicate_node_key_when_adding_then_first_kept() {
        let (a, b) = indices();
        let mut tree = DiagramTree::new(table(NodeKey::Plain(1), a, &[]));

        assert!(tree.add_node(table(NodeKey::Struct(2), b, &[21])));
        assert!(!tree.add_node(table(NodeKey::Struct(2), b, &[99])));

        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.node(NodeKey::Struct(2)).unwrap().answers[0].id, 21);
    }

    #[test]
    fn given_recorded_answers_when_highlighting_then_cells_marked() {
        let (a, b) = indices();
        let mut tree = DiagramTree::new(table(NodeKey::Plain(1), a, &[]));
        tree.add_node(table(NodeKey::Struct(2), b, &[21, 22]));
        tree.record_answer(22);

        tree.highlight_answers();

        let cells = &tree.node(NodeKey::Struct(2)).unwrap().answers;
        assert!(!cells[0].taken);
        assert!(cells[1].taken);
        assert_eq!(tree.taken_answers_of(NodeKey::Struct(2)), vec![22]);
    }

    #[test]
    fn given_keys_and_ports_when_displaying_then_graphviz_ids() {
        assert_eq!(NodeKey::Struct(7).to_string(), "struct7");
        assert_eq!(NodeKey::Plain(7).to_string(), "7");
        assert_eq!(Port::Answer(12).to_string(), "f12");
        assert_eq!(Orientation::LeftToRight.head_port().to_string(), "e");
        assert_eq!(Orientation::TopToBottom.head_port().to_string(), "n");
    }
}
