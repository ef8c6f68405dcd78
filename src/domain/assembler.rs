//! Tree assembly: short, full and focus views over the algorithm graph.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::arena::AlgorithmGraph;
use crate::domain::diagram::{
    AnswerCell, DiagramEdge, DiagramNode, DiagramTree, EdgeKind, NodeKey, Orientation, Port,
};
use crate::domain::entities::{AnswerId, NodeClass, NodeId, NodeKind, Predecessor};
use crate::domain::error::DomainError;
use crate::domain::label::strip_parenthetical;
use crate::domain::sequence::SequenceAnalyzer;
use crate::domain::style::{is_excluded, style_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Immediate predecessor pairs only
    #[default]
    Short,
    /// Everything reachable through predecessor links and sequence members
    Full,
    /// Diagnosis grouping: complaint to main diagnoses, or main diagnosis to
    /// final diagnoses
    Focus,
}

impl ViewMode {
    /// File name suffix of a diagram rooted at a node of `class`.
    pub fn suffix(&self, class: NodeClass) -> &'static str {
        match (self, class) {
            (ViewMode::Short, _) => "short",
            (ViewMode::Full, _) => "full",
            (ViewMode::Focus, NodeClass::ChiefComplaint) => "ccfocus",
            (ViewMode::Focus, _) => "mdfocus",
        }
    }

    fn is_filtered(&self) -> bool {
        !matches!(self, ViewMode::Full)
    }

    fn name(&self) -> &'static str {
        match self {
            ViewMode::Short => "short",
            ViewMode::Full => "full",
            ViewMode::Focus => "focus",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(ViewMode::Short),
            "full" => Ok(ViewMode::Full),
            "focus" | "mdfocus" | "ccfocus" => Ok(ViewMode::Focus),
            other => Err(format!("unknown view mode: {other}")),
        }
    }
}

/// Builds a [`DiagramTree`] for one root node.
#[derive(Debug, Clone, Copy)]
pub struct TreeAssembler<'g> {
    graph: &'g AlgorithmGraph,
    orientation: Orientation,
}

impl<'g> TreeAssembler<'g> {
    pub fn new(graph: &'g AlgorithmGraph) -> Self {
        Self {
            graph,
            orientation: Orientation::default(),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub fn assemble(&self, root_id: NodeId, mode: ViewMode) -> Result<DiagramTree, DomainError> {
        let root = self
            .graph
            .index_of(root_id)
            .ok_or(DomainError::NodeNotFound(root_id))?;
        let node = self.graph.node(root);
        let unsupported = || DomainError::UnsupportedRoot {
            id: root_id,
            kind: node.class().name(),
            mode: mode.name(),
        };

        let mut asm = Assembly::new(self.graph, root, mode, self.orientation);
        match (mode, node.class()) {
            (ViewMode::Short, NodeClass::ChiefComplaint)
            | (ViewMode::Full, NodeClass::ChiefComplaint) => return Err(unsupported()),
            (ViewMode::Short, class) => asm.short(class)?,
            (ViewMode::Full, _) => asm.full()?,
            (ViewMode::Focus, NodeClass::ChiefComplaint) => asm.chief_complaint_focus()?,
            (ViewMode::Focus, NodeClass::MainDiagnosis) => asm.main_diagnosis(root, true)?,
            (ViewMode::Focus, _) => return Err(unsupported()),
        }

        let mut tree = asm.tree;
        tree.highlight_answers();
        debug!(
            "assemble: {} nodes, {} edges",
            tree.node_count(),
            tree.edge_count()
        );
        Ok(tree)
    }
}

/// State of one assembly run.
struct Assembly<'g> {
    graph: &'g AlgorithmGraph,
    root: Index,
    filtered: bool,
    orientation: Orientation,
    analyzer: SequenceAnalyzer<'g>,
    tree: DiagramTree,
}

impl<'g> Assembly<'g> {
    fn new(graph: &'g AlgorithmGraph, root: Index, mode: ViewMode, orientation: Orientation) -> Self {
        let tree = DiagramTree::new(diagram_node(graph, root, true));
        Self {
            graph,
            root,
            filtered: mode.is_filtered(),
            orientation,
            analyzer: SequenceAnalyzer::new(graph),
            tree,
        }
    }

    fn short(&mut self, class: NodeClass) -> Result<(), DomainError> {
        match class {
            NodeClass::QuestionSequence => self.short_sequence(),
            NodeClass::MainDiagnosis => self.main_diagnosis(self.root, false),
            _ => {
                self.add_predecessors(self.root);
                Ok(())
            }
        }
    }

    fn short_sequence(&mut self) -> Result<(), DomainError> {
        let graph = self.graph;
        self.add_predecessors(self.root);
        let captured = self.analyzer.analyse(self.root)?.predecessor_ids.clone();

        for member in self.members(self.root) {
            if self.skip(member) {
                continue;
            }
            let node = graph.node(member);
            if node.is_sequence() {
                for pred in node.predecessors.iter().copied() {
                    if !captured.contains(&graph.node(pred.question).id) {
                        self.add_pair(member, pred);
                    }
                }
            } else {
                self.add_predecessors(member);
            }
        }
        Ok(())
    }

    /// Main diagnosis expansion: its members with their predecessors, then its
    /// final diagnoses and what they exclude.
    fn main_diagnosis(&mut self, md: Index, focus: bool) -> Result<(), DomainError> {
        self.add_predecessors(md);
        for member in self.members(md) {
            if self.skip(member) {
                continue;
            }
            self.add_predecessors(member);
        }

        for fd in self.graph.final_diagnoses_of(md) {
            self.ensure_node(fd);
            self.add_link(md, fd, EdgeKind::Leads);
            if focus {
                self.add_predecessors(fd);
            }
            for excluded in self.excludes(fd) {
                self.ensure_node(excluded);
                self.add_link(fd, excluded, EdgeKind::Excludes);
            }
        }
        Ok(())
    }

    fn chief_complaint_focus(&mut self) -> Result<(), DomainError> {
        for md in self.graph.main_diagnoses_of(self.root) {
            self.ensure_node(md);
            self.add_link(self.root, md, EdgeKind::Leads);
            self.main_diagnosis(md, true)?;
        }
        Ok(())
    }

    /// Breadth-first expansion through predecessor links and sequence members.
    fn full(&mut self) -> Result<(), DomainError> {
        let graph = self.graph;
        let mut queue = VecDeque::from([self.root]);
        let mut visited = HashSet::from([self.root]);
        // sequences whose inbound edges were redirected onto their entry points
        let mut redirected: HashSet<Index> = HashSet::new();

        while let Some(idx) = queue.pop_front() {
            let node = graph.node(idx);
            trace!("full: visiting {}", node.id);

            if !redirected.contains(&idx) {
                let key = self.key_of(idx);
                let taken = self.tree.taken_answers_of(key);
                if idx != self.root && node.is_sequence() && !taken.is_empty() {
                    for pred in node.predecessors.iter().copied() {
                        self.add_continuation(idx, pred, &taken);
                    }
                } else {
                    self.add_predecessors(idx);
                }
                for pred in &node.predecessors {
                    if visited.insert(pred.question) {
                        queue.push_back(pred.question);
                    }
                }
            }

            if node.sequence().is_none() {
                continue;
            }
            let captured = self.captured_by(idx)?;
            for member in self.members(idx) {
                let m = graph.node(member);
                if m.is_sequence() {
                    let entry_points = self.analyzer.analyse(member)?.entry_points.clone();
                    for pred in m.predecessors.iter().copied() {
                        if captured.contains(&graph.node(pred.question).id) {
                            continue;
                        }
                        for &entry in &entry_points {
                            self.add_pair(entry, pred);
                        }
                        if visited.insert(pred.question) {
                            queue.push_back(pred.question);
                        }
                    }
                    if !visited.contains(&member) {
                        redirected.insert(member);
                    }
                }
                if visited.insert(member) {
                    queue.push_back(member);
                }
            }
        }
        Ok(())
    }

    /// Predecessor question IDs already drawn into a container.
    fn captured_by(&mut self, container: Index) -> Result<BTreeSet<NodeId>, DomainError> {
        let graph = self.graph;
        let node = graph.node(container);
        if node.is_sequence() {
            return Ok(self.analyzer.analyse(container)?.predecessor_ids.clone());
        }
        Ok(node
            .predecessors
            .iter()
            .map(|p| graph.node(p.question).id)
            .collect())
    }

    fn skip(&self, idx: Index) -> bool {
        self.filtered && is_excluded(self.graph.node(idx))
    }

    fn members(&self, idx: Index) -> Vec<Index> {
        self.graph
            .node(idx)
            .sequence()
            .map(<[Index]>::to_vec)
            .unwrap_or_default()
    }

    fn excludes(&self, fd: Index) -> Vec<Index> {
        match &self.graph.node(fd).kind {
            NodeKind::FinalDiagnosis { excludes, .. } => excludes.clone(),
            _ => Vec::new(),
        }
    }

    fn key_of(&self, idx: Index) -> NodeKey {
        let node = self.graph.node(idx);
        if idx != self.root && node.has_answers() {
            NodeKey::Struct(node.id)
        } else {
            NodeKey::Plain(node.id)
        }
    }

    fn ensure_node(&mut self, idx: Index) {
        if idx == self.root {
            return;
        }
        self.tree.add_node(diagram_node(self.graph, idx, false));
    }

    fn add_predecessors(&mut self, target: Index) {
        let preds = self.graph.node(target).predecessors.clone();
        for pred in preds {
            self.add_pair(target, pred);
        }
    }

    /// Draw the question of a predecessor pair and its answer edge into
    /// `target`. Nodes only enter the diagram through an edge, so sequence
    /// members without a drawn pair stay out. Returns false when the
    /// question is filtered out.
    fn add_pair(&mut self, target: Index, pred: Predecessor) -> bool {
        if self.skip(pred.question) {
            trace!("add_pair: skipping {}", self.graph.node(pred.question).id);
            return false;
        }
        self.ensure_node(target);
        self.ensure_node(pred.question);
        self.tree.record_answer(pred.answer);

        let target_node = self.graph.node(target);
        let head_port = if target != self.root && target_node.has_answers() {
            Some(self.orientation.head_port())
        } else {
            None
        };
        self.tree.add_edge(DiagramEdge {
            source: self.key_of(pred.question),
            tail_port: self.tail_port(pred),
            target: self.key_of(target),
            head_port,
            kind: EdgeKind::Answer,
            label: self.graph.node(pred.question).score().map(|s| s.to_string()),
        });
        true
    }

    /// Predecessor edges of a drawn sequence, landing on its taken answers.
    fn add_continuation(&mut self, sequence: Index, pred: Predecessor, taken: &[AnswerId]) {
        self.ensure_node(sequence);
        self.ensure_node(pred.question);
        self.tree.record_answer(pred.answer);
        for &answer in taken {
            self.tree.add_edge(DiagramEdge {
                source: self.key_of(pred.question),
                tail_port: self.tail_port(pred),
                target: self.key_of(sequence),
                head_port: Some(Port::Answer(answer)),
                kind: EdgeKind::Continuation,
                label: self.graph.node(pred.question).score().map(|s| s.to_string()),
            });
        }
    }

    fn tail_port(&self, pred: Predecessor) -> Option<Port> {
        if pred.question == self.root {
            None
        } else {
            Some(Port::Answer(pred.answer))
        }
    }

    fn add_link(&mut self, from: Index, to: Index, kind: EdgeKind) {
        let label = (kind == EdgeKind::Excludes).then(|| "excludes".to_string());
        self.tree.add_edge(DiagramEdge {
            source: self.key_of(from),
            tail_port: None,
            target: self.key_of(to),
            head_port: None,
            kind,
            label,
        });
    }
}

fn diagram_node(graph: &AlgorithmGraph, idx: Index, is_root: bool) -> DiagramNode {
    let node = graph.node(idx);
    let style = style_for(node, is_root);
    let key = if !is_root && node.has_answers() {
        NodeKey::Struct(node.id)
    } else {
        NodeKey::Plain(node.id)
    };
    let stripped = strip_parenthetical(&node.label);
    let title = if node.reference.is_empty() {
        stripped.to_string()
    } else {
        format!("{}. {}", node.reference, stripped)
    };
    let is_table = !is_root && node.has_answers();

    DiagramNode {
        key,
        index: idx,
        class: node.class(),
        shape: style.shape,
        fill: style.fill,
        taken_fill: style.taken_fill,
        title,
        members: if is_table && node.is_sequence() {
            node.sequence()
                .unwrap_or_default()
                .iter()
                .map(|&m| graph.node(m).reference.clone())
                .filter(|r| !r.is_empty())
                .collect()
        } else {
            Vec::new()
        },
        answers: if is_table {
            node.answers()
                .iter()
                .map(|a| AnswerCell {
                    id: a.id,
                    label: strip_parenthetical(&a.label).to_string(),
                    taken: false,
                })
                .collect()
        } else {
            Vec::new()
        },
        is_root,
    }
}
