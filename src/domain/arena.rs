use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{AlgorithmInfo, Answer, AnswerId, Node, NodeClass, NodeId, NodeKind};
use crate::domain::error::DomainError;

/// Arena-backed clinical algorithm graph.
///
/// Nodes are never removed once inserted, so every `Index` handed out by the
/// graph stays valid for its whole lifetime. Relations between nodes are
/// stored as arena indices; the ID index maps the exported numeric IDs.
#[derive(Debug, Default)]
pub struct AlgorithmGraph {
    /// Arena storage for all nodes
    arena: Arena<Node>,
    /// Exported node ID -> arena index
    ids: HashMap<NodeId, Index>,
    /// Insertion (document) order
    order: Vec<Index>,
    /// Answer ID -> owning question
    answer_owner: HashMap<AnswerId, Index>,
    info: AlgorithmInfo,
}

impl AlgorithmGraph {
    pub fn new(info: AlgorithmInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn info(&self) -> &AlgorithmInfo {
        &self.info
    }

    /// Insert a node, registering its ID and answers.
    #[instrument(level = "trace", skip(self, node), fields(id = node.id))]
    pub fn insert(&mut self, node: Node) -> Result<Index, DomainError> {
        if self.ids.contains_key(&node.id) {
            return Err(DomainError::DuplicateNode(node.id));
        }
        for answer in node.answers() {
            if self.answer_owner.contains_key(&answer.id) {
                return Err(DomainError::DuplicateAnswer(answer.id));
            }
        }
        let id = node.id;
        let answer_ids: Vec<AnswerId> = node.answers().iter().map(|a| a.id).collect();
        let idx = self.arena.insert(node);
        for answer_id in answer_ids {
            self.answer_owner.insert(answer_id, idx);
        }
        self.ids.insert(id, idx);
        self.order.push(idx);
        Ok(idx)
    }

    pub fn get(&self, idx: Index) -> Option<&Node> {
        self.arena.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: Index) -> Option<&mut Node> {
        self.arena.get_mut(idx)
    }

    /// Node at an index obtained from this graph.
    pub fn node(&self, idx: Index) -> &Node {
        &self.arena[idx]
    }

    pub fn index_of(&self, id: NodeId) -> Option<Index> {
        self.ids.get(&id).copied()
    }

    pub fn by_id(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| self.node(idx))
    }

    /// Question owning an answer, with the answer itself.
    pub fn answer(&self, answer_id: AnswerId) -> Option<(Index, &Answer)> {
        let owner = *self.answer_owner.get(&answer_id)?;
        self.node(owner)
            .answers()
            .iter()
            .find(|a| a.id == answer_id)
            .map(|a| (owner, a))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &Node)> + '_ {
        self.order.iter().map(move |&idx| (idx, self.node(idx)))
    }

    /// Nodes of one class, in document order.
    pub fn nodes_of_class(&self, class: NodeClass) -> Vec<Index> {
        self.iter()
            .filter(|(_, n)| n.class() == class)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn count(&self, class: NodeClass) -> usize {
        self.iter().filter(|(_, n)| n.class() == class).count()
    }

    /// Main diagnoses belonging to a chief complaint.
    pub fn main_diagnoses_of(&self, chief_complaint: Index) -> Vec<Index> {
        self.iter()
            .filter(|(_, n)| {
                matches!(
                    n.kind,
                    NodeKind::MainDiagnosis { chief_complaint: Some(cc), .. } if cc == chief_complaint
                )
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Final diagnoses belonging to a main diagnosis.
    pub fn final_diagnoses_of(&self, main_diagnosis: Index) -> Vec<Index> {
        self.iter()
            .filter(|(_, n)| {
                matches!(
                    n.kind,
                    NodeKind::FinalDiagnosis { main_diagnosis: Some(md), .. } if md == main_diagnosis
                )
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, Severity};

    fn question(id: NodeId, answers: &[AnswerId]) -> Node {
        Node {
            id,
            label: format!("Question {id}"),
            reference: format!("Q{id}"),
            kind: NodeKind::Question {
                category: Category::Unspecified,
                score: None,
                answers: answers
                    .iter()
                    .map(|&a| Answer {
                        id: a,
                        label: format!("A{a}"),
                    })
                    .collect(),
            },
            predecessors: vec![],
        }
    }

    #[test]
    fn given_nodes_when_inserting_then_lookup_by_id_and_answer_works() {
        let mut graph = AlgorithmGraph::default();
        let q = graph.insert(question(1, &[11, 12])).unwrap();

        assert_eq!(graph.index_of(1), Some(q));
        assert_eq!(graph.by_id(1).map(|n| n.reference.as_str()), Some("Q1"));
        let (owner, answer) = graph.answer(12).unwrap();
        assert_eq!(owner, q);
        assert_eq!(answer.label, "A12");
        assert!(graph.answer(99).is_none());
    }

    #[test]
    fn given_duplicate_node_id_when_inserting_then_errors() {
        let mut graph = AlgorithmGraph::default();
        graph.insert(question(1, &[11])).unwrap();

        let result = graph.insert(question(1, &[13]));

        assert_eq!(result, Err(DomainError::DuplicateNode(1)));
    }

    #[test]
    fn given_duplicate_answer_id_when_inserting_then_errors() {
        let mut graph = AlgorithmGraph::default();
        graph.insert(question(1, &[11])).unwrap();

        let result = graph.insert(question(2, &[11]));

        assert_eq!(result, Err(DomainError::DuplicateAnswer(11)));
    }

    #[test]
    fn given_diagnoses_when_filtering_by_parent_then_returns_children_in_order() {
        let mut graph = AlgorithmGraph::default();
        let cc = graph
            .insert(Node {
                id: 1,
                label: "Cough".into(),
                reference: "CC1".into(),
                kind: NodeKind::ChiefComplaint,
                predecessors: vec![],
            })
            .unwrap();
        let md = graph
            .insert(Node {
                id: 2,
                label: "Pneumonia".into(),
                reference: "DD1".into(),
                kind: NodeKind::MainDiagnosis {
                    chief_complaint: Some(cc),
                    sequence: vec![],
                },
                predecessors: vec![],
            })
            .unwrap();
        for id in [3, 4] {
            graph
                .insert(Node {
                    id,
                    label: format!("FD {id}"),
                    reference: format!("DF{id}"),
                    kind: NodeKind::FinalDiagnosis {
                        main_diagnosis: Some(md),
                        severity: Severity::Mild,
                        excludes: vec![],
                    },
                    predecessors: vec![],
                })
                .unwrap();
        }

        assert_eq!(graph.main_diagnoses_of(cc), vec![md]);
        let fds: Vec<NodeId> = graph
            .final_diagnoses_of(md)
            .into_iter()
            .map(|i| graph.node(i).id)
            .collect();
        assert_eq!(fds, vec![3, 4]);
        assert_eq!(graph.count(NodeClass::FinalDiagnosis), 2);
    }
}
