//! Graph builder resolving a raw algorithm document into an arena graph.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::debug;

use crate::domain::arena::AlgorithmGraph;
use crate::domain::document::{AlgorithmDocument, RawAnswer, RawNode, RawPredecessor};
use crate::domain::entities::{Answer, Category, Node, NodeClass, NodeId, NodeKind, Predecessor};
use crate::domain::error::DomainError;

/// Result type for graph construction.
pub type GraphResult<T> = Result<T, DomainError>;

/// Builds an [`AlgorithmGraph`] in two passes: first every node is inserted
/// with its answers, then IDs are resolved into arena indices.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: AlgorithmGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, doc: &AlgorithmDocument) -> GraphResult<AlgorithmGraph> {
        self.graph = AlgorithmGraph::new(doc.info());

        let mut inserted: Vec<(Index, &RawNode)> = Vec::with_capacity(doc.nodes.len());
        for raw in &doc.nodes {
            let idx = self.graph.insert(placeholder(raw))?;
            inserted.push((idx, raw));
        }

        for (idx, raw) in inserted {
            let (kind, predecessors) = self.resolve(raw)?;
            if let Some(node) = self.graph.get_mut(idx) {
                node.kind = kind;
                node.predecessors = predecessors;
            }
        }

        debug!("build: resolved {} nodes", self.graph.len());
        Ok(self.graph)
    }

    fn resolve(&self, raw: &RawNode) -> GraphResult<(NodeKind, Vec<Predecessor>)> {
        let owner = raw.id();
        let predecessors = self.resolve_predecessors(owner, raw.predecessors())?;
        let kind = match raw {
            RawNode::ChiefComplaint { .. } => NodeKind::ChiefComplaint,
            RawNode::MainDiagnosis {
                chief_complaint,
                sequence,
                ..
            } => NodeKind::MainDiagnosis {
                chief_complaint: chief_complaint
                    .map(|id| self.resolve_class(owner, id, &[NodeClass::ChiefComplaint]))
                    .transpose()?,
                sequence: self.resolve_members(owner, sequence)?,
            },
            RawNode::FinalDiagnosis {
                main_diagnosis,
                severity,
                excludes,
                ..
            } => NodeKind::FinalDiagnosis {
                main_diagnosis: main_diagnosis
                    .map(|id| self.resolve_class(owner, id, &[NodeClass::MainDiagnosis]))
                    .transpose()?,
                severity: *severity,
                excludes: excludes
                    .iter()
                    .map(|&id| self.resolve_class(owner, id, &[NodeClass::FinalDiagnosis]))
                    .collect::<GraphResult<Vec<_>>>()?,
            },
            RawNode::Question {
                category,
                score,
                answers,
                ..
            } => NodeKind::Question {
                category: Category::parse(category.as_deref()),
                score: *score,
                answers: to_answers(answers),
            },
            RawNode::QuestionSequence {
                category,
                score,
                answers,
                sequence,
                ..
            } => NodeKind::QuestionSequence {
                category: Category::parse(category.as_deref()),
                score: *score,
                answers: to_answers(answers),
                sequence: self.resolve_members(owner, sequence)?,
            },
        };
        Ok((kind, predecessors))
    }

    fn resolve_predecessors(
        &self,
        owner: NodeId,
        raw: &[RawPredecessor],
    ) -> GraphResult<Vec<Predecessor>> {
        raw.iter()
            .map(|p| {
                let question = self.resolve_class(
                    owner,
                    p.question,
                    &[NodeClass::Question, NodeClass::QuestionSequence],
                )?;
                let (answer_owner, _) =
                    self.graph
                        .answer(p.answer)
                        .ok_or(DomainError::UnknownAnswer {
                            answer: p.answer,
                            referenced_by: owner,
                        })?;
                if answer_owner != question {
                    return Err(DomainError::InvalidPredecessor {
                        node: owner,
                        question: p.question,
                        answer: p.answer,
                    });
                }
                Ok(Predecessor {
                    question,
                    answer: p.answer,
                })
            })
            .collect()
    }

    fn resolve_members(&self, owner: NodeId, ids: &[NodeId]) -> GraphResult<Vec<Index>> {
        ids.iter()
            .map(|&id| {
                self.resolve_class(
                    owner,
                    id,
                    &[NodeClass::Question, NodeClass::QuestionSequence],
                )
            })
            .collect()
    }

    fn resolve_class(
        &self,
        owner: NodeId,
        id: NodeId,
        expected: &[NodeClass],
    ) -> GraphResult<Index> {
        let idx = self.graph.index_of(id).ok_or(DomainError::UnknownNode {
            id,
            referenced_by: owner,
        })?;
        let found = self.graph.node(idx).class();
        if !expected.contains(&found) {
            return Err(DomainError::InvalidReference {
                id,
                referenced_by: owner,
                expected: expected.first().map(NodeClass::name).unwrap_or("node"),
                found: found.name(),
            });
        }
        Ok(idx)
    }
}

/// Node with its identity and answers but unresolved relations.
fn placeholder(raw: &RawNode) -> Node {
    let (label, reference) = match raw {
        RawNode::ChiefComplaint {
            label, reference, ..
        }
        | RawNode::MainDiagnosis {
            label, reference, ..
        }
        | RawNode::FinalDiagnosis {
            label, reference, ..
        }
        | RawNode::Question {
            label, reference, ..
        }
        | RawNode::QuestionSequence {
            label, reference, ..
        } => (label.clone(), reference.clone()),
    };
    let kind = match raw {
        RawNode::ChiefComplaint { .. } => NodeKind::ChiefComplaint,
        RawNode::MainDiagnosis { .. } => NodeKind::MainDiagnosis {
            chief_complaint: None,
            sequence: Vec::new(),
        },
        RawNode::FinalDiagnosis { severity, .. } => NodeKind::FinalDiagnosis {
            main_diagnosis: None,
            severity: *severity,
            excludes: Vec::new(),
        },
        RawNode::Question { answers, .. } => NodeKind::Question {
            category: Category::Unspecified,
            score: None,
            answers: to_answers(answers),
        },
        RawNode::QuestionSequence { answers, .. } => NodeKind::QuestionSequence {
            category: Category::Unspecified,
            score: None,
            answers: to_answers(answers),
            sequence: Vec::new(),
        },
    };
    Node {
        id: raw.id(),
        label,
        reference,
        kind,
        predecessors: Vec::new(),
    }
}

fn to_answers(raw: &[RawAnswer]) -> Vec<Answer> {
    raw.iter()
        .map(|a| Answer {
            id: a.id,
            label: a.label.clone(),
        })
        .collect()
}

/// Node counts per class, for summaries.
pub fn class_counts(graph: &AlgorithmGraph) -> HashMap<NodeClass, usize> {
    let mut counts = HashMap::new();
    for (_, node) in graph.iter() {
        *counts.entry(node.class()).or_insert(0) += 1;
    }
    counts
}
