//! Domain-level errors

use generational_arena::Index;
use thiserror::Error;

use crate::domain::entities::{AnswerId, NodeId};

/// Domain errors represent violations of the algorithm graph's structure.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate answer id: {0}")]
    DuplicateAnswer(AnswerId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("no node at arena index {0:?}")]
    StaleIndex(Index),

    #[error("node {referenced_by} references unknown node {id}")]
    UnknownNode { id: NodeId, referenced_by: NodeId },

    #[error("node {referenced_by} references unknown answer {answer}")]
    UnknownAnswer { answer: AnswerId, referenced_by: NodeId },

    #[error("node {node}: answer {answer} does not belong to question {question}")]
    InvalidPredecessor {
        node: NodeId,
        question: NodeId,
        answer: AnswerId,
    },

    #[error("node {referenced_by}: expected {expected} for node {id}, found {found}")]
    InvalidReference {
        id: NodeId,
        referenced_by: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("node {0} is not a question sequence")]
    NotASequence(NodeId),

    #[error("cycle detected in question sequence: {0}")]
    SequenceCycle(NodeId),

    #[error("cannot draw a {mode} diagram rooted at {kind} {id}")]
    UnsupportedRoot {
        id: NodeId,
        kind: &'static str,
        mode: &'static str,
    },
}
