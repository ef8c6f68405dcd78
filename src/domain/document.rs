//! Raw JSON document shape of an algorithm export.
//!
//! These types mirror the file 1:1 and carry plain numeric IDs. They are
//! resolved into an [`AlgorithmGraph`](crate::domain::AlgorithmGraph) by the
//! [`GraphBuilder`](crate::domain::GraphBuilder).

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::entities::{AlgorithmInfo, AnswerId, NodeId, Severity, INFO_KEYS};

#[derive(Debug, Clone, Deserialize)]
pub struct AlgorithmDocument {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    /// Remaining top-level fields (generic metadata)
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl AlgorithmDocument {
    /// Extract the generic metadata fields in `INFO_KEYS` order.
    ///
    /// Strings are taken verbatim, other JSON values are rendered as JSON,
    /// missing fields become empty values.
    pub fn info(&self) -> AlgorithmInfo {
        let fields = INFO_KEYS
            .iter()
            .map(|key| {
                let value = match self.meta.get(*key) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                (key.to_string(), value)
            })
            .collect();
        AlgorithmInfo { fields }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnswer {
    pub id: AnswerId,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawPredecessor {
    pub question: NodeId,
    pub answer: AnswerId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawNode {
    ChiefComplaint {
        id: NodeId,
        #[serde(default)]
        label: String,
        #[serde(default)]
        reference: String,
    },
    MainDiagnosis {
        id: NodeId,
        #[serde(default)]
        label: String,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        chief_complaint: Option<NodeId>,
        #[serde(default)]
        sequence: Vec<NodeId>,
        #[serde(default)]
        predecessors: Vec<RawPredecessor>,
    },
    FinalDiagnosis {
        id: NodeId,
        #[serde(default)]
        label: String,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        main_diagnosis: Option<NodeId>,
        #[serde(default)]
        severity: Severity,
        #[serde(default)]
        excludes: Vec<NodeId>,
        #[serde(default)]
        predecessors: Vec<RawPredecessor>,
    },
    Question {
        id: NodeId,
        #[serde(default)]
        label: String,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        score: Option<i64>,
        #[serde(default)]
        answers: Vec<RawAnswer>,
        #[serde(default)]
        predecessors: Vec<RawPredecessor>,
    },
    QuestionSequence {
        id: NodeId,
        #[serde(default)]
        label: String,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        score: Option<i64>,
        #[serde(default)]
        answers: Vec<RawAnswer>,
        #[serde(default)]
        sequence: Vec<NodeId>,
        #[serde(default)]
        predecessors: Vec<RawPredecessor>,
    },
}

impl RawNode {
    pub fn id(&self) -> NodeId {
        match self {
            RawNode::ChiefComplaint { id, .. }
            | RawNode::MainDiagnosis { id, .. }
            | RawNode::FinalDiagnosis { id, .. }
            | RawNode::Question { id, .. }
            | RawNode::QuestionSequence { id, .. } => *id,
        }
    }

    pub fn answers(&self) -> &[RawAnswer] {
        match self {
            RawNode::Question { answers, .. } | RawNode::QuestionSequence { answers, .. } => {
                answers
            }
            _ => &[],
        }
    }

    pub fn predecessors(&self) -> &[RawPredecessor] {
        match self {
            RawNode::ChiefComplaint { .. } => &[],
            RawNode::MainDiagnosis { predecessors, .. }
            | RawNode::FinalDiagnosis { predecessors, .. }
            | RawNode::Question { predecessors, .. }
            | RawNode::QuestionSequence { predecessors, .. } => predecessors,
        }
    }
}
