//! Domain entities: core data structures of a clinical algorithm

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

/// Numeric node identifier, unique within one loaded algorithm.
pub type NodeId = u32;

/// Numeric answer identifier, unique within one loaded algorithm.
pub type AnswerId = u32;

/// Severity assigned to a final diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Question category as exported by the algorithm editor.
///
/// Only the categories that change how a node is drawn or filtered get their
/// own variant; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    BackgroundCalculation,
    Management,
    TreatmentQuestion,
    Other(String),
    #[default]
    Unspecified,
}

impl Category {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Category::Unspecified,
            Some("background_calculation") => Category::BackgroundCalculation,
            Some("management") => Category::Management,
            Some("treatment_question") => Category::TreatmentQuestion,
            Some(other) => Category::Other(other.to_string()),
        }
    }

    /// Management and treatment questions are post-diagnosis actions, not
    /// diagnostic branching.
    pub fn is_post_diagnostic(&self) -> bool {
        matches!(self, Category::Management | Category::TreatmentQuestion)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::BackgroundCalculation => "background_calculation",
            Category::Management => "management",
            Category::TreatmentQuestion => "treatment_question",
            Category::Other(s) => s.as_str(),
            Category::Unspecified => "",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One answer of a question or question sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: AnswerId,
    pub label: String,
}

/// A (grandparent question, parent answer) pair leading into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predecessor {
    /// Arena index of the question or question sequence asked before
    pub question: Index,
    /// The answer of that question which leads here
    pub answer: AnswerId,
}

/// Kind-specific payload of a node. Closed set of node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    ChiefComplaint,
    MainDiagnosis {
        chief_complaint: Option<Index>,
        sequence: Vec<Index>,
    },
    FinalDiagnosis {
        main_diagnosis: Option<Index>,
        severity: Severity,
        excludes: Vec<Index>,
    },
    Question {
        category: Category,
        score: Option<i64>,
        answers: Vec<Answer>,
    },
    QuestionSequence {
        category: Category,
        score: Option<i64>,
        answers: Vec<Answer>,
        sequence: Vec<Index>,
    },
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::ChiefComplaint => NodeClass::ChiefComplaint,
            NodeKind::MainDiagnosis { .. } => NodeClass::MainDiagnosis,
            NodeKind::FinalDiagnosis { .. } => NodeClass::FinalDiagnosis,
            NodeKind::Question { .. } => NodeClass::Question,
            NodeKind::QuestionSequence { .. } => NodeClass::QuestionSequence,
        }
    }

    pub fn name(&self) -> &'static str {
        self.class().name()
    }
}

/// Payload-free node kind, used for selection and style dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeClass {
    ChiefComplaint,
    MainDiagnosis,
    FinalDiagnosis,
    Question,
    QuestionSequence,
}

impl NodeClass {
    pub fn name(&self) -> &'static str {
        match self {
            NodeClass::ChiefComplaint => "chief complaint",
            NodeClass::MainDiagnosis => "main diagnosis",
            NodeClass::FinalDiagnosis => "final diagnosis",
            NodeClass::Question => "question",
            NodeClass::QuestionSequence => "question sequence",
        }
    }

    /// Output subdirectory for diagrams rooted at nodes of this class.
    pub fn dir_name(&self) -> &'static str {
        match self {
            NodeClass::ChiefComplaint => "chief_complaints",
            NodeClass::MainDiagnosis => "main_diagnoses",
            NodeClass::FinalDiagnosis => "final_diagnoses",
            NodeClass::Question => "questions",
            NodeClass::QuestionSequence => "question_sequences",
        }
    }
}

/// A node of the clinical algorithm graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub reference: String,
    pub kind: NodeKind,
    /// Preceding question/answer pairs, empty for entry nodes
    pub predecessors: Vec<Predecessor>,
}

impl Node {
    pub fn class(&self) -> NodeClass {
        self.kind.class()
    }

    pub fn is_question(&self) -> bool {
        matches!(self.kind, NodeKind::Question { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::QuestionSequence { .. })
    }

    /// Question or question sequence: nodes drawn as answer tables.
    pub fn has_answers(&self) -> bool {
        self.is_question() || self.is_sequence()
    }

    pub fn category(&self) -> Option<&Category> {
        match &self.kind {
            NodeKind::Question { category, .. } | NodeKind::QuestionSequence { category, .. } => {
                Some(category)
            }
            _ => None,
        }
    }

    pub fn is_post_diagnostic(&self) -> bool {
        self.category().is_some_and(Category::is_post_diagnostic)
    }

    pub fn answers(&self) -> &[Answer] {
        match &self.kind {
            NodeKind::Question { answers, .. } | NodeKind::QuestionSequence { answers, .. } => {
                answers
            }
            _ => &[],
        }
    }

    pub fn score(&self) -> Option<i64> {
        match &self.kind {
            NodeKind::Question { score, .. } | NodeKind::QuestionSequence { score, .. } => *score,
            _ => None,
        }
    }

    /// Ordered members for main diagnoses and question sequences.
    pub fn sequence(&self) -> Option<&[Index]> {
        match &self.kind {
            NodeKind::MainDiagnosis { sequence, .. }
            | NodeKind::QuestionSequence { sequence, .. } => Some(sequence),
            _ => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match &self.kind {
            NodeKind::FinalDiagnosis { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}

/// Generic metadata fields of an algorithm export, in `info.txt` order.
pub const INFO_KEYS: [&str; 8] = [
    "id",
    "algorithm_id",
    "name",
    "version",
    "version_id",
    "author",
    "created_at",
    "updated_at",
];

/// Metadata of a loaded algorithm, as `(key, value)` pairs in `INFO_KEYS` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlgorithmInfo {
    pub fields: Vec<(String, String)>,
}

impl AlgorithmInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as `key: value` lines.
    pub fn to_text(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_category_strings_when_parsing_then_maps_to_variants() {
        assert_eq!(
            Category::parse(Some("management")),
            Category::Management
        );
        assert_eq!(
            Category::parse(Some("treatment_question")),
            Category::TreatmentQuestion
        );
        assert_eq!(
            Category::parse(Some("background_calculation")),
            Category::BackgroundCalculation
        );
        assert_eq!(
            Category::parse(Some("symptom")),
            Category::Other("symptom".into())
        );
        assert_eq!(Category::parse(None), Category::Unspecified);
    }

    #[test]
    fn given_post_diagnostic_categories_when_checked_then_flagged() {
        assert!(Category::Management.is_post_diagnostic());
        assert!(Category::TreatmentQuestion.is_post_diagnostic());
        assert!(!Category::BackgroundCalculation.is_post_diagnostic());
        assert!(!Category::Other("symptom".into()).is_post_diagnostic());
    }

    #[test]
    fn given_unknown_severity_when_deserializing_then_falls_back_to_unknown() {
        let s: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(s, Severity::Unknown);
        let s: Severity = serde_json::from_str("\"severe\"").unwrap();
        assert_eq!(s, Severity::Severe);
    }
}
