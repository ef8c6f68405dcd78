//! Node style dispatch and color palette.
//!
//! `style_for` is the one place mapping a node class to its shape, fill role
//! and inclusion policy. Concrete colors come from a [`Palette`], which lives
//! in the settings and is handed to the renderer.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Category, Node, NodeKind, Severity};

/// Graphviz node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    DoubleOctagon,
    Octagon,
    Box,
    /// Borderless; the HTML table label draws the node
    Plain,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::DoubleOctagon => "doubleoctagon",
            Shape::Octagon => "octagon",
            Shape::Box => "box",
            Shape::Plain => "plain",
        }
    }
}

/// Semantic color slot, resolved through a [`Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Neutral,
    BackgroundCalculation,
    Answer,
    Sequence,
    SequenceAnswerTaken,
    MainDiagnosisRoot,
    MainDiagnosis,
    Question,
    AnswerTaken,
    BackgroundAnswerTaken,
    Severity(Severity),
    Edge,
}

/// Whether a node kind is subject to the post-diagnostic exclusion filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Always,
    /// Dropped in filtered views when the category is management or
    /// treatment_question
    DiagnosticOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
    pub shape: Shape,
    pub fill: ColorRole,
    /// Fill of answer cells on the path actually taken
    pub taken_fill: ColorRole,
    pub inclusion: Inclusion,
}

/// Style of a node, either as the diagram root or as an ordinary member.
pub fn style_for(node: &Node, is_root: bool) -> NodeStyle {
    let style = match &node.kind {
        NodeKind::ChiefComplaint => NodeStyle {
            shape: Shape::Box,
            fill: ColorRole::Neutral,
            taken_fill: ColorRole::Answer,
            inclusion: Inclusion::Always,
        },
        NodeKind::MainDiagnosis { .. } => NodeStyle {
            shape: Shape::Octagon,
            fill: ColorRole::MainDiagnosis,
            taken_fill: ColorRole::Answer,
            inclusion: Inclusion::Always,
        },
        NodeKind::FinalDiagnosis { severity, .. } => NodeStyle {
            shape: Shape::DoubleOctagon,
            fill: ColorRole::Severity(*severity),
            taken_fill: ColorRole::Answer,
            inclusion: Inclusion::Always,
        },
        NodeKind::Question { category, .. } => {
            let background = *category == Category::BackgroundCalculation;
            NodeStyle {
                shape: Shape::Plain,
                fill: if background {
                    ColorRole::BackgroundCalculation
                } else {
                    ColorRole::Question
                },
                taken_fill: if background {
                    ColorRole::BackgroundAnswerTaken
                } else {
                    ColorRole::AnswerTaken
                },
                inclusion: Inclusion::DiagnosticOnly,
            }
        }
        NodeKind::QuestionSequence { .. } => NodeStyle {
            shape: Shape::Plain,
            fill: ColorRole::Sequence,
            taken_fill: ColorRole::SequenceAnswerTaken,
            inclusion: Inclusion::DiagnosticOnly,
        },
    };
    if !is_root {
        return style;
    }

    let fill = match &node.kind {
        NodeKind::FinalDiagnosis { severity, .. } => ColorRole::Severity(*severity),
        NodeKind::MainDiagnosis { .. } => ColorRole::MainDiagnosisRoot,
        NodeKind::QuestionSequence { .. } => ColorRole::Sequence,
        _ => ColorRole::Neutral,
    };
    NodeStyle {
        shape: Shape::DoubleOctagon,
        fill,
        ..style
    }
}

/// True when the node is dropped from a filtered (short or focus) view.
pub fn is_excluded(node: &Node) -> bool {
    style_for(node, false).inclusion == Inclusion::DiagnosticOnly && node.is_post_diagnostic()
}

/// Concrete colors for every [`ColorRole`].
///
/// Values are anything Graphviz accepts: `#rrggbb` or a color name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub neutral: String,
    pub background_calculation: String,
    pub answer: String,
    pub sequence: String,
    pub sequence_answer_taken: String,
    pub main_diagnosis_root: String,
    pub main_diagnosis: String,
    pub question: String,
    pub answer_taken: String,
    pub background_answer_taken: String,
    pub mild: String,
    pub moderate: String,
    pub severe: String,
    pub unknown: String,
    pub edge: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            neutral: "#D3D3D3".into(),
            background_calculation: "#808080".into(),
            answer: "#FFFFFF".into(),
            sequence: "#40e0d0".into(),
            sequence_answer_taken: "#c9fffa".into(),
            main_diagnosis_root: "#FFC300".into(),
            main_diagnosis: "orange".into(),
            question: "#bcbd22".into(),
            answer_taken: "#dbdb8d".into(),
            background_answer_taken: "#D3D3D3".into(),
            mild: "#ccffcc".into(),
            moderate: "#ffff99".into(),
            severe: "#ff8080".into(),
            unknown: "#D3D3D3".into(),
            edge: "black".into(),
        }
    }
}

impl Palette {
    pub fn color(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::Neutral => &self.neutral,
            ColorRole::BackgroundCalculation => &self.background_calculation,
            ColorRole::Answer => &self.answer,
            ColorRole::Sequence => &self.sequence,
            ColorRole::SequenceAnswerTaken => &self.sequence_answer_taken,
            ColorRole::MainDiagnosisRoot => &self.main_diagnosis_root,
            ColorRole::MainDiagnosis => &self.main_diagnosis,
            ColorRole::Question => &self.question,
            ColorRole::AnswerTaken => &self.answer_taken,
            ColorRole::BackgroundAnswerTaken => &self.background_answer_taken,
            ColorRole::Severity(Severity::Mild) => &self.mild,
            ColorRole::Severity(Severity::Moderate) => &self.moderate,
            ColorRole::Severity(Severity::Severe) => &self.severe,
            ColorRole::Severity(Severity::Unknown) => &self.unknown,
            ColorRole::Edge => &self.edge,
        }
    }
}
