//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod assembler;
pub mod builder;
pub mod diagram;
pub mod document;
pub mod entities;
pub mod error;
pub mod label;
pub mod sequence;
pub mod style;

pub use arena::AlgorithmGraph;
pub use assembler::{TreeAssembler, ViewMode};
pub use builder::{class_counts, GraphBuilder, GraphResult};
pub use diagram::{
    AnswerCell, DiagramEdge, DiagramNode, DiagramTree, EdgeKey, EdgeKind, NodeKey, Orientation,
    Port,
};
pub use document::AlgorithmDocument;
pub use entities::*;
pub use error::DomainError;
pub use sequence::{analyse, SequenceAnalysis, SequenceAnalyzer};
pub use style::{is_excluded, style_for, ColorRole, Inclusion, NodeStyle, Palette, Shape};
