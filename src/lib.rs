//! Render clinical decision-support algorithms into diagrams and a diagnosis
//! directory hierarchy.
//!
//! Layers, inside out: [`domain`] (graph model, tree assembly, sequence
//! analysis), [`application`] (DOT and drawio emission, services),
//! [`infrastructure`] (I/O seams, wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
