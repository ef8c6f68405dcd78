//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner)
//! but are themselves concrete structs, not traits.

mod export;
mod loader;
mod render;

pub use export::ExportService;
pub use loader::AlgorithmLoader;
pub use render::{diagram_stem, RenderService};
