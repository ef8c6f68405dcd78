//! Algorithm document loading

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{AlgorithmDocument, AlgorithmGraph, GraphBuilder};
use crate::infrastructure::traits::FileSystem;

/// Reads an algorithm JSON export and resolves it into a graph.
pub struct AlgorithmLoader {
    fs: Arc<dyn FileSystem>,
}

impl AlgorithmLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn load(&self, path: &Path) -> ApplicationResult<AlgorithmGraph> {
        debug!("load: path={}", path.display());
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read algorithm", path)?;
        let graph = Self::parse(&content, path)?;
        info!("Loaded {} nodes from {}", graph.len(), path.display());
        Ok(graph)
    }

    /// Parse and resolve JSON text; `path` only labels errors.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<AlgorithmGraph> {
        let doc: AlgorithmDocument =
            serde_json::from_str(content).map_err(|e| ApplicationError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(GraphBuilder::new().build(&doc)?)
    }
}
