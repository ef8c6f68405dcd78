//! Batch plotting and the dated diagnosis directory hierarchy

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, info, instrument};

use crate::application::services::render::{diagram_stem, RenderService};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{OutputFormat, Settings};
use crate::domain::label::sanitize_label;
use crate::domain::{
    AlgorithmGraph, DomainError, Node, NodeClass, NodeId, TreeAssembler, ViewMode,
};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Drives per-node rendering and the export directory tree.
pub struct ExportService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    render: RenderService,
}

impl ExportService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        let render = RenderService::new(fs.clone(), cmd, settings.clone());
        Self {
            fs,
            settings,
            render,
        }
    }

    /// One diagram per root, written below `outdir`.
    ///
    /// Roots are processed in order; the first failure aborts the batch.
    pub fn plot_nodes(
        &self,
        graph: &AlgorithmGraph,
        roots: &[Index],
        mode: ViewMode,
        outdir: &Path,
        formats: &[OutputFormat],
    ) -> ApplicationResult<Vec<PathBuf>> {
        debug!(
            "plot_nodes: {} roots, mode={}, outdir={}",
            roots.len(),
            mode,
            outdir.display()
        );
        let assembler = TreeAssembler::new(graph).with_orientation(self.settings.orientation);
        let mut written = Vec::new();

        for &idx in roots {
            let node = graph.node(idx);
            let tree = assembler.assemble(node.id, mode)?;
            let stem = outdir.join(diagram_stem(node, mode, self.settings.label.file_label_max));
            debug!(
                "plot_nodes: node {} -> {} nodes, {} edges",
                node.id,
                tree.node_count(),
                tree.edge_count()
            );
            written.extend(self.render.render(&tree, &stem, formats)?);
        }

        info!("Plotted {} diagrams into {}", roots.len(), outdir.display());
        Ok(written)
    }

    /// Plot nodes of one class into `<output_dir>/<class dir>`.
    ///
    /// An empty `ids` selects every node of the class.
    pub fn plot_class(
        &self,
        graph: &AlgorithmGraph,
        class: NodeClass,
        mode: ViewMode,
        ids: &[NodeId],
        formats: &[OutputFormat],
    ) -> ApplicationResult<Vec<PathBuf>> {
        let roots = if ids.is_empty() {
            graph.nodes_of_class(class)
        } else {
            ids.iter()
                .map(|&id| {
                    graph
                        .index_of(id)
                        .filter(|&idx| graph.node(idx).class() == class)
                        .ok_or(DomainError::NodeNotFound(id))
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        let outdir = self.settings.output_dir.join(class.dir_name());
        self.plot_nodes(graph, &roots, mode, &outdir, formats)
    }

    /// Rendered PNG of a node, as written by [`plot_class`](Self::plot_class)
    /// in the configured export source mode.
    pub fn source_image(&self, node: &Node) -> PathBuf {
        let stem = diagram_stem(
            node,
            self.settings.export.source_mode,
            self.settings.label.file_label_max,
        );
        self.settings
            .output_dir
            .join(node.class().dir_name())
            .join(format!("{}.{}", stem, OutputFormat::Png.extension()))
    }

    /// Export directory for a given day.
    pub fn export_dir(&self, date: NaiveDate) -> PathBuf {
        let suffix = date.format(&self.settings.export.date_format);
        self.settings.output_dir.join(format!("export_{}", suffix))
    }

    /// Build today's export hierarchy from previously rendered images.
    pub fn export_arborescence(&self, graph: &AlgorithmGraph) -> ApplicationResult<PathBuf> {
        self.export_arborescence_on(graph, Local::now().date_naive())
    }

    #[instrument(level = "debug", skip(self, graph))]
    pub fn export_arborescence_on(
        &self,
        graph: &AlgorithmGraph,
        date: NaiveDate,
    ) -> ApplicationResult<PathBuf> {
        let export_dir = self.export_dir(date);
        if self.fs.is_dir(&export_dir) {
            self.fs
                .clear_dir(&export_dir)
                .with_path_context("clear export directory", &export_dir)?;
        } else {
            self.fs
                .create_dir_all(&export_dir)
                .with_path_context("create export directory", &export_dir)?;
        }

        let info_path = export_dir.join("info.txt");
        self.fs
            .write(&info_path, &graph.info().to_text())
            .with_path_context("write info", &info_path)?;

        for cc_idx in graph.nodes_of_class(NodeClass::ChiefComplaint) {
            let main_diagnoses = graph.main_diagnoses_of(cc_idx);
            if main_diagnoses.is_empty() {
                continue;
            }
            let cc = graph.node(cc_idx);
            let cc_dir = export_dir.join(entry_name(cc));
            debug!("export: {}", cc_dir.display());

            for md_idx in main_diagnoses {
                let md = graph.node(md_idx);
                let md_dir = cc_dir.join(entry_name(md));
                self.fs
                    .create_dir_all(&md_dir)
                    .with_path_context("create diagnosis directory", &md_dir)?;

                self.copy_image(md, &md_dir.join(image_name("D", md)))?;
                for fd_idx in graph.final_diagnoses_of(md_idx) {
                    let fd = graph.node(fd_idx);
                    self.copy_image(fd, &md_dir.join(image_name("FD", fd)))?;
                }
            }
        }

        let files = self
            .fs
            .list_files(&export_dir)
            .with_path_context("list export directory", &export_dir)?;
        info!(
            "Exported {} files to {}",
            files.len(),
            export_dir.display()
        );
        Ok(export_dir)
    }

    fn copy_image(&self, node: &Node, target: &Path) -> ApplicationResult<()> {
        let source = self.source_image(node);
        if !self.fs.is_file(&source) {
            return Err(ApplicationError::SourceImageMissing {
                node: node.id,
                path: source,
            });
        }
        self.fs
            .copy(&source, target)
            .with_path_context("copy image", &source)?;
        Ok(())
    }

    /// Chief complaint → main diagnosis → final diagnosis, for display.
    pub fn hierarchy(&self, graph: &AlgorithmGraph) -> Tree<String> {
        let name = graph.info().get("name").unwrap_or_default().to_string();
        let root = if name.is_empty() {
            "algorithm".to_string()
        } else {
            name
        };

        let complaints = graph
            .nodes_of_class(NodeClass::ChiefComplaint)
            .into_iter()
            .map(|cc_idx| {
                let diagnoses = graph
                    .main_diagnoses_of(cc_idx)
                    .into_iter()
                    .map(|md_idx| {
                        let finals = graph
                            .final_diagnoses_of(md_idx)
                            .into_iter()
                            .map(|fd_idx| Tree::new(tree_label(graph.node(fd_idx))));
                        Tree::new(tree_label(graph.node(md_idx))).with_leaves(finals)
                    });
                Tree::new(tree_label(graph.node(cc_idx))).with_leaves(diagnoses)
            });
        Tree::new(root).with_leaves(complaints)
    }
}

fn entry_name(node: &Node) -> String {
    format!("{:03}_{}", node.id, sanitize_label(&node.label))
}

fn image_name(prefix: &str, node: &Node) -> String {
    format!("{}{:03}_{}.png", prefix, node.id, sanitize_label(&node.label))
}

fn tree_label(node: &Node) -> String {
    match node.severity() {
        Some(severity) => format!("{} {} [{}]", node.id, node.label, severity),
        None => format!("{} {}", node.id, node.label),
    }
}
