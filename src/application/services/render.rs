//! Diagram rendering through the Graphviz layout binary
//!
//! DOT text is produced in-process; layout and rasterization are delegated to
//! `dot`. drawio documents are built from the `-Tjson0` layout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::application::dot::DotWriter;
use crate::application::drawio::{DrawioConverter, GraphLayout};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{OutputFormat, Settings};
use crate::domain::label::file_label;
use crate::domain::{DiagramTree, Node, ViewMode};
use crate::infrastructure::traits::{CommandRunner, FileSystem};
use crate::infrastructure::InfraError;

/// File stem of a diagram: `node{id:03}-{label}-{suffix}`.
pub fn diagram_stem(node: &Node, mode: ViewMode, label_max: usize) -> String {
    format!(
        "node{:03}-{}-{}",
        node.id,
        file_label(&node.label, label_max),
        mode.suffix(node.class())
    )
}

/// Writes diagrams in the configured output formats.
pub struct RenderService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl RenderService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// DOT source of a diagram.
    pub fn dot_source(&self, tree: &DiagramTree, name: &str) -> String {
        DotWriter::new(
            &self.settings.palette,
            &self.settings.label,
            self.settings.orientation,
        )
        .write(tree, name)
    }

    /// Render `tree` to `<stem>.<ext>` for every requested format.
    ///
    /// Returns the written paths in `formats` order.
    pub fn render(
        &self,
        tree: &DiagramTree,
        stem: &Path,
        formats: &[OutputFormat],
    ) -> ApplicationResult<Vec<PathBuf>> {
        debug!("render: stem={}, formats={:?}", stem.display(), formats);
        let name = stem
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dot = self.dot_source(tree, &name);
        self.fs
            .ensure_parent(stem)
            .with_path_context("create output directory", stem)?;

        // Keeps the temp source alive until every layout run is done.
        let mut scratch: Option<NamedTempFile> = None;
        let source = if formats.contains(&OutputFormat::Dot) {
            let path = with_extension(stem, OutputFormat::Dot);
            self.fs
                .write(&path, &dot)
                .with_path_context("write dot source", &path)?;
            path
        } else {
            let tmp = tempfile::Builder::new()
                .prefix("algotree-")
                .suffix(".dot")
                .tempfile()
                .with_path_context("create temp dot source", stem)?;
            let path = tmp.path().to_path_buf();
            self.fs
                .write(&path, &dot)
                .with_path_context("write dot source", &path)?;
            scratch = Some(tmp);
            path
        };

        let source_arg = source.to_string_lossy().into_owned();
        let mut written = Vec::with_capacity(formats.len());
        for &format in formats {
            let out = with_extension(stem, format);
            match format {
                OutputFormat::Dot => {}
                OutputFormat::Png | OutputFormat::Svg => {
                    let flag = format!("-T{}", format.extension());
                    let out_arg = out.to_string_lossy().into_owned();
                    self.layout(&[flag.as_str(), "-o", out_arg.as_str(), source_arg.as_str()])?;
                }
                OutputFormat::Drawio => {
                    let json = self.layout(&["-Tjson0", source_arg.as_str()])?;
                    let layout = GraphLayout::parse(&json)?;
                    let xml = DrawioConverter::new(&self.settings.palette)
                        .convert(tree, &layout, &name)?;
                    self.fs
                        .write(&out, &xml)
                        .with_path_context("write drawio document", &out)?;
                }
            }
            info!("Written {}", out.display());
            written.push(out);
        }
        drop(scratch);
        Ok(written)
    }

    /// Run the layout binary, returning its stdout.
    fn layout(&self, args: &[&str]) -> ApplicationResult<String> {
        let command = &self.settings.dot_command;
        debug!("layout: {} {}", command, args.join(" "));
        let output = self
            .cmd
            .run(command, args)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("run {}", command),
                source: Box::new(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApplicationError::OperationFailed {
                context: format!("{} {}: {}", command, args.join(" "), stderr.trim()),
                source: Box::new(InfraError::Render {
                    message: stderr.to_string(),
                    exit_code: output.status.code(),
                }),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn with_extension(stem: &Path, format: OutputFormat) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_stem_with_dots_when_adding_extension_then_appends() {
        let stem = Path::new("out/node001-a.b-full");
        assert_eq!(
            with_extension(stem, OutputFormat::Drawio),
            PathBuf::from("out/node001-a.b-full.xml")
        );
    }
}
