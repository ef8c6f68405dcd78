//! Command dispatch: one handler per subcommand

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Generator};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::{
    analyse, class_counts, AlgorithmGraph, DomainError, NodeClass, NodeId, Orientation, ViewMode,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::util::path::display_path;

/// Load settings and apply global CLI overrides.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(None)?;
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }
    if cli.horizontal {
        settings.orientation = Orientation::LeftToRight;
    }
    Ok(settings)
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        if cli.info {
            return Ok(());
        }
        return Err(CliError::Usage(
            "no command given, see `algotree --help`".into(),
        ));
    };

    // completions and config need no algorithm
    match command {
        Commands::Completion { shell } => {
            print_completions(*shell, &mut Cli::command());
            return Ok(());
        }
        Commands::Config { command } => return cmd_config(cli, command),
        _ => {}
    }

    let container = ServiceContainer::new(load_settings(cli)?);
    execute_with(&container, command)
}

/// Run an algorithm command against an explicit container.
pub fn execute_with(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Info { file } => cmd_info(container, file),
        Commands::Tree { file } => cmd_tree(container, file),
        Commands::Analyse { file, sequence } => cmd_analyse(container, file, *sequence),
        Commands::Plot {
            file,
            class,
            mode,
            ids,
            formats,
        } => cmd_plot(container, file, (*class).into(), *mode, ids, formats),
        Commands::Export { file, mode, render } => cmd_export(container, file, *mode, *render),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not operate on an algorithm".into(),
        )),
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut clap::Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn load(container: &ServiceContainer, file: &Path) -> CliResult<AlgorithmGraph> {
    Ok(container.loader().load(file)?)
}

#[instrument(skip(container))]
fn cmd_info(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let graph = load(container, file)?;
    output::header("Algorithm");
    for (key, value) in &graph.info().fields {
        output::field(key, value);
    }

    output::header("Nodes");
    let counts = class_counts(&graph);
    for class in [
        NodeClass::ChiefComplaint,
        NodeClass::MainDiagnosis,
        NodeClass::FinalDiagnosis,
        NodeClass::Question,
        NodeClass::QuestionSequence,
    ] {
        output::field(class.name(), &counts.get(&class).copied().unwrap_or(0));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let graph = load(container, file)?;
    output::info(&container.export_service().hierarchy(&graph));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_analyse(container: &ServiceContainer, file: &Path, sequence: NodeId) -> CliResult<()> {
    let graph = load(container, file)?;
    let idx = graph
        .index_of(sequence)
        .ok_or(DomainError::NodeNotFound(sequence))?;
    let analysis = analyse(&graph, idx)?;

    output::header(&format!("Sequence {}", sequence));
    output::field(
        "predecessors",
        &analysis.predecessor_ids.iter().join(", "),
    );
    output::field("entry points", &analysis.entry_points.len());
    for entry in &analysis.entry_points {
        let node = graph.node(*entry);
        output::detail(&format!("{} {}. {}", node.id, node.reference, node.label));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_plot(
    container: &ServiceContainer,
    file: &Path,
    class: NodeClass,
    mode: ViewMode,
    ids: &[NodeId],
    formats: &[OutputFormat],
) -> CliResult<()> {
    let graph = load(container, file)?;
    let formats = if formats.is_empty() {
        container.settings.formats.clone()
    } else {
        formats.to_vec()
    };
    if formats.is_empty() {
        return Err(CliError::InvalidArgs("no output format selected".into()));
    }

    let written = container
        .export_service()
        .plot_class(&graph, class, mode, ids, &formats)?;
    for path in &written {
        output::success_detail(&display_path(path));
    }
    output::success(&format!("{} files written", written.len()));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(
    container: &ServiceContainer,
    file: &Path,
    mode: Option<ViewMode>,
    render: bool,
) -> CliResult<()> {
    let mut settings = (*container.settings).clone();
    if let Some(mode) = mode {
        settings.export.source_mode = mode;
    }
    let container =
        ServiceContainer::with_deps(settings, container.fs.clone(), container.cmd.clone());
    let graph = load(&container, file)?;
    let exporter = container.export_service();

    if render {
        let mode = container.settings.export.source_mode;
        debug!("cmd_export: rendering source images in {} mode", mode);
        for class in [NodeClass::MainDiagnosis, NodeClass::FinalDiagnosis] {
            exporter.plot_class(&graph, class, mode, &[], &[OutputFormat::Png])?;
        }
    }

    let dir = exporter.export_arborescence(&graph)?;
    output::action("Exported", &display_path(&dir));
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(Path::new("."))
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".into());
            output::field("global", &global);
            output::field("local", &local_config_path(Path::new(".")).display());
        }
    }
    Ok(())
}
