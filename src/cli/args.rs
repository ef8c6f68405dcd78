//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::config::OutputFormat;
use crate::domain::{NodeClass, NodeId, ViewMode};

/// Render clinical decision algorithms into diagrams and diagnosis directory trees
#[derive(Parser, Debug)]
#[command(name = "algotree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Output directory (overrides config)
    #[arg(short, long, global = true, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Lay diagrams out left to right
    #[arg(long, global = true)]
    pub horizontal: bool,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show algorithm metadata and node counts
    Info {
        /// Algorithm JSON export
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show chief complaint hierarchy as tree
    Tree {
        /// Algorithm JSON export
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show predecessors and entry points of a question sequence
    Analyse {
        /// Algorithm JSON export
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Question sequence id
        sequence: NodeId,
    },

    /// Render diagrams for nodes of a class
    Plot {
        /// Algorithm JSON export
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node class to plot
        #[arg(short, long, value_enum)]
        class: ClassArg,
        /// View mode: short, full, focus
        #[arg(short, long, default_value = "short")]
        mode: ViewMode,
        /// Only these node ids (default: all of the class)
        #[arg(long = "id")]
        ids: Vec<NodeId>,
        /// Output formats (default: from config)
        #[arg(short, long = "format", value_enum)]
        formats: Vec<OutputFormat>,
    },

    /// Build the dated diagnosis directory hierarchy
    Export {
        /// Algorithm JSON export
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Mode of the rendered images to copy (default: from config)
        #[arg(short, long)]
        mode: Option<ViewMode>,
        /// Render the required diagrams before exporting
        #[arg(long)]
        render: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

/// Plottable node classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassArg {
    #[value(alias = "cc")]
    ChiefComplaint,
    #[value(alias = "md")]
    MainDiagnosis,
    #[value(alias = "fd")]
    FinalDiagnosis,
    #[value(alias = "qs")]
    QuestionSequence,
}

impl From<ClassArg> for NodeClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::ChiefComplaint => NodeClass::ChiefComplaint,
            ClassArg::MainDiagnosis => NodeClass::MainDiagnosis,
            ClassArg::FinalDiagnosis => NodeClass::FinalDiagnosis,
            ClassArg::QuestionSequence => NodeClass::QuestionSequence,
        }
    }
}
