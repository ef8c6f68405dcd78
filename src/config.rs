//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/algotree/algotree.toml`
//! 3. Local config: `<project_dir>/.algotree.toml` (current directory by default)
//! 4. Environment variables: `ALGOTREE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Orientation, Palette, ViewMode};

/// Diagram output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Svg,
    /// Raw Graphviz source
    Dot,
    /// mxGraph XML for diagrams.net
    Drawio,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Dot => "dot",
            OutputFormat::Drawio => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Dot => "dot",
            OutputFormat::Drawio => "drawio",
        };
        write!(f, "{}", s)
    }
}

/// Label wrapping and file naming limits, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LabelConfig {
    /// Box and octagon labels
    pub wrap_width: usize,
    /// Answer cells of question tables
    pub answer_wrap_width: usize,
    /// Label part of diagram and export file names
    pub file_label_max: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            wrap_width: 20,
            answer_wrap_width: 20,
            file_label_max: 25,
        }
    }
}

/// Directory hierarchy export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// View mode of the rendered images copied into the hierarchy
    pub source_mode: ViewMode,
    /// chrono format of the `export_<date>` directory suffix
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source_mode: ViewMode::Full,
            date_format: "%d%b%y".into(),
        }
    }
}

/// Unified configuration for algotree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root of all rendered output
    pub output_dir: PathBuf,
    /// Graphviz layout binary
    pub dot_command: String,
    pub orientation: Orientation,
    /// Formats written per diagram
    pub formats: Vec<OutputFormat>,
    pub label: LabelConfig,
    pub export: ExportConfig,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("algotree_output"),
            dot_command: "dot".into(),
            orientation: Orientation::default(),
            formats: vec![OutputFormat::Png],
            label: LabelConfig::default(),
            export: ExportConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// Get the XDG config directory for algotree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "algotree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("algotree.toml"))
}

/// Get the path to the local config file of a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".algotree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `project_dir` holds the local `.algotree.toml`; the current directory
    /// is used when `None`.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let local_path = local_config_path(project_dir.unwrap_or_else(|| Path::new(".")));
        Self::load_from(global_config_path().as_deref(), Some(&local_path))
    }

    /// Load settings from explicit config file locations.
    ///
    /// Missing files are skipped; environment overrides always apply.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(true));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ALGOTREE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("formats")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();

        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        self.output_dir = PathBuf::from(expand(&self.output_dir.to_string_lossy()));
        self.dot_command = expand(&self.dot_command);
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# algotree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/algotree/algotree.toml
#   Local:  ./.algotree.toml
#   Env:    ALGOTREE_* environment variables, e.g. ALGOTREE_LABEL__WRAP_WIDTH=30

# Root of all rendered output
# output_dir = "algotree_output"

# Graphviz layout binary
# dot_command = "dot"

# top-to-bottom | left-to-right
# orientation = "top-to-bottom"

# Any of: png, svg, dot, drawio
# formats = ["png"]

[label]
# wrap_width = 20
# answer_wrap_width = 20
# file_label_max = 25

[export]
# Rendered images copied into the export hierarchy: short | full | focus
# source_mode = "full"
# date_format = "%d%b%y"

[palette]
# mild = "#ccffcc"
# moderate = "#ffff99"
# severe = "#ff8080"
# sequence = "#40e0d0"
# question = "#bcbd22"
"##
        .to_string()
    }
}

fn expand(s: &str) -> String {
    shellexpand::full(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(s).into_owned())
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
