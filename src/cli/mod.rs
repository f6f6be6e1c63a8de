//! CLI module for junos-provider
//!
//! Argument parsing and subcommand dispatch for the `junos-provider` binary.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// junos-provider - manage Junos configuration as resources
///
/// Resource documents are read from JSON or YAML files; resulting state
/// documents are written to stdout and diagnostics to stderr.
#[derive(Parser, Debug, Clone)]
#[command(name = "junos-provider")]
#[command(author = "junos-provider Contributors")]
#[command(version)]
#[command(about = "Manage Junos configuration as Terraform-style resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "JUNOS_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Format of log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List resource types
    Resources,

    /// Show the schema of a resource type
    Schema(TypeArgs),

    /// Validate a resource document
    Validate(DocumentArgs),

    /// Show the set lines a document would load
    Plan(PlanArgs),

    /// Create a resource on the device
    Create(DocumentArgs),

    /// Refresh a resource state from the device
    Read(DocumentArgs),

    /// Update a resource from its state to a new document
    Update(UpdateArgs),

    /// Delete a resource from the device
    Delete(DocumentArgs),

    /// Import an existing resource by id
    Import(ImportArgs),
}

/// Arguments naming only a resource type
#[derive(Parser, Debug, Clone)]
pub struct TypeArgs {
    /// Resource type, e.g. junos_vlan
    #[arg(value_name = "TYPE")]
    pub resource_type: String,
}

/// Arguments for commands taking one document
#[derive(Parser, Debug, Clone)]
pub struct DocumentArgs {
    /// Resource type, e.g. junos_vlan
    #[arg(value_name = "TYPE")]
    pub resource_type: String,

    /// JSON or YAML document
    pub file: PathBuf,
}

/// Arguments for plan command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Resource type, e.g. junos_vlan
    #[arg(value_name = "TYPE")]
    pub resource_type: String,

    /// JSON or YAML document
    pub file: PathBuf,

    /// Current state document to diff against
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Arguments for update command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Resource type, e.g. junos_vlan
    #[arg(value_name = "TYPE")]
    pub resource_type: String,

    /// Current state document
    pub state: PathBuf,

    /// New resource document
    pub file: PathBuf,
}

/// Arguments for import command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Resource type, e.g. junos_vlan
    #[arg(value_name = "TYPE")]
    pub resource_type: String,

    /// Resource id
    pub id: String,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}
