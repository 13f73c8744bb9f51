//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Guestlab -- remote guest test orchestration.
///
/// Use `guestlab <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "guestlab", version, about, long_about = None)]
pub struct Cli {
    /// Path to the guestlab.toml configuration file.
    #[arg(short, long, default_value = "guestlab.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test on the guest and wait for its completion marker.
    Run(RunArgs),

    /// Poll an already-running guest test for completion.
    Poll(PollArgs),

    /// Manage the guest VM lifecycle.
    Vm(VmArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run a guest test end to end: upload, launch, poll, collect.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Test name (used in reports and logs).
    pub name: String,

    /// Command to launch on the guest.
    pub command: String,

    /// Local script to upload to the guest home directory before launching.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Override guest host from config.
    #[arg(long)]
    pub host: Option<String>,

    /// Override guest SSH port from config.
    #[arg(long)]
    pub port: Option<u16>,

    /// Override guest SSH user from config.
    #[arg(long)]
    pub user: Option<String>,

    /// Override guest-side state file path.
    #[arg(long)]
    pub state_path: Option<String>,

    /// Guest-side summary log to collect after the run.
    #[arg(long)]
    pub log_path: Option<String>,

    /// Skip guest log collection entirely.
    #[arg(long)]
    pub no_log: bool,
}

// ---- poll ----

/// Poll a guest state file until a terminal marker or budget exhaustion.
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Guest-side state file path.
    #[arg(default_value = "state.txt")]
    pub state_path: String,

    /// Name used in reports and logs.
    #[arg(long, default_value = "ad-hoc")]
    pub name: String,

    /// Override guest host from config.
    #[arg(long)]
    pub host: Option<String>,

    /// Override guest SSH port from config.
    #[arg(long)]
    pub port: Option<u16>,

    /// Override guest SSH user from config.
    #[arg(long)]
    pub user: Option<String>,
}

// ---- vm ----

/// Manage the guest VM lifecycle via configured commands.
#[derive(Args, Debug)]
pub struct VmArgs {
    #[command(subcommand)]
    pub action: VmAction,
}

#[derive(Subcommand, Debug)]
pub enum VmAction {
    /// Provision a fresh guest VM and print its address.
    Provision,
    /// Tear the guest VM down.
    Teardown,
    /// Restart the guest VM and print its new address.
    Restart,
}

// ---- config ----

/// Manage guestlab configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, remote, poll, deploy).
        #[arg(long)]
        section: Option<String>,
    },
}
