//! Clap derive structures for the `linkup` CLI.
//!
//! Also compiled by `build.rs` for man pages, so this module may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// linkup -- get onto a DJ Link network and find out why you can't
#[derive(Debug, Parser)]
#[command(
    name = "linkup",
    version,
    about = "Bring a DJ Link presence online and troubleshoot the network",
    long_about = "Searches the local network for CDJs and mixers, claims a player\n\
        number once they show up, and explains which interfaces to check\n\
        when nothing can be found.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "LINKUP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LINKUP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "LINKUP_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for devices and go online
    #[command(alias = "go")]
    Acquire(AcquireArgs),

    /// List the devices announcing themselves on the network
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Show the local network interfaces DJ Link traffic can use
    #[command(alias = "if")]
    Interfaces,

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Acquire ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AcquireArgs {
    /// Claim a real player number (1-4) instead of a virtual one
    #[arg(long, short = 'r')]
    pub real_player_number: bool,

    /// Player number to claim when not using a real one
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u8).range(1..=15))]
    pub player: Option<u8>,

    /// Exit as soon as the presence is online instead of holding it
    #[arg(long)]
    pub once: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Seconds to listen for announcements before listing
    #[arg(long, short = 'w', default_value = "3")]
    pub wait: u64,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
