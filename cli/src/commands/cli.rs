use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Gated read-only diagnostics on remote hosts over SSH")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./sshprobe.toml, then the user config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Investigate a goal on a remote host.
    Run(RunArgs),
    /// Check a single command against the security gate without running it.
    Validate(ValidateArgs),
    /// Print the vetted command catalog.
    Catalog(CatalogArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// What to find out, in plain words.
    pub task: String,

    #[arg(long)]
    pub host: String,

    #[arg(long, default_value_t = 22)]
    pub port: u16,

    #[arg(long = "user")]
    pub username: String,

    #[arg(long, env = "SSHPROBE_PASSWORD", hide_env_values = true, conflicts_with = "key_file")]
    pub password: Option<String>,

    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Target OS family: linux, windows or macos.
    #[arg(long, default_value = "linux")]
    pub os: String,

    #[arg(long, default_value = "")]
    pub os_version: String,

    #[arg(long, default_value = "bash")]
    pub shell: String,

    /// Commands already run for this goal; never proposed again.
    #[arg(long = "prior", action = clap::ArgAction::Append)]
    pub prior_commands: Vec<String>,

    #[arg(long)]
    pub max_iterations: Option<u32>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Offer gate-suggested alternatives to the next round.
    #[arg(long, default_value_t = false)]
    pub feed_alternatives: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    /// The command line to check.
    pub command: String,

    #[arg(long, default_value = "system_info")]
    pub category: String,

    /// Declared risk: safe, low, medium or high.
    #[arg(long, default_value = "medium")]
    pub risk: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long, default_value = "linux")]
    pub os: String,

    /// Limit to one category.
    #[arg(long)]
    pub category: Option<String>,
}
