use anyhow::Context;
use clap::Parser;

mod app;
mod commands;
mod logging;
mod render;

use commands::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let cfg = sshprobe_core::config::load(args.config.as_deref()).context("failed to load config")?;
    let log_guard = logging::init(&cfg.logging);

    let exit = app::run_app(args, cfg).await?;
    drop(log_guard);
    std::process::exit(exit);
}
