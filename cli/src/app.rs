use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Serialize;
use sshprobe_core::api::{
    AppConfig, AppContext, CandidateCommand, CatalogLookup, Category, ConnectionDescriptor,
    OsInfo, OsType, OutcomeStatus, RiskLevel, TaskDescription,
};
use sshprobe_plugins::PluginServicesFactory;

use crate::commands::cli::{Args, CatalogArgs, Commands, OutputFormat, RunArgs, ValidateArgs};
use crate::render;

pub const EXIT_OK: i32 = 0;
pub const EXIT_DEGRADED: i32 = 1;
pub const EXIT_NO_EVIDENCE: i32 = 2;
pub const EXIT_REJECTED: i32 = 3;

const EVENTS_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn run_app(args: Args, cfg: AppConfig) -> Result<i32> {
    match args.command {
        Commands::Run(run) => run_probe(run, cfg, args.format).await,
        Commands::Validate(v) => validate(v, cfg, args.format).await,
        Commands::Catalog(c) => catalog(c, args.format),
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}

fn connection(run: &RunArgs) -> ConnectionDescriptor {
    let base = match (&run.password, &run.key_file) {
        (Some(pw), _) => ConnectionDescriptor::with_password(&run.host, &run.username, pw),
        (None, Some(key)) => ConnectionDescriptor::with_key_file(&run.host, &run.username, key),
        (None, None) => {
            let mut c = ConnectionDescriptor::with_password(&run.host, &run.username, "");
            c.password = None;
            c
        }
    };
    base.port(run.port)
}

async fn run_probe(run: RunArgs, mut cfg: AppConfig, format: OutputFormat) -> Result<i32> {
    if let Some(n) = run.max_iterations {
        cfg.controller.max_iterations = n.max(1);
    }
    if let Some(k) = run.max_concurrency {
        cfg.executor.max_concurrency = k.max(1);
    }
    if run.feed_alternatives {
        cfg.controller.feed_alternatives = true;
    }

    let ctx = AppContext::new(cfg).await?;
    let services = ctx.build_services(&PluginServicesFactory)?;
    let events = ctx.events_out();

    let os_type: OsType = run.os.parse().unwrap_or(OsType::Unknown);
    let task = TaskDescription::new(
        run.task.clone(),
        OsInfo {
            os_type,
            version: run.os_version.clone(),
            shell: run.shell.clone(),
        },
    )
    .with_prior_commands(run.prior_commands.clone());
    let conn = connection(&run);

    let controller = ctx.controller(&services);
    tracing::info!(
        target: "sshprobe.cli",
        session_id = %controller.session_id(),
        host = %conn.host,
        os = %os_type,
        "starting investigation"
    );
    let outcome = controller.run(&task, &conn).await;

    drop(controller);
    drop(services);
    drop(ctx);
    if let Some(events) = events {
        if !events.finish(EVENTS_DRAIN_TIMEOUT).await {
            tracing::warn!(target: "sshprobe.cli", "events output did not drain before exit");
        }
    }

    emit(format, &outcome, || render::outcome_text(&outcome))?;
    Ok(match outcome.status {
        OutcomeStatus::EvidenceCollected => EXIT_OK,
        OutcomeStatus::NoEvidence => EXIT_NO_EVIDENCE,
        OutcomeStatus::Degraded => EXIT_DEGRADED,
    })
}

async fn validate(v: ValidateArgs, cfg: AppConfig, format: OutputFormat) -> Result<i32> {
    let category: Category = v
        .category
        .parse()
        .map_err(|name| anyhow!("unknown category `{name}`"))?;
    let risk: RiskLevel = v
        .risk
        .parse()
        .map_err(|name| anyhow!("unknown risk level `{name}`"))?;

    let ctx = AppContext::with_events_out(cfg, None);
    let services = ctx.build_services(&PluginServicesFactory)?;
    let gate = ctx.gate(services.scorer.clone(), "cli-validate");

    let candidate = CandidateCommand::new(v.command.clone(), "manual check", category, risk);
    let outcome = gate.validate(&candidate).await;
    emit(format, &outcome, || render::validation_text(&v.command, &outcome))?;
    Ok(if outcome.approved { EXIT_OK } else { EXIT_REJECTED })
}

fn catalog(c: CatalogArgs, format: OutputFormat) -> Result<i32> {
    let catalog = sshprobe_core::api::CommandCatalog::new();
    let os: OsType = c.os.parse().unwrap_or(OsType::Unknown);
    let rows: Vec<CandidateCommand> = match &c.category {
        Some(name) => match catalog.lookup(name, os) {
            CatalogLookup::Commands(rows) => rows,
            CatalogLookup::UnknownCategory(name) => {
                return Err(anyhow!(
                    "unknown category `{name}` (expected one of: system_info, memory, cpu, disk, network, processes)"
                ));
            }
        },
        None => Category::ALL
            .iter()
            .flat_map(|cat| catalog.catalog(*cat, os))
            .collect(),
    };
    emit(format, &rows, || render::catalog_text(&rows))?;
    Ok(EXIT_OK)
}
