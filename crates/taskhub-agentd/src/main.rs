//! taskhub agent.
//!
//! `taskhub-agentd hub` runs a hub that launches its tasks as worker processes of this same
//! binary; `taskhub-agentd task` is the worker side, serving one task over stdin/stdout.

mod behaviors;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use taskhub_core::{Hub, HubConfig, Launcher, LocalLauncher, Runner, RunnerConfig, run_to_completion};
use taskhub_exec::{ProcConfig, ProcessLauncher, serve_stdio};
use taskhub_model::{AutoLaunch, TaskSpec};
use taskhub_observe::{LoggerConfig, LoggerFormat, logger_init};

#[derive(Parser)]
#[command(name = "taskhub-agentd")]
#[command(version)]
#[command(about = "Hub and worker processes for message-driven tasks")]
struct Cli {
    /// Log filter directive (env-filter syntax).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// text | json | journald
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
    /// Append lifecycle and task-control records to this file (JSON lines).
    #[arg(long, global = true)]
    trace_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a hub until interrupted.
    Hub(HubArgs),
    /// Serve one task over stdin/stdout (started by the hub).
    Task(TaskArgs),
}

#[derive(Args)]
struct HubArgs {
    /// JSON hub configuration (`runner` timing and auto-launch `tasks`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extra auto-launch entry, `ID=KIND`. Repeatable.
    #[arg(long = "launch", value_name = "ID=KIND")]
    launch: Vec<String>,
    /// Override the pause between hub cycles.
    #[arg(long)]
    sleep_ms: Option<u64>,
    /// Pause between worker cycles.
    #[arg(long)]
    task_sleep_ms: Option<u64>,
    /// Run tasks in-process instead of in worker processes.
    #[arg(long)]
    local: bool,
}

#[derive(Args)]
struct TaskArgs {
    /// Override the pause between task cycles.
    #[arg(long)]
    sleep_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let code = match &cli.command {
        Command::Hub(args) => run_hub(&cli, args).await?,
        Command::Task(args) => run_task(&cli, args).await?,
    };
    // The worker's stdin reader may be parked on a blocking read; do not wait for it.
    std::process::exit(code)
}

fn logger_config(cli: &Cli, base: LoggerConfig) -> anyhow::Result<LoggerConfig> {
    let format: LoggerFormat = cli.log_format.parse()?;
    Ok(LoggerConfig {
        format,
        level: cli.log_level.clone(),
        trace_file: cli.trace_file.clone(),
        ..base
    })
}

fn load_hub_config(args: &HubArgs) -> anyhow::Result<HubConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => HubConfig::default(),
    };
    for entry in &args.launch {
        let (id, kind) = entry
            .split_once('=')
            .with_context(|| format!("--launch expects ID=KIND, got '{entry}'"))?;
        cfg.tasks.push(AutoLaunch::new(id, TaskSpec::new(kind)));
    }
    if let Some(ms) = args.sleep_ms {
        cfg.runner.sleep_ms = ms;
    }
    Ok(cfg)
}

fn worker_launcher(cli: &Cli, args: &HubArgs) -> anyhow::Result<Arc<dyn Launcher>> {
    let task_runner = RunnerConfig {
        sleep_ms: args.task_sleep_ms.unwrap_or(RunnerConfig::default().sleep_ms),
        ..RunnerConfig::default()
    };
    if args.local {
        let registry = Arc::new(behaviors::registry());
        return Ok(Arc::new(LocalLauncher::new(registry).with_runner(task_runner)));
    }

    let exe = std::env::current_exe().context("locating worker executable")?;
    let mut proc = ProcConfig::new(exe.to_string_lossy())
        .with_arg("--log-level")
        .with_arg(cli.log_level.clone())
        .with_arg("--log-format")
        .with_arg(cli.log_format.clone());
    if let Some(path) = &cli.trace_file {
        proc = proc.with_arg("--trace-file").with_arg(path.to_string_lossy());
    }
    proc = proc
        .with_arg("task")
        .with_arg("--sleep-ms")
        .with_arg(task_runner.sleep_ms.to_string());
    Ok(Arc::new(ProcessLauncher::new(proc)))
}

async fn run_hub(cli: &Cli, args: &HubArgs) -> anyhow::Result<i32> {
    logger_init(&logger_config(cli, LoggerConfig::default())?)?;

    let cfg = load_hub_config(args)?;
    let launcher = worker_launcher(cli, args)?;
    info!(tasks = cfg.tasks.len(), local = args.local, "starting hub");

    let mut hub = Hub::new(cfg, launcher);
    let stop = hub.stop_handle();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                info!("shutdown signal received; stopping hub");
                stop.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for shutdown signals"),
        }
    });

    let code = run_to_completion(&mut hub).await;
    info!(code, "hub finished");
    Ok(code)
}

async fn run_task(cli: &Cli, args: &TaskArgs) -> anyhow::Result<i32> {
    logger_init(&logger_config(cli, LoggerConfig::worker())?)?;

    let mut runner = RunnerConfig::default();
    if let Some(ms) = args.sleep_ms {
        runner.sleep_ms = ms;
    }
    let registry = behaviors::registry();
    match serve_stdio(&registry, &runner).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!(error = %e, "worker failed to start");
            Err(e.into())
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        async fn shutdown_signal() -> std::io::Result<()> {
            use tokio::signal::unix::{SignalKind, signal};

            let mut interrupt = signal(SignalKind::interrupt())?;
            let mut terminate = signal(SignalKind::terminate())?;
            let mut quit = signal(SignalKind::quit())?;
            tokio::select! {
                _ = interrupt.recv() => {}
                _ = terminate.recv() => {}
                _ = quit.recv() => {}
            }
            Ok(())
        }
    } else {
        async fn shutdown_signal() -> std::io::Result<()> {
            tokio::signal::ctrl_c().await
        }
    }
}
