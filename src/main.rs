use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fuzz_repro::cli::{self, Cli};
use fuzz_repro::repro::{
    self, Classifier, DirArtifactStore, ExecutionChannel, LocalChannel, ReproductionOrchestrator,
    ReproductionSummary, SshChannel,
};
use fuzz_repro::util::{self, Tool, ToolAvailability};
use fuzz_repro::{Config, Device, Host, Target};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    // Log to file (~/.fuzz-repro/logs/repro-units.log); stdout is for results
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    util::init_data_dir(cli.data_dir.clone());
    init_logging(cli.verbose)?;

    let mut config = Config::load();
    if let Some(root) = cli.output_root.clone() {
        config = config.with_output_root(root);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(addr) = cli.device.clone() {
        config = config.with_device_address(addr);
    }

    let host = Host::from_build(&cli.build_dir)?;
    let target = Target::from_args(&host, &cli.fuzzer)?;

    // Resolve before touching the device so reference errors come first
    let store = Arc::new(DirArtifactStore::new(config.output_root.clone()));
    let resolution = match repro::plan(&*store, &target, &cli.units) {
        Ok(resolution) => resolution,
        Err(summary) => return Ok(report(&summary, cli.verbose)),
    };

    let channel: Arc<dyn ExecutionChannel> = match &cli.local {
        Some(binary) => Arc::new(LocalChannel::new(binary.clone())),
        None => Arc::new(ssh_channel(&host, &config)?),
    };

    let options = cli::split_passthrough(&cli.passthrough).into_options(config.replay.timeout);
    let orchestrator = ReproductionOrchestrator::new(store, channel)
        .with_classifier(Classifier::new(&config.replay.sentinels));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let summary = orchestrator
        .replay(&target, resolution, &options, &cancel)
        .await;

    Ok(report(&summary, cli.verbose))
}

fn ssh_channel(host: &Host, config: &Config) -> Result<SshChannel> {
    let device = Device::from_host(host, &config.device)?;
    let tools = ToolAvailability::detect(&config.tool_paths);
    let missing = tools.missing_tools();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|t| t.binary_name()).collect();
        anyhow::bail!(
            "Device replay needs {}; install OpenSSH or set [tools] in {}",
            names.join(", "),
            util::config_path().display()
        );
    }
    let ssh = tools.get_path(Tool::Ssh).cloned().context("ssh not found")?;
    let scp = tools.get_path(Tool::Scp).cloned().context("scp not found")?;
    Ok(SshChannel::new(device, ssh, scp))
}

/// Print the summary and pick the exit code
fn report(summary: &ReproductionSummary, verbose: u8) -> ExitCode {
    print!("{}", cli::render_summary(summary, verbose > 0));
    if let Some(err) = summary.resolve_error() {
        eprintln!("{err}");
    } else if summary.nothing_to_run {
        eprintln!("No matching artifacts found.");
    }
    ExitCode::from(summary.exit_code())
}
