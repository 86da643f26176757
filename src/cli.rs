//! Command-line surface of `repro-units`

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::repro::{ExecutionOptions, ReplayOutcome, ReproductionSummary, RunStatus};

#[derive(Debug, Parser)]
#[command(
    name = "repro-units",
    version,
    about = "Runs the named fuzzer on provided test units, or all current test units for the fuzzer.",
    after_help = "Arguments after `--` go to the fuzzer: `-name=value` tokens are libFuzzer \
                  options, other tokens are passed as-is, and anything after a second `--` is \
                  handed to the fuzzer's subprocess."
)]
pub struct Cli {
    /// Fuzzer to run, as `package/fuzzer` or an unambiguous part of it
    pub fuzzer: String,

    /// Test units to replay (path, file name or unique suffix); all stored units if omitted
    pub units: Vec<String>,

    /// Build output directory containing fuzzers.json
    #[arg(long, env = "FUZZ_REPRO_BUILD_DIR", default_value = ".")]
    pub build_dir: PathBuf,

    /// Device address (overrides config and the build directory)
    #[arg(long)]
    pub device: Option<String>,

    /// Replay with this fuzzer binary on the host instead of on a device
    #[arg(long, value_name = "BINARY")]
    pub local: Option<PathBuf>,

    /// Per-unit timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory holding <package>/<fuzzer>/ artifact directories
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Data directory for config and logs
    #[arg(long, env = "FUZZ_REPRO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Arguments passed through to the fuzzer
    #[arg(last = true, allow_hyphen_values = true)]
    pub passthrough: Vec<String>,
}

/// Pass-through tokens sorted into their option groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passthrough {
    pub engine_options: Vec<(String, String)>,
    pub engine_args: Vec<String>,
    pub subprocess_args: Vec<String>,
}

impl Passthrough {
    pub fn into_options(self, timeout: Duration) -> ExecutionOptions {
        ExecutionOptions::new()
            .with_engine_options(self.engine_options)
            .with_engine_args(self.engine_args)
            .with_subprocess_args(self.subprocess_args)
            .with_timeout(timeout)
    }
}

/// Split pass-through tokens: `-key=value` is an engine option, `--` starts the
/// subprocess arguments, anything else is an engine argument.
pub fn split_passthrough(tokens: &[String]) -> Passthrough {
    let mut parsed = Passthrough::default();
    let mut iter = tokens.iter();

    for token in iter.by_ref() {
        if token == "--" {
            break;
        }
        let option = token
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .and_then(|rest| rest.split_once('='))
            .filter(|(key, _)| !key.is_empty());
        match option {
            Some((key, value)) => parsed
                .engine_options
                .push((key.to_string(), value.to_string())),
            None => parsed.engine_args.push(token.clone()),
        }
    }

    parsed.subprocess_args = iter.cloned().collect();
    parsed
}

/// Human-readable report of a finished invocation
pub fn render_summary(summary: &ReproductionSummary, show_output: bool) -> String {
    let mut out = String::new();

    for reference in &summary.unresolved {
        let _ = writeln!(out, "No artifact matches '{reference}'.");
    }

    for report in &summary.reports {
        let _ = writeln!(out, "{}: {}", report.handle.name(), report.outcome);
        if show_output && report.outcome == ReplayOutcome::Reproduced {
            if let Some(output) = &report.output {
                for line in output.stderr.lines().chain(output.stdout.lines()) {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
    }

    if summary.attempted > 0 {
        let _ = writeln!(
            out,
            "{}: {} of {} unit(s) reproduced, {} not reproduced, {} execution error(s).",
            summary.target,
            summary.reproduced,
            summary.attempted,
            summary.not_reproduced,
            summary.execution_errors
        );
    }
    if summary.status == RunStatus::Cancelled {
        let _ = writeln!(out, "Interrupted; results above are partial.");
    }

    out
}
