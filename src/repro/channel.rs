//! Execution channels: where a unit is actually run against the target binary

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::env::{Device, Target};
use crate::repro::artifacts::ArtifactHandle;
use crate::repro::options::ExecutionOptions;

/// `ssh` reserves this exit status for its own connection errors
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// How the replayed process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Code(i32),
    Signal(i32),
}

impl ExitKind {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitKind::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitKind::Signal(signal);
            }
        }
        ExitKind::Code(-1)
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ExitKind::Code(0))
    }
}

impl std::fmt::Display for ExitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "exit code {code}"),
            ExitKind::Signal(signal) => write!(f, "signal {signal}"),
        }
    }
}

/// What the channel observed for one completed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit: ExitKind,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn new(exit: ExitKind) -> Self {
        Self {
            exit,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    fn from_output(output: std::process::Output) -> Self {
        Self {
            exit: ExitKind::from_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// The channel could not complete an attempt; says nothing about the target
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Binary not found: {0}")]
    BinaryNotFound(PathBuf),
    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: PathBuf, message: String },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to stage unit on device: {0}")]
    Staging(String),
}

impl ChannelError {
    fn spawn(program: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            ChannelError::BinaryNotFound(program.to_path_buf())
        } else {
            ChannelError::Spawn {
                program: program.to_path_buf(),
                message: err.to_string(),
            }
        }
    }
}

/// Runs a single unit against a fuzz target
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Short description for logs (e.g. "local /path/bin", "ssh 10.0.0.1")
    fn describe(&self) -> String;

    /// Replay `unit` once. Must not retry.
    async fn execute(
        &self,
        target: &Target,
        unit: &ArtifactHandle,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult, ChannelError>;
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// The child is killed if the returned future is dropped, so callers can bound it
/// with `tokio::time::timeout`.
async fn run_captured(mut cmd: Command, program: &Path) -> Result<ExecutionResult, ChannelError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .map_err(|e| ChannelError::spawn(program, e))?;
    Ok(ExecutionResult::from_output(output))
}

/// Replays units with a fuzzer binary on this machine
#[derive(Debug, Clone)]
pub struct LocalChannel {
    binary: PathBuf,
}

impl LocalChannel {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ExecutionChannel for LocalChannel {
    fn describe(&self) -> String {
        format!("local {}", self.binary.display())
    }

    async fn execute(
        &self,
        _target: &Target,
        unit: &ArtifactHandle,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult, ChannelError> {
        if !self.binary.exists() {
            return Err(ChannelError::BinaryNotFound(self.binary.clone()));
        }

        let unit_path = unit.path().to_string_lossy();
        let mut cmd = Command::new(&self.binary);
        cmd.args(options.command_args(&unit_path));

        tracing::debug!(binary = %self.binary.display(), unit = %unit, "Running unit locally");
        run_captured(cmd, &self.binary).await
    }
}

/// Replays units on a device: copies the unit with `scp`, then launches the
/// fuzzer component over `ssh`
#[derive(Debug, Clone)]
pub struct SshChannel {
    device: Device,
    ssh: PathBuf,
    scp: PathBuf,
}

impl SshChannel {
    pub fn new(device: Device, ssh: PathBuf, scp: PathBuf) -> Self {
        Self { device, ssh, scp }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Remote command line for replaying the unit found at `unit_arg` inside the component
    pub fn remote_command(
        &self,
        target: &Target,
        unit_arg: &str,
        options: &ExecutionOptions,
    ) -> Vec<String> {
        let mut command = vec!["run".to_string(), target.component_url()];
        command.extend(options.command_args(unit_arg));
        command.iter().map(|arg| shell_quote(arg)).collect()
    }

    async fn stage(&self, unit: &ArtifactHandle, remote_unit: &str) -> Result<(), ChannelError> {
        let mut cmd = Command::new(&self.scp);
        cmd.args(self.device.scp_options())
            .arg(unit.path())
            .arg(self.device.scp_destination(remote_unit));

        let result = run_captured(cmd, &self.scp).await?;
        if !result.exit.is_clean() {
            return Err(ChannelError::Staging(format!(
                "scp {}: {}",
                result.exit,
                result.stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionChannel for SshChannel {
    fn describe(&self) -> String {
        format!("ssh {}", self.device.addr())
    }

    async fn execute(
        &self,
        target: &Target,
        unit: &ArtifactHandle,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult, ChannelError> {
        let staged_unit = target.data_path(&unit.name());
        self.stage(unit, &staged_unit).await?;

        let mut cmd = Command::new(&self.ssh);
        cmd.args(self.device.ssh_options())
            .arg(self.device.addr())
            .args(self.remote_command(target, &target.component_data_path(&unit.name()), options));

        tracing::debug!(
            device = %self.device.addr(),
            unit = %unit,
            staged = %staged_unit,
            "Running unit on device"
        );

        let result = run_captured(cmd, &self.ssh).await?;
        if result.exit == ExitKind::Code(SSH_TRANSPORT_FAILURE) {
            return Err(ChannelError::Transport(result.stderr.trim().to_string()));
        }
        Ok(result)
    }
}

/// Quote `arg` for the remote shell that ssh hands the command line to
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:#%+,@".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
