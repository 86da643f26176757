//! Single-unit replay and outcome classification.

use std::time::Instant;

use regex::Regex;

use crate::config::DEFAULT_SENTINELS;
use crate::env::Target;
use crate::repro::artifacts::ArtifactHandle;
use crate::repro::channel::{ChannelError, ExecutionChannel, ExecutionResult};
use crate::repro::options::ExecutionOptions;
use crate::repro::summary::{CapturedOutput, ReplayOutcome, UnitReport};

/// Decides whether a completed replay reproduced a finding
#[derive(Debug, Clone)]
pub struct Classifier {
    sentinels: Vec<Regex>,
}

impl Classifier {
    /// Build from sentinel patterns; invalid patterns are logged and skipped
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let sentinels = patterns
            .iter()
            .filter_map(|p| match Regex::new(p.as_ref()) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern = p.as_ref(), error = %e, "Ignoring invalid sentinel");
                    None
                }
            })
            .collect();
        Self { sentinels }
    }

    pub fn has_sentinel(&self, text: &str) -> bool {
        self.sentinels.iter().any(|re| re.is_match(text))
    }

    /// Crash-class exits (any signal, any non-zero code) and sentinel output reproduce;
    /// a clean exit with quiet output does not.
    pub fn classify(&self, result: &ExecutionResult) -> ReplayOutcome {
        if !result.exit.is_clean()
            || self.has_sentinel(&result.stderr)
            || self.has_sentinel(&result.stdout)
        {
            ReplayOutcome::Reproduced
        } else {
            ReplayOutcome::NotReproduced
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINELS)
    }
}

/// Replays single units through an execution channel
pub struct ReplayRunner<'a> {
    channel: &'a dyn ExecutionChannel,
    classifier: &'a Classifier,
}

impl<'a> ReplayRunner<'a> {
    pub fn new(channel: &'a dyn ExecutionChannel, classifier: &'a Classifier) -> Self {
        Self {
            channel,
            classifier,
        }
    }

    /// Replay `handle` exactly once, bounded by the options' timeout
    pub async fn run(
        &self,
        target: &Target,
        handle: &ArtifactHandle,
        options: &ExecutionOptions,
    ) -> UnitReport {
        let started = Instant::now();
        let attempt = tokio::time::timeout(
            options.timeout(),
            self.channel.execute(target, handle, options),
        )
        .await
        .unwrap_or(Err(ChannelError::Timeout(options.timeout())));

        let report = match attempt {
            Ok(result) => UnitReport {
                handle: handle.clone(),
                outcome: self.classifier.classify(&result),
                output: Some(CapturedOutput {
                    exit: result.exit,
                    stdout: result.stdout,
                    stderr: result.stderr,
                }),
            },
            Err(err) => UnitReport {
                handle: handle.clone(),
                outcome: ReplayOutcome::ExecutionError(err.to_string()),
                output: None,
            },
        };

        tracing::info!(
            fuzzer = %target.identity(),
            unit = %handle,
            outcome = report.outcome.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Replayed unit"
        );
        if let ReplayOutcome::ExecutionError(detail) = &report.outcome {
            tracing::warn!(unit = %handle, channel = %self.channel.describe(), error = %detail, "Replay attempt failed");
        }

        report
    }
}
