//! Options forwarded to the fuzzer for every unit.

use std::time::Duration;

use crate::config::DEFAULT_REPLAY_TIMEOUT;

/// Everything passed through to the replay harness for one invocation.
///
/// The three argument groups land at different points of the command line
/// (engine flags, then engine positionals, then the unit, then `--` and the
/// subprocess arguments) and are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    engine_options: Vec<(String, String)>,
    engine_args: Vec<String>,
    subprocess_args: Vec<String>,
    timeout: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            engine_options: Vec::new(),
            engine_args: Vec::new(),
            subprocess_args: Vec::new(),
            timeout: DEFAULT_REPLAY_TIMEOUT,
        }
    }
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an engine option; a repeated key keeps its first position and takes the new value
    pub fn with_engine_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.engine_options.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.engine_options.push((key, value)),
        }
        self
    }

    pub fn with_engine_options<I, K, V>(self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        options
            .into_iter()
            .fold(self, |opts, (k, v)| opts.with_engine_option(k, v))
    }

    pub fn with_engine_args(mut self, args: Vec<String>) -> Self {
        self.engine_args = args;
        self
    }

    pub fn with_subprocess_args(mut self, args: Vec<String>) -> Self {
        self.subprocess_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine_options(&self) -> &[(String, String)] {
        &self.engine_options
    }

    pub fn engine_args(&self) -> &[String] {
        &self.engine_args
    }

    pub fn subprocess_args(&self) -> &[String] {
        &self.subprocess_args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Engine options rendered as libFuzzer flags (`-key=value`)
    pub fn engine_flags(&self) -> Vec<String> {
        self.engine_options
            .iter()
            .map(|(k, v)| format!("-{k}={v}"))
            .collect()
    }

    /// Full argument vector for replaying `unit`
    pub fn command_args(&self, unit: &str) -> Vec<String> {
        let mut args = self.engine_flags();
        args.extend(self.engine_args.iter().cloned());
        args.push(unit.to_string());
        if !self.subprocess_args.is_empty() {
            args.push("--".to_string());
            args.extend(self.subprocess_args.iter().cloned());
        }
        args
    }
}
