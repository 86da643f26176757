//! Scripted execution channel for deterministic testing
//!
//! Implements `ExecutionChannel` without spawning any process. Each unit (matched
//! by file name) can be given its own behaviour; every call is captured for
//! later verification.
//!
//! # Example
//! ```no_run
//! use fuzz_repro::repro::mock::{MockBehavior, MockChannel};
//!
//! let channel = MockChannel::new()
//!     .with_unit("crash-a1", MockBehavior::exit(1))
//!     .with_unit("crash-a2", MockBehavior::exit(0));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::env::{Target, TargetIdentity};
use crate::repro::artifacts::ArtifactHandle;
use crate::repro::channel::{ChannelError, ExecutionChannel, ExecutionResult, ExitKind};
use crate::repro::options::ExecutionOptions;

/// What the mock does when asked to replay a unit
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Report a finished attempt
    Complete(ExecutionResult),
    /// Fail at the channel level
    Fail(ChannelError),
    /// Never finish (exercises timeouts)
    Hang,
}

impl MockBehavior {
    pub fn exit(code: i32) -> Self {
        MockBehavior::Complete(ExecutionResult::new(ExitKind::Code(code)))
    }
}

/// One captured `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub target: TargetIdentity,
    pub unit: ArtifactHandle,
    pub options: ExecutionOptions,
}

pub struct MockChannel {
    units: HashMap<String, MockBehavior>,
    default: MockBehavior,
    calls: Arc<Mutex<Vec<MockCall>>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannel {
    /// Units without a script exit cleanly
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            default: MockBehavior::exit(0),
            calls: Arc::new(Mutex::new(Vec::new())),
            cancel_after: None,
        }
    }

    /// Script the behaviour for the unit with file name `name`
    pub fn with_unit(mut self, name: impl Into<String>, behavior: MockBehavior) -> Self {
        self.units.insert(name.into(), behavior);
        self
    }

    /// Behaviour for units without their own script
    pub fn with_default(mut self, behavior: MockBehavior) -> Self {
        self.default = behavior;
        self
    }

    /// Cancel `token` once `calls` units have been executed
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// File names of executed units, in call order
    pub fn executed_units(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.unit.name()).collect()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl ExecutionChannel for MockChannel {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn execute(
        &self,
        target: &Target,
        unit: &ArtifactHandle,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult, ChannelError> {
        let count = {
            let mut calls = self.calls.lock();
            calls.push(MockCall {
                target: target.identity().clone(),
                unit: unit.clone(),
                options: options.clone(),
            });
            calls.len()
        };

        if let Some((after, token)) = &self.cancel_after {
            if count >= *after {
                token.cancel();
            }
        }

        let behavior = self
            .units
            .get(&unit.name())
            .unwrap_or(&self.default)
            .clone();

        match behavior {
            MockBehavior::Complete(result) => Ok(result),
            MockBehavior::Fail(err) => Err(err),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}
