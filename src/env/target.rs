//! Fuzz target selection

use std::fmt;

use crate::env::error::EnvError;
use crate::env::host::{FuzzerSpec, Host};

/// Unique name of one fuzz target within a build, displayed as `package/fuzzer`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetIdentity {
    package: String,
    fuzzer: String,
}

impl TargetIdentity {
    pub fn new(package: impl Into<String>, fuzzer: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            fuzzer: fuzzer.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn fuzzer(&self) -> &str {
        &self.fuzzer
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.fuzzer)
    }
}

impl From<&FuzzerSpec> for TargetIdentity {
    fn from(spec: &FuzzerSpec) -> Self {
        Self::new(spec.package.clone(), spec.fuzzer.clone())
    }
}

/// A resolved fuzz target and where it lives on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    identity: TargetIdentity,
}

impl Target {
    pub fn new(identity: TargetIdentity) -> Self {
        Self { identity }
    }

    /// Pick the single fuzz target on `host` named by `name`.
    ///
    /// `package/fuzzer` matches exactly when possible. Otherwise each half of a
    /// `pkg/fuzz` name is a substring match against the package and fuzzer, and a
    /// bare name matches either.
    pub fn from_args(host: &Host, name: &str) -> Result<Self, EnvError> {
        let name = name.trim();

        if let Some(spec) = host.fuzzers().iter().find(|s| s.qualified_name() == name) {
            return Ok(Self::new(spec.into()));
        }

        let matches: Vec<&FuzzerSpec> = host
            .fuzzers()
            .iter()
            .filter(|spec| match name.split_once('/') {
                Some((pkg, fuzzer)) => spec.package.contains(pkg) && spec.fuzzer.contains(fuzzer),
                None => spec.package.contains(name) || spec.fuzzer.contains(name),
            })
            .collect();

        match matches.as_slice() {
            [] => Err(EnvError::UnknownTarget(name.to_string())),
            [spec] => Ok(Self::new((*spec).into())),
            many => Err(EnvError::AmbiguousTarget {
                name: name.to_string(),
                candidates: many.iter().map(|s| s.qualified_name()).collect(),
            }),
        }
    }

    pub fn identity(&self) -> &TargetIdentity {
        &self.identity
    }

    /// Component URL used to launch the fuzzer on the device
    pub fn component_url(&self) -> String {
        format!(
            "fuchsia-pkg://fuchsia.com/{}#meta/{}.cmx",
            self.identity.package, self.identity.fuzzer
        )
    }

    /// Absolute path of `relpath` inside the fuzzer's isolated data directory on the device
    pub fn data_path(&self, relpath: &str) -> String {
        format!(
            "/data/r/sys/fuchsia.com:{}:0#meta:{}.cmx/{}",
            self.identity.package,
            self.identity.fuzzer,
            relpath.trim_start_matches('/')
        )
    }

    /// Path of `relpath` as the running fuzzer component sees it; its isolated
    /// storage is mounted at `/data` in its own namespace
    pub fn component_data_path(&self, relpath: &str) -> String {
        format!("data/{}", relpath.trim_start_matches('/'))
    }
}
