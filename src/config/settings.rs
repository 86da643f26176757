//! Configuration loaded from `config.toml` in the data directory
//!
//! Each TOML section is optional and merges over the built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::{config_path, default_output_root};
use crate::util::tools::ToolPaths;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Default bound on a single replay, including staging onto the device
pub const DEFAULT_REPLAY_TIMEOUT: Duration = Duration::from_secs(300);

/// Default SSH port for device connections
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Output fragments that mark a finding even when the target exits cleanly
pub const DEFAULT_SENTINELS: &[&str] = &[
    "==ERROR: ",
    "deadly signal",
    "SUMMARY: AddressSanitizer",
    "SUMMARY: UndefinedBehaviorSanitizer",
    "libFuzzer: out-of-memory",
    "ERROR: libFuzzer: timeout",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// How to reach the device
    pub device: DeviceConfig,
    /// Replay behaviour
    pub replay: ReplayConfig,
    /// Root directory holding `<package>/<fuzzer>/` artifact directories
    pub output_root: PathBuf,
    /// Configured paths for external tools (ssh, scp)
    pub tool_paths: ToolPaths,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Explicit device address; when unset the build directory is consulted
    pub address: Option<String>,
    pub port: u16,
    /// ssh_config file passed with `-F`
    pub ssh_config: Option<PathBuf>,
    /// Private key passed with `-i`
    pub identity: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: DEFAULT_SSH_PORT,
            ssh_config: None,
            identity: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub timeout: Duration,
    pub sentinels: Vec<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REPLAY_TIMEOUT,
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            replay: ReplayConfig::default(),
            output_root: default_output_root(),
            tool_paths: ToolPaths::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlDeviceConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub ssh_config: Option<PathBuf>,
    pub identity: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlReplayConfig {
    pub timeout_secs: Option<u64>,
    /// Replaces the default sentinel list when present
    pub sentinels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlArtifactsConfig {
    pub output_root: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub device: Option<TomlDeviceConfig>,
    pub replay: Option<TomlReplayConfig>,
    pub artifacts: Option<TomlArtifactsConfig>,
    pub tools: Option<ToolPaths>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific file; unreadable or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No config file, using defaults");
                return Config::default();
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Config::default()
            }
        }
    }

    /// Parse TOML contents and merge them over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Config::default();

        if let Some(device) = toml_config.device {
            if device.address.is_some() {
                config.device.address = device.address;
            }
            if let Some(port) = device.port {
                config.device.port = port;
            }
            if device.ssh_config.is_some() {
                config.device.ssh_config = device.ssh_config;
            }
            if device.identity.is_some() {
                config.device.identity = device.identity;
            }
        }

        if let Some(replay) = toml_config.replay {
            if let Some(secs) = replay.timeout_secs {
                config.replay.timeout = Duration::from_secs(secs);
            }
            if let Some(sentinels) = replay.sentinels {
                config.replay.sentinels = sentinels;
            }
        }

        if let Some(artifacts) = toml_config.artifacts {
            if let Some(root) = artifacts.output_root {
                config.output_root = root;
            }
        }

        if let Some(tools) = toml_config.tools {
            config.tool_paths = tools;
        }

        Ok(config)
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    pub fn with_output_root(mut self, root: PathBuf) -> Self {
        self.output_root = root;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.replay.timeout = timeout;
        self
    }

    pub fn with_device_address(mut self, address: impl Into<String>) -> Self {
        self.device.address = Some(address.into());
        self
    }
}
