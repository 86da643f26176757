mod settings;

pub use settings::{
    Config, DeviceConfig, ReplayConfig, DEFAULT_REPLAY_TIMEOUT, DEFAULT_SENTINELS,
    DEFAULT_SSH_PORT, EXAMPLE_CONFIG,
};
