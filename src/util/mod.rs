//! Utility modules

pub mod paths;
pub mod tools;

pub use paths::{config_path, data_dir, init_data_dir, log_file_path, logs_dir};
pub use tools::{Tool, ToolAvailability, ToolPaths, ToolStatus};
