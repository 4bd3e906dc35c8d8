// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the raw (`serde`) and validated shapes.
//! - [`loader`] reads TOML from disk.
//! - [`validate`] turns a `RawConfigFile` into a `ConfigFile`.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, RawConfigFile, RunnerSection, RunnerSettings, ToolCommand, ToolLaunch,
    ToolSection, default_argv,
};
pub use validate::INPUT_PLACEHOLDER;
