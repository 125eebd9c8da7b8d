//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. Project config (contract-pack.toml or --config)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, PackageFormat, DEFAULT_CONFIG_FILE,
};
pub use merge::{deep_merge, merge_layers};
