//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each layer came from, and
//! turns it into packaging options.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::package::PackagingOptions;

/// Project config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "contract-pack.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Project,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Install format to produce or read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// Outer tar with `metadata.json` and `code.tar.gz`
    Lifecycle,
    /// Protobuf deployment spec
    Legacy,
}

impl FromStr for PackageFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifecycle" => Ok(Self::Lifecycle),
            "legacy" => Ok(Self::Legacy),
            other => Err(ConfigError::ValidationError(format!(
                "format must be one of: lifecycle, legacy (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective config from layers
    pub fn build(
        project_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: Project config
        if let Some(path) = project_config_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Project,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
            tracing::debug!(path = %path.display(), "loaded project config");
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        Self::validate_config(&merged)?;

        Ok(Self {
            config: merged,
            sources,
        })
    }

    /// The project config to use: an explicit path, else
    /// `contract-pack.toml` in `dir` if it exists.
    pub fn discover(explicit: Option<PathBuf>, dir: &Path) -> Option<PathBuf> {
        explicit.or_else(|| {
            let candidate = dir.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        if let Some(format) = config.get("format") {
            let format = format.as_str().ok_or_else(|| {
                ConfigError::ValidationError("format must be a string".to_string())
            })?;
            format.parse::<PackageFormat>()?;
        }

        if let Some(package) = config.get("package") {
            let table = package.as_object().ok_or_else(|| {
                ConfigError::ValidationError("package must be a table".to_string())
            })?;
            for (key, value) in table {
                if !value.is_string() {
                    return Err(ConfigError::ValidationError(format!(
                        "package.{} must be a string",
                        key
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn format(&self) -> Result<PackageFormat, ConfigError> {
        self.get_str("format").unwrap_or("lifecycle").parse()
    }

    /// Explicit output file, if configured
    pub fn output(&self) -> Option<PathBuf> {
        self.get_str("package.output").map(PathBuf::from)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(self.get_str("output_dir").unwrap_or("."))
    }

    /// Packaging options from the `[package]` table
    pub fn packaging_options(&self) -> PackagingOptions {
        let string = |key: &str| self.get_str(&format!("package.{}", key)).map(str::to_string);
        let path = |key: &str| string(key).map(PathBuf::from);

        PackagingOptions {
            smart_contract_path: path("path"),
            smart_contract_type: string("type"),
            name: string("name"),
            version: string("version"),
            label: string("label"),
            metadata_path: path("metadata_path"),
            golang_path: path("golang_path"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
