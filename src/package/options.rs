//! Packaging options and their validation

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::collect::is_go_module;

/// Environment variable holding the default Go build path
pub const GOPATH_ENV: &str = "GOPATH";

const NAME_PATTERN: &str = r"^[A-Za-z0-9]+([-_][A-Za-z0-9]+)*$";
const VERSION_PATTERN: &str = r"^[A-Za-z0-9_.+-]+$";

static NAME_RE: OnceLock<Regex> = OnceLock::new();
static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("name pattern is valid"))
}

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version pattern is valid"))
}

/// Errors raised before any packaging I/O.
///
/// The messages are user-facing and stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("Missing options parameter")]
    MissingOptions,

    #[error("Missing option smartContractPath")]
    MissingPath,

    #[error("Missing option name")]
    MissingName,

    #[error("Missing option version")]
    MissingVersion,

    #[error("Invalid smart contract name '{0}'. Smart contract names must only consist of alphanumerics, '_', and '-'")]
    InvalidName(String),

    #[error("Invalid smart contract version '{0}'. Smart contract versions must only consist of alphanumerics, '_', '-', '+', and '.'")]
    InvalidVersion(String),

    #[error("Missing option smartContractType")]
    MissingType,

    #[error("option smartContractType must be set to one of: golang, node, or java")]
    UnknownType(String),

    #[error("option goLangPath was not set so tried to use environment variable GOPATH but this was not set either, one of these must be set")]
    MissingGoPath,
}

/// Smart contract language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmartContractType {
    Golang,
    Node,
    Java,
}

impl SmartContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Golang => "golang",
            Self::Node => "node",
            Self::Java => "java",
        }
    }
}

impl fmt::Display for SmartContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmartContractType {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "golang" => Ok(Self::Golang),
            "node" => Ok(Self::Node),
            "java" => Ok(Self::Java),
            _ => Err(OptionsError::UnknownType(s.to_string())),
        }
    }
}

/// Options for building a package.
///
/// Field names follow the keys callers already use; empty strings count as
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingOptions {
    /// Directory (or Go import path) of the contract source
    pub smart_contract_path: Option<PathBuf>,
    /// `golang`, `node` or `java`
    pub smart_contract_type: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    /// Lifecycle label; defaults to `<name>_<version>`
    pub label: Option<String>,
    /// Directory of `.json` metadata to package under `META-INF/`
    pub metadata_path: Option<PathBuf>,
    /// Go build path; falls back to `$GOPATH`
    pub golang_path: Option<PathBuf>,
}

impl PackagingOptions {
    pub fn new(smart_contract_path: impl Into<PathBuf>, smart_contract_type: impl Into<String>) -> Self {
        Self {
            smart_contract_path: Some(smart_contract_path.into()),
            smart_contract_type: Some(smart_contract_type.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    pub fn with_golang_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.golang_path = Some(path.into());
        self
    }

    fn is_unset(&self) -> bool {
        *self == Self::default()
    }

    /// Validate for the legacy format: name and version are required and
    /// must match the peer's naming rules.
    pub(crate) fn validate_legacy(&self, env: EnvLookup<'_>) -> Result<LegacyOptions, OptionsError> {
        let source_path = self.require_path()?;
        let name = non_empty(&self.name).ok_or(OptionsError::MissingName)?;
        let version = non_empty(&self.version).ok_or(OptionsError::MissingVersion)?;

        if !name_re().is_match(name) {
            return Err(OptionsError::InvalidName(name.to_string()));
        }
        if !version_re().is_match(version) {
            return Err(OptionsError::InvalidVersion(version.to_string()));
        }

        let source = self.validate_source(source_path, env)?;
        Ok(LegacyOptions {
            name: name.to_string(),
            version: version.to_string(),
            source,
        })
    }

    /// Validate for the lifecycle format: a free-form label, or name and
    /// version to derive one from.
    pub(crate) fn validate_lifecycle(
        &self,
        env: EnvLookup<'_>,
    ) -> Result<LifecycleOptions, OptionsError> {
        let source_path = self.require_path()?;
        let label = match non_empty(&self.label) {
            Some(label) => label.to_string(),
            None => {
                let name = non_empty(&self.name).ok_or(OptionsError::MissingName)?;
                let version = non_empty(&self.version).ok_or(OptionsError::MissingVersion)?;
                format!("{}_{}", name, version)
            }
        };

        let source = self.validate_source(source_path, env)?;
        Ok(LifecycleOptions { label, source })
    }

    fn require_path(&self) -> Result<&Path, OptionsError> {
        if self.is_unset() {
            return Err(OptionsError::MissingOptions);
        }
        self.smart_contract_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(OptionsError::MissingPath)
    }

    fn validate_source(
        &self,
        source_path: &Path,
        env: EnvLookup<'_>,
    ) -> Result<SourceOptions, OptionsError> {
        let contract_type: SmartContractType = non_empty(&self.smart_contract_type)
            .ok_or(OptionsError::MissingType)?
            .parse()?;

        let golang_path = self
            .golang_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty());

        let (build_path, is_module) = match contract_type {
            SmartContractType::Golang if is_go_module(source_path) => (golang_path, true),
            SmartContractType::Golang => {
                let build_path = golang_path
                    .or_else(|| gopath_from_env(env))
                    .ok_or(OptionsError::MissingGoPath)?;
                (Some(build_path), false)
            }
            _ => (None, false),
        };

        Ok(SourceOptions {
            source_path: source_path.to_path_buf(),
            contract_type,
            metadata_path: self
                .metadata_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            build_path,
            is_module,
        })
    }
}

/// Lookup for process environment variables.
///
/// Packaging only reads `GOPATH`; taking the lookup as a parameter keeps
/// that read in one place and lets callers substitute their own.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<OsString>;

/// Reads the real process environment
pub fn process_env(key: &str) -> Option<OsString> {
    std::env::var_os(key)
}

/// First entry of `$GOPATH`, which may hold a path list
fn gopath_from_env(env: EnvLookup<'_>) -> Option<PathBuf> {
    let value = env(GOPATH_ENV)?;
    std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Source-side options common to both formats, after validation
#[derive(Debug, Clone)]
pub(crate) struct SourceOptions {
    pub source_path: PathBuf,
    pub contract_type: SmartContractType,
    pub metadata_path: Option<PathBuf>,
    /// Build path used while collecting Go source
    pub build_path: Option<PathBuf>,
    pub is_module: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct LegacyOptions {
    pub name: String,
    pub version: String,
    pub source: SourceOptions,
}

#[derive(Debug, Clone)]
pub(crate) struct LifecycleOptions {
    pub label: String,
    pub source: SourceOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<OsString> {
        None
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("golang".parse::<SmartContractType>().unwrap(), SmartContractType::Golang);
        assert_eq!("Node".parse::<SmartContractType>().unwrap(), SmartContractType::Node);
        assert_eq!("java".parse::<SmartContractType>().unwrap(), SmartContractType::Java);
        assert_eq!(
            "banana".parse::<SmartContractType>().unwrap_err(),
            OptionsError::UnknownType("banana".to_string())
        );
    }

    #[test]
    fn test_name_rules() {
        assert!(name_re().is_match("fabcar"));
        assert!(name_re().is_match("my-contract_2"));
        assert!(!name_re().is_match("some@me"));
        assert!(!name_re().is_match("-leading"));
        assert!(!name_re().is_match("trailing_"));
        assert!(std::ptr::eq(name_re(), name_re()));
    }

    #[test]
    fn test_version_rules() {
        assert!(version_re().is_match("1.2.3"));
        assert!(version_re().is_match("1.0.0-rc.1+build_7"));
        assert!(!version_re().is_match("1.0 beta"));
        assert!(!version_re().is_match("v1/2"));
        assert!(std::ptr::eq(version_re(), version_re()));
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let options = PackagingOptions::new("/tmp/cc", "node")
            .with_name("")
            .with_version("1.0.0");
        assert_eq!(
            options.validate_legacy(&no_env).unwrap_err(),
            OptionsError::MissingName
        );
    }

    #[test]
    fn test_lifecycle_label_defaults() {
        let options = PackagingOptions::new("/tmp/cc", "node")
            .with_name("fabcar")
            .with_version("1.0.0");
        let validated = options.validate_lifecycle(&no_env).unwrap();
        assert_eq!(validated.label, "fabcar_1.0.0");

        let labelled = PackagingOptions::new("/tmp/cc", "java").with_label("anything goes@1");
        assert_eq!(
            labelled.validate_lifecycle(&no_env).unwrap().label,
            "anything goes@1"
        );
    }

    #[test]
    fn test_gopath_from_env_takes_first_entry() {
        let joined = std::env::join_paths(["/go/first", "/go/second"]).unwrap();
        let env = move |key: &str| (key == GOPATH_ENV).then(|| joined.clone());
        assert_eq!(gopath_from_env(&env), Some(PathBuf::from("/go/first")));
    }

    #[test]
    fn test_go_module_needs_no_build_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/cc").unwrap();

        let options = PackagingOptions::new(dir.path(), "golang")
            .with_name("cc")
            .with_version("1");
        let validated = options.validate_legacy(&no_env).unwrap();
        assert!(validated.source.is_module);
        assert!(validated.source.build_path.is_none());
    }
}
