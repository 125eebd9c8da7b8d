//! Legacy (V1) packages
//!
//! `validate -> collect source -> build deployment spec -> protobuf-encode`

use std::fmt;
use std::path::PathBuf;

use contract_pack_proto::{
    chaincode_spec, ChaincodeDeploymentSpec, ChaincodeDeploymentSpecHeader, ChaincodeId,
};
use prost::Message;
use serde::{Deserialize, Serialize};

use super::metadata::deployment_spec;
use super::options::LegacyOptions;
use super::{
    package_source, process_env, EnvLookup, PackageError, Packager, PackagingError,
    PackagingOptions, SmartContractType,
};
use crate::archive::list_file_names;
use crate::collect::GolangCollector;

/// Chaincode type recorded in a legacy package.
///
/// `Car` only appears in packages produced by very old tooling; it can be
/// read but never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyType {
    Golang,
    Node,
    Java,
    Car,
}

impl LegacyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Golang => "golang",
            Self::Node => "node",
            Self::Java => "java",
            Self::Car => "car",
        }
    }

    fn from_proto(value: i32) -> Option<Self> {
        match chaincode_spec::Type::try_from(value).ok()? {
            chaincode_spec::Type::Golang => Some(Self::Golang),
            chaincode_spec::Type::Node => Some(Self::Node),
            chaincode_spec::Type::Java => Some(Self::Java),
            chaincode_spec::Type::Car => Some(Self::Car),
            chaincode_spec::Type::Undefined => None,
        }
    }
}

impl From<SmartContractType> for LegacyType {
    fn from(value: SmartContractType) -> Self {
        match value {
            SmartContractType::Golang => Self::Golang,
            SmartContractType::Node => Self::Node,
            SmartContractType::Java => Self::Java,
        }
    }
}

impl fmt::Display for LegacyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and version read from a legacy package header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAndVersion {
    pub name: String,
    pub version: String,
}

/// The legacy wire format
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LegacyPackager;

impl Packager for LegacyPackager {
    type Options = LegacyOptions;

    fn golang_collector(&self, build_path: Option<PathBuf>) -> GolangCollector {
        GolangCollector::legacy(build_path)
    }

    fn finalize(
        &self,
        options: &LegacyOptions,
        code_package: Vec<u8>,
    ) -> Result<Vec<u8>, PackagingError> {
        let spec = deployment_spec(
            &options.name,
            &options.version,
            &options.source.source_path.to_string_lossy(),
            options.source.contract_type,
            code_package,
        );
        Ok(spec.encode_to_vec())
    }

    fn list_files(&self, package: &[u8]) -> Result<Vec<String>, PackagingError> {
        let spec = ChaincodeDeploymentSpec::decode(package)?;
        Ok(list_file_names(spec.code_package.as_slice())?)
    }
}

/// A legacy install package: an encoded `ChaincodeDeploymentSpec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartContractPackage {
    bytes: Vec<u8>,
    name: String,
    version: String,
    path: String,
    contract_type: LegacyType,
}

impl SmartContractPackage {
    /// Package a smart contract, reading `GOPATH` from the process
    /// environment when Go source needs it.
    pub fn create(options: &PackagingOptions) -> Result<Self, PackageError> {
        Self::create_with_env(options, &process_env)
    }

    /// Package a smart contract with an explicit environment lookup
    pub fn create_with_env(
        options: &PackagingOptions,
        env: EnvLookup<'_>,
    ) -> Result<Self, PackageError> {
        let validated = options.validate_legacy(env)?;
        let bytes = package_source(&LegacyPackager, &validated.source, &validated)
            .map_err(PackageError::Create)?;

        tracing::info!(
            name = %validated.name,
            version = %validated.version,
            contract_type = %validated.source.contract_type,
            bytes = bytes.len(),
            "created legacy smart contract package"
        );

        Ok(Self {
            bytes,
            path: validated.source.source_path.to_string_lossy().to_string(),
            contract_type: validated.source.contract_type.into(),
            name: validated.name,
            version: validated.version,
        })
    }

    /// Load an existing package, decoding only its header
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackageError> {
        let header = decode_header(&bytes).map_err(PackageError::Read)?;
        let spec = header.chaincode_spec.unwrap_or_default();
        let contract_type = LegacyType::from_proto(spec.r#type)
            .ok_or(PackagingError::UnsupportedType(spec.r#type))
            .map_err(PackageError::Read)?;
        let id = spec
            .chaincode_id
            .ok_or(PackagingError::MissingChaincodeId)
            .map_err(PackageError::Read)?;

        Ok(Self {
            bytes,
            name: id.name,
            version: id.version,
            path: id.path,
            contract_type,
        })
    }

    /// Read the name and version without touching the code archive
    pub fn extract_name_and_version(bytes: &[u8]) -> Result<NameAndVersion, PackageError> {
        let header = decode_header(bytes).map_err(PackageError::Read)?;
        let ChaincodeId { name, version, .. } = header
            .chaincode_id()
            .cloned()
            .ok_or(PackagingError::MissingChaincodeId)
            .map_err(PackageError::Read)?;
        Ok(NameAndVersion { name, version })
    }

    /// Names of the files in the code archive, in archive order.
    ///
    /// Decodes the held bytes afresh on every call.
    pub fn file_names(&self) -> Result<Vec<String>, PackageError> {
        LegacyPackager
            .list_files(&self.bytes)
            .map_err(PackageError::FileNames)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Source path recorded when the package was created
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contract_type(&self) -> LegacyType {
        self.contract_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn decode_header(bytes: &[u8]) -> Result<ChaincodeDeploymentSpecHeader, PackagingError> {
    Ok(ChaincodeDeploymentSpecHeader::decode(bytes)?)
}
