//! Synthetic package descriptors
//!
//! Lifecycle packages carry a small `metadata.json`; legacy packages wrap
//! the code archive in a protobuf deployment spec.

use contract_pack_proto::{chaincode_spec, ChaincodeDeploymentSpec, ChaincodeId, ChaincodeSpec};
use serde::{Deserialize, Serialize};

use super::SmartContractType;
use crate::archive::ArchiveEntry;

/// Name of the metadata entry in a lifecycle package
pub const METADATA_FILE: &str = "metadata.json";

/// Name of the nested code archive in a lifecycle package
pub const CODE_PACKAGE_FILE: &str = "code.tar.gz";

/// Contents of a lifecycle package's `metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleMetadata {
    pub label: String,
    pub path: String,
    #[serde(rename = "type")]
    pub contract_type: SmartContractType,
}

impl LifecycleMetadata {
    /// Canonical JSON bytes (sorted keys, no whitespace)
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json_canonicalizer::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The `metadata.json` archive entry
    pub fn to_entry(&self) -> Result<ArchiveEntry, serde_json::Error> {
        Ok(ArchiveEntry::from_bytes(METADATA_FILE, self.to_json()?))
    }
}

impl From<SmartContractType> for chaincode_spec::Type {
    fn from(value: SmartContractType) -> Self {
        match value {
            SmartContractType::Golang => Self::Golang,
            SmartContractType::Node => Self::Node,
            SmartContractType::Java => Self::Java,
        }
    }
}

/// Build the legacy deployment spec around an already-built code archive
pub fn deployment_spec(
    name: &str,
    version: &str,
    path: &str,
    contract_type: SmartContractType,
    code_package: Vec<u8>,
) -> ChaincodeDeploymentSpec {
    ChaincodeDeploymentSpec {
        chaincode_spec: Some(ChaincodeSpec {
            r#type: chaincode_spec::Type::from(contract_type) as i32,
            chaincode_id: Some(ChaincodeId {
                path: path.to_string(),
                name: name.to_string(),
                version: version.to_string(),
            }),
            input: None,
            timeout: 0,
        }),
        code_package,
    }
}
