//! Legacy Chaincode Wire Types
//!
//! Protobuf messages for the legacy (pre-lifecycle) install payload. A peer's
//! install API accepts a single encoded `ChaincodeDeploymentSpec` whose
//! `code_package` is a gzipped tar of the chaincode source.
//!
//! The messages are declared by hand with `prost` derives; field tags match
//! the peer's `chaincode.proto`.

use prost::Message;

/// Identifies a chaincode by name, version and source path.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeId {
    /// Import path (Go) or local path of the source
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub version: String,
}

/// Invocation arguments. Unused at install time but part of the schema.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
    #[prost(map = "string, bytes", tag = "2")]
    pub decorations: std::collections::HashMap<String, Vec<u8>>,
    #[prost(bool, tag = "3")]
    pub is_init: bool,
}

/// Chaincode specification: language, identity and input.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeSpec {
    #[prost(enumeration = "chaincode_spec::Type", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
}

pub mod chaincode_spec {
    /// Chaincode runtime language.
    ///
    /// `Car` is only ever produced by very old peers; it is accepted when
    /// decoding and never written.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Undefined = 0,
        Golang = 1,
        Node = 2,
        Car = 3,
        Java = 4,
    }
}

/// The full legacy install payload.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeDeploymentSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
    /// Gzipped tar of the chaincode source
    #[prost(bytes = "vec", tag = "3")]
    pub code_package: Vec<u8>,
}

/// Header-only view of [`ChaincodeDeploymentSpec`].
///
/// Decoding into this type skips the `code_package` field without copying it,
/// which makes reading the chaincode identity cheap for large packages.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeDeploymentSpecHeader {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

impl ChaincodeDeploymentSpec {
    /// Borrow the chaincode id, if the spec carries one.
    pub fn chaincode_id(&self) -> Option<&ChaincodeId> {
        self.chaincode_spec
            .as_ref()
            .and_then(|spec| spec.chaincode_id.as_ref())
    }
}

impl ChaincodeDeploymentSpecHeader {
    /// Borrow the chaincode id, if the spec carries one.
    pub fn chaincode_id(&self) -> Option<&ChaincodeId> {
        self.chaincode_spec
            .as_ref()
            .and_then(|spec| spec.chaincode_id.as_ref())
    }
}
