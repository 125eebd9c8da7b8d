//! Smart contract packaging
//!
//! Two install formats are supported:
//! - legacy: a protobuf `ChaincodeDeploymentSpec` embedding a gzipped tar of
//!   the source ([`SmartContractPackage`])
//! - lifecycle: a gzipped tar holding `metadata.json` and a nested
//!   `code.tar.gz` ([`LifecyclePackage`])
//!
//! Both run the same pipeline: validate options, collect source with the
//! language's collector, write the code archive, then finalize it into the
//! format's wire shape.

mod legacy;
mod lifecycle;
mod metadata;
mod options;

pub use legacy::{LegacyType, NameAndVersion, SmartContractPackage};
pub use lifecycle::LifecyclePackage;
pub use metadata::{LifecycleMetadata, CODE_PACKAGE_FILE, METADATA_FILE};
pub use options::{
    process_env, EnvLookup, OptionsError, PackagingOptions, SmartContractType, GOPATH_ENV,
};

use std::path::PathBuf;

use crate::archive::{write_archive, CodecError};
use crate::collect::{
    collect_with_metadata, CollectError, Collector, GolangCollector, JavaCollector, NodeCollector,
};
use options::SourceOptions;

/// Failures after validation, while building or reading a package
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    #[error("Invalid metadata.json: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Package does not contain {0}")]
    MissingEntry(&'static str),

    #[error("Package has no chaincode id")]
    MissingChaincodeId,

    #[error("Unsupported chaincode type {0}")]
    UnsupportedType(i32),
}

/// The error callers see.
///
/// Validation errors pass through untouched; everything else is wrapped in
/// one message per operation, keeping the cause as the error source.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("Could not package smart contract, received error: {0}")]
    Create(#[source] PackagingError),

    #[error("Could not get file names for package, received error: {0}")]
    FileNames(#[source] PackagingError),

    #[error("Could not read package, received error: {0}")]
    Read(#[source] PackagingError),
}

/// One install wire format.
pub(crate) trait Packager {
    /// Validated options the format needs to finalize
    type Options;

    /// Go collector flavour for this format
    fn golang_collector(&self, build_path: Option<PathBuf>) -> GolangCollector;

    /// Wrap a finished code archive into the wire format
    fn finalize(&self, options: &Self::Options, code_package: Vec<u8>)
        -> Result<Vec<u8>, PackagingError>;

    /// Flat list of the source file names inside a package
    fn list_files(&self, package: &[u8]) -> Result<Vec<String>, PackagingError>;
}

/// Collect, archive and finalize `source` with `packager`
pub(crate) fn package_source<P: Packager>(
    packager: &P,
    source: &SourceOptions,
    options: &P::Options,
) -> Result<Vec<u8>, PackagingError> {
    let collector: Box<dyn Collector> = match source.contract_type {
        SmartContractType::Golang => Box::new(packager.golang_collector(source.build_path.clone())),
        SmartContractType::Node => Box::new(NodeCollector),
        SmartContractType::Java => Box::new(JavaCollector),
    };

    let entries = collect_with_metadata(
        collector.as_ref(),
        &source.source_path,
        source.metadata_path.as_deref(),
    )?;
    let code_package = write_archive(&entries)?;
    tracing::debug!(
        entries = entries.len(),
        bytes = code_package.len(),
        "wrote code package"
    );

    packager.finalize(options, code_package)
}
