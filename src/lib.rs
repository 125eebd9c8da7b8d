//! Contract Pack - smart contract packaging for peer install
//!
//! Turns a directory of smart contract source into the archive a peer's
//! install API accepts, byte-for-byte reproducibly, and lists the contents
//! of existing packages.
//!
//! Two formats are produced:
//! - lifecycle: outer tar+gzip of `metadata.json` and a nested `code.tar.gz`
//! - legacy: protobuf `ChaincodeDeploymentSpec` embedding the code archive

pub mod archive;
pub mod collect;
pub mod config;
pub mod package;

pub use archive::{ArchiveEntry, ArchiveReader, CodecError};
pub use collect::{CollectError, Collector, GolangCollector, JavaCollector, NodeCollector};
pub use config::{ConfigError, EffectiveConfig, PackageFormat};
pub use package::{
    LegacyType, LifecycleMetadata, LifecyclePackage, NameAndVersion, OptionsError, PackageError,
    PackagingError, PackagingOptions, SmartContractPackage, SmartContractType,
};
