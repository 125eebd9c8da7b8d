//! Lifecycle (V2) packages
//!
//! `validate -> collect source -> inner archive -> metadata entry -> outer archive`
//!
//! The outer archive holds exactly `metadata.json` followed by
//! `code.tar.gz`. Peers identify an installed package by the SHA-256 of
//! these bytes, so creation must be byte-for-byte reproducible.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::metadata::{LifecycleMetadata, CODE_PACKAGE_FILE, METADATA_FILE};
use super::options::LifecycleOptions;
use super::{
    package_source, process_env, EnvLookup, PackageError, Packager, PackagingError,
    PackagingOptions, SmartContractType,
};
use crate::archive::{list_file_names, write_archive, ArchiveEntry, ArchiveReader};
use crate::collect::GolangCollector;

/// Upper bound on `metadata.json` when reading a package back
const MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// The lifecycle wire format
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LifecyclePackager;

impl LifecyclePackager {
    /// The `path` recorded in `metadata.json`.
    ///
    /// GOPATH-style Go contracts record their import path, which is the
    /// source path as given rather than the build path used to collect it.
    fn metadata_path(options: &LifecycleOptions) -> String {
        let source = &options.source;
        match source.contract_type {
            SmartContractType::Golang if !source.is_module => {
                source.source_path.to_string_lossy().replace('\\', "/")
            }
            _ => String::new(),
        }
    }
}

impl Packager for LifecyclePackager {
    type Options = LifecycleOptions;

    fn golang_collector(&self, build_path: Option<PathBuf>) -> GolangCollector {
        GolangCollector::lifecycle(build_path)
    }

    fn finalize(
        &self,
        options: &LifecycleOptions,
        code_package: Vec<u8>,
    ) -> Result<Vec<u8>, PackagingError> {
        let metadata = LifecycleMetadata {
            label: options.label.clone(),
            path: Self::metadata_path(options),
            contract_type: options.source.contract_type,
        };
        let metadata_entry = metadata.to_entry()?;

        Ok(write_archive(&[
            metadata_entry,
            ArchiveEntry::from_bytes(CODE_PACKAGE_FILE, code_package),
        ])?)
    }

    fn list_files(&self, package: &[u8]) -> Result<Vec<String>, PackagingError> {
        let mut reader = ArchiveReader::new(package);
        let mut names = Vec::new();

        for file in reader.files()? {
            let mut file = file?;
            if file.name() == CODE_PACKAGE_FILE {
                // The outer reader waits on this entry while the nested one runs
                names.extend(list_file_names(&mut file)?);
            } else {
                names.push(file.name().to_string());
            }
            file.drain()?;
        }

        Ok(names)
    }
}

/// A lifecycle install package: `metadata.json` plus a nested `code.tar.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePackage {
    bytes: Vec<u8>,
    metadata: LifecycleMetadata,
}

impl LifecyclePackage {
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
        let validated = options.validate_lifecycle(env)?;
        let bytes = package_source(&LifecyclePackager, &validated.source, &validated)
            .map_err(PackageError::Create)?;

        let metadata = LifecycleMetadata {
            path: LifecyclePackager::metadata_path(&validated),
            contract_type: validated.source.contract_type,
            label: validated.label,
        };
        let package = Self { bytes, metadata };

        tracing::info!(
            label = %package.metadata.label,
            contract_type = %package.metadata.contract_type,
            bytes = package.bytes.len(),
            package_id = %package.package_id(),
            "created lifecycle smart contract package"
        );
        Ok(package)
    }

    /// Load an existing package, reading its `metadata.json`
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackageError> {
        let metadata = read_metadata(&bytes).map_err(PackageError::Read)?;
        Ok(Self { bytes, metadata })
    }

    /// Names of the files in the package, with the contents of
    /// `code.tar.gz` listed in its place.
    ///
    /// Streams the held bytes afresh on every call.
    pub fn file_names(&self) -> Result<Vec<String>, PackageError> {
        LifecyclePackager
            .list_files(&self.bytes)
            .map_err(PackageError::FileNames)
    }

    pub fn metadata(&self) -> &LifecycleMetadata {
        &self.metadata
    }

    pub fn label(&self) -> &str {
        &self.metadata.label
    }

    /// Identifier a peer assigns on install: `<label>:<sha256 of package>`
    pub fn package_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{}:{}", self.metadata.label, hex::encode(hasher.finalize()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn read_metadata(package: &[u8]) -> Result<LifecycleMetadata, PackagingError> {
    let mut reader = ArchiveReader::new(package);
    for file in reader.files()? {
        let mut file = file?;
        if file.name() == METADATA_FILE {
            let content = file.read_content_limited(MAX_METADATA_SIZE)?;
            return Ok(LifecycleMetadata::from_json(&content)?);
        }
    }
    Err(PackagingError::MissingEntry(METADATA_FILE))
}
