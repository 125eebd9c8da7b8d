//! Option validation tests
//!
//! Every rejection happens before any file is read, and the messages are
//! part of the public surface.

use std::ffi::OsString;

use contract_pack::{
    LifecyclePackage, OptionsError, PackageError, PackagingOptions, SmartContractPackage,
};

fn no_env(_: &str) -> Option<OsString> {
    None
}

fn legacy_error(options: &PackagingOptions) -> String {
    SmartContractPackage::create_with_env(options, &no_env)
        .unwrap_err()
        .to_string()
}

fn lifecycle_error(options: &PackagingOptions) -> String {
    LifecyclePackage::create_with_env(options, &no_env)
        .unwrap_err()
        .to_string()
}

fn valid() -> PackagingOptions {
    PackagingOptions::new("/nonexistent/cc", "node")
        .with_name("mycc")
        .with_version("1.0")
}

#[test]
fn test_missing_options() {
    let options = PackagingOptions::default();
    assert_eq!(legacy_error(&options), "Missing options parameter");
    assert_eq!(lifecycle_error(&options), "Missing options parameter");
}

#[test]
fn test_missing_path() {
    let mut options = valid();
    options.smart_contract_path = None;
    assert_eq!(legacy_error(&options), "Missing option smartContractPath");
    assert_eq!(lifecycle_error(&options), "Missing option smartContractPath");
}

#[test]
fn test_missing_name() {
    let mut options = valid();
    options.name = None;
    assert_eq!(legacy_error(&options), "Missing option name");

    // Lifecycle only needs a name to derive the label
    assert_eq!(lifecycle_error(&options), "Missing option name");
    options.label = Some("mylabel".to_string());
    assert!(!lifecycle_error(&options).starts_with("Missing option"));
}

#[test]
fn test_missing_version() {
    let mut options = valid();
    options.version = Some(String::new());
    assert_eq!(legacy_error(&options), "Missing option version");
    assert_eq!(lifecycle_error(&options), "Missing option version");
}

#[test]
fn test_invalid_name() {
    let options = valid().with_name("some@me");
    assert_eq!(
        legacy_error(&options),
        "Invalid smart contract name 'some@me'. Smart contract names must only consist of alphanumerics, '_', and '-'"
    );
}

#[test]
fn test_invalid_version() {
    let options = valid().with_version("1.0 beta");
    let err = SmartContractPackage::create_with_env(&options, &no_env).unwrap_err();
    assert!(matches!(
        err,
        PackageError::Options(OptionsError::InvalidVersion(ref v)) if v == "1.0 beta"
    ));
    assert!(err
        .to_string()
        .starts_with("Invalid smart contract version '1.0 beta'."));
}

#[test]
fn test_lifecycle_label_is_free_form() {
    // Characters rejected in legacy names are fine in a label
    let options = valid().with_label("some@me v1");
    let err = LifecyclePackage::create_with_env(&options, &no_env).unwrap_err();
    assert!(matches!(err, PackageError::Create(_)));
}

#[test]
fn test_missing_type() {
    let mut options = valid();
    options.smart_contract_type = None;
    assert_eq!(legacy_error(&options), "Missing option smartContractType");
    assert_eq!(lifecycle_error(&options), "Missing option smartContractType");
}

#[test]
fn test_unknown_type() {
    let mut options = valid();
    options.smart_contract_type = Some("banana".to_string());
    assert_eq!(
        legacy_error(&options),
        "option smartContractType must be set to one of: golang, node, or java"
    );
    assert_eq!(
        lifecycle_error(&options),
        "option smartContractType must be set to one of: golang, node, or java"
    );
}

#[test]
fn test_type_is_case_insensitive() {
    let mut options = valid();
    options.smart_contract_type = Some("NODE".to_string());
    // Passes validation and fails on the missing directory instead
    assert!(legacy_error(&options).starts_with("Could not package smart contract"));
}

#[test]
fn test_golang_without_gopath() {
    let mut options = valid();
    options.smart_contract_type = Some("golang".to_string());
    let expected = "option goLangPath was not set so tried to use environment variable GOPATH but this was not set either, one of these must be set";
    assert_eq!(legacy_error(&options), expected);
    assert_eq!(lifecycle_error(&options), expected);

    let empty = |_: &str| Some(OsString::new());
    let err = SmartContractPackage::create_with_env(&options, &empty).unwrap_err();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_name_checked_before_type() {
    let mut options = valid().with_name("bad name");
    options.smart_contract_type = Some("banana".to_string());
    assert!(legacy_error(&options).starts_with("Invalid smart contract name 'bad name'"));
}

#[test]
fn test_read_errors() {
    let err = SmartContractPackage::from_bytes(b"\xff\xff\xff".to_vec()).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Could not read package, received error: "));

    let err = SmartContractPackage::extract_name_and_version(b"\xff\xff\xff").unwrap_err();
    assert!(matches!(err, PackageError::Read(_)));

    let err = LifecyclePackage::from_bytes(b"not gzip".to_vec()).unwrap_err();
    assert!(matches!(err, PackageError::Read(_)));
}
