//! Factory credential loading and validation tests
//!
//! Server factories must load a private key and certificate and verify the
//! pair matches before they become usable; client factories need no
//! credentials at all.

mod common;

use securesock::{Error, Factory, Role};
use std::io::Write;

#[test]
fn test_server_factory_with_matching_pair() {
    securesock::init();
    let (cert, key) = common::cert_pair("secure.test");

    let factory = Factory::server()
        .key_file(key.path())
        .cert_file(cert.path())
        .build()
        .unwrap();

    assert_eq!(factory.role(), Role::Server);
    assert!(factory.digest().is_none());
}

#[test]
fn test_server_factory_with_mismatched_key() {
    securesock::init();
    let (cert, _key) = common::cert_pair("secure.test");
    let stray_key = common::stray_key_file();

    let err = Factory::server()
        .key_file(stray_key.path())
        .cert_file(cert.path())
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::Credential(_)));
}

#[test]
fn test_server_factory_with_key_only() {
    securesock::init();
    let (_cert, key) = common::cert_pair("secure.test");

    let err = Factory::server().key_file(key.path()).build().unwrap_err();
    assert!(matches!(err, Error::Credential(_)));
}

#[test]
fn test_server_factory_with_unparseable_credentials() {
    securesock::init();
    let mut bogus = tempfile::NamedTempFile::new().unwrap();
    bogus.write_all(b"not a pem file").unwrap();
    bogus.flush().unwrap();

    let err = Factory::server()
        .key_file(bogus.path())
        .cert_file(bogus.path())
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::Credential(_)));
}

#[test]
fn test_server_factory_with_digest() {
    securesock::init();
    let (cert, key) = common::cert_pair("secure.test");

    let factory = Factory::server()
        .key_file(key.path())
        .cert_file(cert.path())
        .digest("sha256")
        .build()
        .unwrap();

    assert!(factory.digest().is_some());
}
