//! Shared utilities for integration tests: self-signed credential
//! generation and loopback listener setup.

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509, X509NameBuilder};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use tempfile::NamedTempFile;

/// Generate a self-signed credential pair and write it to disk.
///
/// Returns (certificate file, private key file); both stay on disk for as
/// long as the handles live.
pub fn cert_pair(cn: &str) -> (NamedTempFile, NamedTempFile) {
    let (cert, key) = self_signed(cn);
    let cert_file = write_pem(&cert.to_pem().unwrap());
    let key_file = write_pem(&key.private_key_to_pem_pkcs8().unwrap());
    (cert_file, key_file)
}

/// A private key unrelated to any generated certificate.
#[allow(dead_code)]
pub fn stray_key_file() -> NamedTempFile {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    write_pem(&key.private_key_to_pem_pkcs8().unwrap())
}

/// Loopback listener bound to an ephemeral port, with address reuse.
#[allow(dead_code)]
pub fn loopback_listener() -> (TcpListener, SocketAddr) {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
    socket.set_reuse_address(true).unwrap();
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    socket.bind(&bind_addr.into()).unwrap();
    socket.listen(8).unwrap();

    let listener: TcpListener = socket.into();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn self_signed(cn: &str) -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(159, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.set_pubkey(&key).unwrap();

    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

fn write_pem(pem: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(pem).unwrap();
    file.flush().unwrap();
    file
}
