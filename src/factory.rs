//! Secure socket factories
//!
//! A [`Factory`] holds a role-bound backend context and produces
//! handshake-ready secure sockets. Server factories load a private key and
//! certificate at construction and verify the pair matches; client
//! factories need no credentials. Factories are immutable once built and
//! may be shared across threads; every socket created from one borrows it.

use crate::error::Error;
use crate::socket::SecureSocket;
use crate::Result;
use openssl::hash::MessageDigest;
use openssl::ssl::{
    SslContext, SslContextBuilder, SslContextRef, SslFiletype, SslMethod, SslVerifyMode,
    SslVersion,
};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Factory role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// TLS protocol version
///
/// Factories negotiate the highest mutually supported version by default;
/// a version is only pinned when the builder asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    fn to_backend_version(self) -> SslVersion {
        match self {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Version as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "TLSv1.0",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl FromStr for TlsVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(TlsVersion::Tls10),
            "TLSV1.1" | "TLS1.1" => Ok(TlsVersion::Tls11),
            "TLSV1.2" | "TLS1.2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" => Ok(TlsVersion::Tls13),
            _ => Err(Error::InvalidArgument(format!(
                "unknown TLS version: {}",
                s
            ))),
        }
    }
}

/// Client certificate verification mode (server-side)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientVerify {
    /// Don't request client certificates
    None,
    /// Request a client certificate but don't require it
    Optional,
    /// Require a client certificate
    Required,
}

/// Long-lived producer of handshake-ready secure sockets for one role
pub struct Factory {
    ctx: SslContext,
    role: Role,
    digest: Option<MessageDigest>,
    servername: Option<String>,
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("role", &self.role)
            .field("digest", &self.digest.map(|d| d.type_().as_raw()))
            .field("servername", &self.servername)
            .finish()
    }
}

impl Factory {
    /// Create a new client factory builder
    pub fn client() -> ClientFactoryBuilder {
        ClientFactoryBuilder::new()
    }

    /// Create a new server factory builder
    pub fn server() -> ServerFactoryBuilder {
        ServerFactoryBuilder::new()
    }

    /// Role this factory was built for
    pub fn role(&self) -> Role {
        self.role
    }

    /// Digest algorithm selected at construction, if one resolved
    pub fn digest(&self) -> Option<MessageDigest> {
        self.digest
    }

    pub(crate) fn context(&self) -> &SslContextRef {
        &self.ctx
    }

    pub(crate) fn servername(&self) -> Option<&str> {
        self.servername.as_deref()
    }

    /// Create a socket over `transport` and drive the client handshake
    ///
    /// Convenience for [`SecureSocket::new`] followed by
    /// [`SecureSocket::connect`]. Callers that need the captured error
    /// state of a failed handshake should use the two-step form instead.
    pub fn connect<'a, T: AsFd>(&'a self, transport: &'a T) -> Result<SecureSocket<'a>> {
        if self.role != Role::Client {
            return Err(Error::InvalidArgument(
                "cannot use a server factory for a client connection".to_string(),
            ));
        }

        let mut sock = SecureSocket::new(transport, self)?;
        sock.connect()?;
        Ok(sock)
    }

    /// Create a socket over an accepted `transport` and drive the server
    /// handshake
    pub fn accept<'a, T: AsFd>(&'a self, transport: &'a T) -> Result<SecureSocket<'a>> {
        if self.role != Role::Server {
            return Err(Error::InvalidArgument(
                "cannot use a client factory for a server accept".to_string(),
            ));
        }

        let mut sock = SecureSocket::new(transport, self)?;
        sock.accept()?;
        Ok(sock)
    }
}

/// Client factory builder
///
/// All knobs are optional; the default client negotiates freely and does
/// not verify the peer, matching the backend's defaults.
#[derive(Debug, Default)]
pub struct ClientFactoryBuilder {
    min_version: Option<TlsVersion>,
    max_version: Option<TlsVersion>,
    cipher_list: Option<String>,
    ciphersuites: Option<String>,
    verify_peer: bool,
    ca_file: Option<PathBuf>,
    servername: Option<String>,
    digest: Option<String>,
}

impl ClientFactoryBuilder {
    fn new() -> Self {
        ClientFactoryBuilder::default()
    }

    /// Pin the TLS version (both minimum and maximum)
    pub fn version(mut self, version: TlsVersion) -> Self {
        self.min_version = Some(version);
        self.max_version = Some(version);
        self
    }

    /// Restrict the negotiable TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        self.min_version = Some(min);
        self.max_version = Some(max);
        self
    }

    /// Set the cipher list (TLS 1.2 and below)
    pub fn cipher_list(mut self, ciphers: impl Into<String>) -> Self {
        self.cipher_list = Some(ciphers.into());
        self
    }

    /// Set the cipher suites (TLS 1.3)
    pub fn ciphersuites(mut self, ciphers: impl Into<String>) -> Self {
        self.ciphersuites = Some(ciphers.into());
        self
    }

    /// Enable peer certificate verification
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    /// Trust anchors for peer verification
    pub fn ca_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.ca_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// SNI servername sent during the handshake
    pub fn servername(mut self, name: impl Into<String>) -> Self {
        self.servername = Some(name.into());
        self
    }

    /// Digest algorithm name to resolve at build time
    ///
    /// A name the backend does not recognize leaves the digest unset
    /// rather than failing the build; check [`Factory::digest`] when a
    /// digest is required.
    pub fn digest(mut self, name: impl Into<String>) -> Self {
        self.digest = Some(name.into());
        self
    }

    /// Build the factory
    pub fn build(self) -> Result<Factory> {
        let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;

        apply_version_and_ciphers(
            &mut builder,
            self.min_version,
            self.max_version,
            self.cipher_list.as_deref(),
            self.ciphersuites.as_deref(),
        )?;

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        if let Some(ca) = &self.ca_file {
            builder.set_ca_file(ca)?;
        }

        let digest = resolve_digest(self.digest.as_deref());

        tracing::debug!(role = "client", "TLS factory constructed");

        Ok(Factory {
            ctx: builder.build(),
            role: Role::Client,
            digest,
            servername: self.servername,
        })
    }
}

/// Server factory builder
///
/// A private key file and a certificate file are both required; `build`
/// loads them and verifies the pair matches before the factory becomes
/// usable.
#[derive(Debug, Default)]
pub struct ServerFactoryBuilder {
    key_file: Option<PathBuf>,
    cert_file: Option<PathBuf>,
    min_version: Option<TlsVersion>,
    max_version: Option<TlsVersion>,
    cipher_list: Option<String>,
    ciphersuites: Option<String>,
    client_verify: Option<ClientVerify>,
    client_verify_ca: Option<PathBuf>,
    digest: Option<String>,
}

impl ServerFactoryBuilder {
    fn new() -> Self {
        ServerFactoryBuilder::default()
    }

    /// Private key file (PEM)
    pub fn key_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.key_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Certificate file (PEM)
    pub fn cert_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cert_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pin the TLS version (both minimum and maximum)
    pub fn version(mut self, version: TlsVersion) -> Self {
        self.min_version = Some(version);
        self.max_version = Some(version);
        self
    }

    /// Restrict the negotiable TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        self.min_version = Some(min);
        self.max_version = Some(max);
        self
    }

    /// Set the cipher list (TLS 1.2 and below)
    pub fn cipher_list(mut self, ciphers: impl Into<String>) -> Self {
        self.cipher_list = Some(ciphers.into());
        self
    }

    /// Set the cipher suites (TLS 1.3)
    pub fn ciphersuites(mut self, ciphers: impl Into<String>) -> Self {
        self.ciphersuites = Some(ciphers.into());
        self
    }

    /// Client certificate verification mode
    pub fn client_verify(mut self, mode: ClientVerify) -> Self {
        self.client_verify = Some(mode);
        self
    }

    /// CA file for client certificate verification
    pub fn client_verify_ca<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.client_verify_ca = Some(path.as_ref().to_path_buf());
        self
    }

    /// Digest algorithm name to resolve at build time
    ///
    /// Lenient: an unrecognized name leaves the digest unset.
    pub fn digest(mut self, name: impl Into<String>) -> Self {
        self.digest = Some(name.into());
        self
    }

    /// Build the factory, loading and cross-checking the credentials
    pub fn build(self) -> Result<Factory> {
        let (Some(key_file), Some(cert_file)) = (self.key_file, self.cert_file) else {
            return Err(Error::Credential(
                "server factory requires both a private key file and a certificate file"
                    .to_string(),
            ));
        };

        let mut builder = SslContextBuilder::new(SslMethod::tls_server())?;

        builder
            .set_private_key_file(&key_file, SslFiletype::PEM)
            .map_err(|e| {
                Error::Credential(format!(
                    "failed to load private key {}: {}",
                    key_file.display(),
                    e
                ))
            })?;

        builder
            .set_certificate_file(&cert_file, SslFiletype::PEM)
            .map_err(|e| {
                Error::Credential(format!(
                    "failed to load certificate {}: {}",
                    cert_file.display(),
                    e
                ))
            })?;

        builder.check_private_key().map_err(|e| {
            Error::Credential(format!("private key does not match certificate: {}", e))
        })?;

        apply_version_and_ciphers(
            &mut builder,
            self.min_version,
            self.max_version,
            self.cipher_list.as_deref(),
            self.ciphersuites.as_deref(),
        )?;

        if let Some(mode) = self.client_verify {
            let verify_mode = match mode {
                ClientVerify::None => SslVerifyMode::NONE,
                ClientVerify::Optional => SslVerifyMode::PEER,
                ClientVerify::Required => {
                    SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT
                }
            };
            builder.set_verify(verify_mode);
        }

        if let Some(ca) = &self.client_verify_ca {
            builder.set_ca_file(ca)?;
        }

        let digest = resolve_digest(self.digest.as_deref());

        tracing::debug!(role = "server", cert = %cert_file.display(), "TLS factory constructed");

        Ok(Factory {
            ctx: builder.build(),
            role: Role::Server,
            digest,
            servername: None,
        })
    }
}

fn apply_version_and_ciphers(
    builder: &mut SslContextBuilder,
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
    cipher_list: Option<&str>,
    ciphersuites: Option<&str>,
) -> Result<()> {
    if let Some(min) = min {
        builder.set_min_proto_version(Some(min.to_backend_version()))?;
    }
    if let Some(max) = max {
        builder.set_max_proto_version(Some(max.to_backend_version()))?;
    }
    if let Some(ciphers) = cipher_list {
        builder.set_cipher_list(ciphers)?;
    }
    if let Some(ciphers) = ciphersuites {
        builder.set_ciphersuites(ciphers)?;
    }
    Ok(())
}

fn resolve_digest(name: Option<&str>) -> Option<MessageDigest> {
    // Resolution failure deliberately leaves the digest unset
    name.and_then(MessageDigest::from_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_client_factory_builds_without_credentials() {
        let factory = Factory::client().build().unwrap();
        assert_eq!(factory.role(), Role::Client);
        assert!(factory.digest().is_none());
    }

    #[test]
    fn test_client_factory_with_version_range() {
        let factory = Factory::client()
            .version_range(TlsVersion::Tls12, TlsVersion::Tls13)
            .servername("example.com")
            .build()
            .unwrap();
        assert_eq!(factory.role(), Role::Client);
        assert_eq!(factory.servername(), Some("example.com"));
    }

    #[test]
    fn test_server_factory_requires_both_credentials() {
        let err = Factory::server().build().unwrap_err();
        assert!(matches!(err, Error::Credential(_)));

        let err = Factory::server().key_file("/no/such/key.pem").build().unwrap_err();
        assert!(matches!(err, Error::Credential(_)));

        let err = Factory::server().cert_file("/no/such/cert.pem").build().unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }

    #[test]
    fn test_server_factory_with_unreadable_files() {
        let err = Factory::server()
            .key_file("/no/such/key.pem")
            .cert_file("/no/such/cert.pem")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }

    #[test]
    fn test_digest_resolution_is_lenient() {
        let factory = Factory::client().digest("sha256").build().unwrap();
        assert!(factory.digest().is_some());

        let factory = Factory::client().digest("no-such-digest").build().unwrap();
        assert!(factory.digest().is_none());
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("TLSv1.2".parse::<TlsVersion>().unwrap(), TlsVersion::Tls12);
        assert_eq!("tls1.3".parse::<TlsVersion>().unwrap(), TlsVersion::Tls13);
        assert_eq!("TLS1".parse::<TlsVersion>().unwrap(), TlsVersion::Tls10);
        assert!("sslv2".parse::<TlsVersion>().is_err());
        assert_eq!(TlsVersion::Tls13.as_str(), "TLSv1.3");
    }

    #[test]
    fn test_wrong_role_is_rejected_before_any_handshake() {
        let (a, _b) = UnixStream::pair().unwrap();

        let client = Factory::client().build().unwrap();
        let err = client.accept(&a).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
