//! Secure socket abstraction over OpenSSL
//!
//! This crate exposes TLS-capable sockets through a uniform,
//! transport-agnostic handle model. A reusable [`Factory`] is configured
//! once for a server or client role; per-connection [`SecureSocket`]s are
//! created from it over transports the caller owns, driven through the
//! handshake, used for transfers, and closed.
//!
//! # Architecture
//!
//! 1. [`Factory`] holds the role-bound backend context (and, for servers,
//!    the loaded key/certificate pair)
//! 2. [`SecureSocket`] pairs a borrowed transport descriptor with an owned
//!    backend handshake handle and a connection-state flag
//! 3. Every failing backend call is captured into the socket's
//!    [`ErrorState`] at the failure site, so failures stay diagnosable
//!    without violating the backend's last-error contract
//!
//! The cryptographic protocol itself (record layer, cipher negotiation,
//! certificate verification) is owned by the backend engine. This layer
//! never closes the transport and never retries an operation internally;
//! blocking behavior is inherited from the transport descriptor's mode.
//!
//! # Examples
//!
//! ## Client
//!
//! ```no_run
//! use securesock::{Factory, SecureSocket};
//! use std::net::TcpStream;
//!
//! securesock::init();
//!
//! let factory = Factory::client()
//!     .servername("example.com")
//!     .build()
//!     .unwrap();
//!
//! let tcp = TcpStream::connect("example.com:443").unwrap();
//! let mut sock = SecureSocket::new(&tcp, &factory).unwrap();
//! sock.connect().unwrap();
//!
//! sock.send(b"ping").unwrap();
//! let mut buf = [0u8; 512];
//! let n = sock.recv(&mut buf).unwrap();
//! sock.close().unwrap();
//! # let _ = n;
//! ```
//!
//! ## Server
//!
//! ```no_run
//! use securesock::{Factory, SecureSocket};
//! use std::net::TcpListener;
//!
//! securesock::init();
//!
//! let factory = Factory::server()
//!     .key_file("server.key")
//!     .cert_file("server.pem")
//!     .build()
//!     .unwrap();
//!
//! let listener = TcpListener::bind("127.0.0.1:443").unwrap();
//! let (tcp, _) = listener.accept().unwrap();
//!
//! let mut sock = SecureSocket::new(&tcp, &factory).unwrap();
//! if sock.accept().is_err() {
//!     // The socket survives a failed handshake: the captured error can
//!     // be inspected and the handle released cleanly
//!     let code = sock.last_error().map(|e| e.code());
//!     sock.close().unwrap();
//!     # let _ = code;
//! }
//! ```

pub mod cert;
pub mod error;
pub mod factory;
pub mod info;
pub mod socket;
pub mod transport;

pub use cert::CertInfo;
pub use error::{Error, ErrorState, SslOp};
pub use factory::{ClientVerify, Factory, Role, TlsVersion};
pub use info::SessionInfo;
pub use socket::SecureSocket;
pub use transport::FdStream;

/// Result type for secure socket operations
pub type Result<T> = std::result::Result<T, Error>;

/// One-time process-wide backend initialization
///
/// Idempotent and safe to call from multiple threads; call before
/// constructing the first factory.
pub fn init() {
    openssl::init();
}
