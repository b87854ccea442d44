//! Error taxonomy and per-socket error capture
//!
//! Every failing backend call on a socket is captured into that socket's
//! [`ErrorState`] at the failure site, before the coarse [`Error`] is
//! returned to the caller. The openssl binding queries the backend's
//! classified error code inside the failing call itself, so capture and
//! failure are a single step and no other backend call can intervene.

use openssl::ssl::ErrorCode;
use std::fmt;

/// Secure socket errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("OpenSSL error: {0}")]
    Backend(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid socket: {0}")]
    InvalidSocket(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("TLS negotiation failed: {0}")]
    Negotiation(String),

    #[error("Transfer failed")]
    Transfer,
}

/// Backend operation that produced a captured error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslOp {
    Connect,
    Accept,
    Read,
    Write,
    Shutdown,
}

impl SslOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslOp::Connect => "connect",
            SslOp::Accept => "accept",
            SslOp::Read => "read",
            SslOp::Write => "write",
            SslOp::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SslOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent backend failure recorded for one socket
///
/// Owned by the socket that produced it and overwritten on every new
/// failure. The classified code is the backend's per-operation error class
/// (`SSL_get_error`), which distinguishes would-block, clean shutdown, and
/// protocol failure where the coarse [`Error`] deliberately does not.
#[derive(Debug)]
pub struct ErrorState {
    op: SslOp,
    error: openssl::ssl::Error,
}

impl ErrorState {
    pub(crate) fn new(op: SslOp, error: openssl::ssl::Error) -> Self {
        ErrorState { op, error }
    }

    /// Operation that failed
    pub fn op(&self) -> SslOp {
        self.op
    }

    /// Classified backend error code for the failed operation
    pub fn code(&self) -> ErrorCode {
        self.error.code()
    }

    /// Raw value of the classified code
    pub fn raw_code(&self) -> i32 {
        self.error.code().as_raw()
    }

    /// Full backend error, including any underlying I/O or stack detail
    pub fn backend_error(&self) -> &openssl::ssl::Error {
        &self.error
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op, self.error)
    }
}
