//! Per-connection secure sockets
//!
//! A [`SecureSocket`] pairs one borrowed transport descriptor with one
//! owned backend handshake handle. It is created handshake-ready, driven
//! through `connect` or `accept`, used for transfers, and closed. Every
//! failing backend call is captured into the socket's error state at the
//! failure site; callers get a coarse status and query the classified code
//! through [`SecureSocket::last_error`].
//!
//! One thread drives a socket at a time (all operations take `&mut self`).
//! No operation retries internally except the single extra teardown
//! attempt in [`SecureSocket::close`]; would-block outcomes surface as
//! failures and the caller re-invokes.

use crate::error::{Error, ErrorState, SslOp};
use crate::factory::Factory;
use crate::info::SessionInfo;
use crate::transport::FdStream;
use crate::Result;
use openssl::ssl::{ShutdownResult, Ssl, SslStream};
use std::os::fd::AsFd;

/// One TLS connection over a borrowed transport descriptor
///
/// The socket owns its handshake handle and borrows both its factory and
/// the transport; closing the socket releases the handle but never the
/// transport. Dropping an unclosed socket releases the handle without
/// attempting TLS teardown.
#[derive(Debug)]
pub struct SecureSocket<'a> {
    factory: &'a Factory,
    stream: Option<SslStream<FdStream<'a>>>,
    connected: bool,
    last_error: Option<ErrorState>,
}

impl<'a> SecureSocket<'a> {
    /// Bind a fresh handshake handle from `factory` to the transport's
    /// native descriptor
    ///
    /// The socket is handshake-ready but not connected. The transport must
    /// already be open; its blocking mode is inherited by every operation
    /// on the socket.
    pub fn new<T: AsFd>(transport: &'a T, factory: &'a Factory) -> Result<Self> {
        let mut ssl = Ssl::new(factory.context()).map_err(|e| {
            Error::InvalidSocket(format!("failed to create handshake handle: {}", e))
        })?;

        if let Some(servername) = factory.servername() {
            ssl.set_hostname(servername)?;
        }

        let stream = FdStream::new(transport.as_fd());
        let stream = SslStream::new(ssl, stream).map_err(|e| {
            Error::InvalidSocket(format!("failed to bind transport descriptor: {}", e))
        })?;

        Ok(SecureSocket {
            factory,
            stream: Some(stream),
            connected: false,
            last_error: None,
        })
    }

    /// Perform the client-side handshake
    ///
    /// Single attempt: a would-block outcome on a non-blocking transport is
    /// reported as a negotiation failure with the would-block class
    /// captured; re-invoke to continue.
    pub fn connect(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(closed)?;

        match stream.connect() {
            Ok(()) => {
                self.connected = true;
                tracing::debug!(version = stream.ssl().version_str(), "TLS connect complete");
                Ok(())
            }
            Err(e) => {
                let detail = e.to_string();
                self.last_error = Some(ErrorState::new(SslOp::Connect, e));
                Err(Error::Negotiation(detail))
            }
        }
    }

    /// Perform the server-side handshake
    ///
    /// The socket must have been created from an already-accepted transport
    /// connection, with the same factory the listener uses. A failed
    /// handshake leaves the socket intact: its captured error can be
    /// queried and it can still be closed cleanly.
    pub fn accept(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(closed)?;

        match stream.accept() {
            Ok(()) => {
                self.connected = true;
                tracing::debug!(version = stream.ssl().version_str(), "TLS accept complete");
                Ok(())
            }
            Err(e) => {
                let detail = e.to_string();
                self.last_error = Some(ErrorState::new(SslOp::Accept, e));
                Err(Error::Negotiation(detail))
            }
        }
    }

    /// Send bytes, returning how many the backend actually accepted
    ///
    /// Single-attempt, potentially-partial transfer. Every non-positive
    /// backend outcome, would-block included, is captured and collapsed
    /// into [`Error::Transfer`]; inspect [`last_error`](Self::last_error)
    /// to tell them apart.
    pub fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(closed)?;

        if buf.is_empty() {
            return Ok(0);
        }

        match stream.ssl_write(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.last_error = Some(ErrorState::new(SslOp::Write, e));
                Err(Error::Transfer)
            }
        }
    }

    /// Receive bytes, returning how many arrived
    ///
    /// Single-attempt like [`send`](Self::send). The backend's clean-
    /// shutdown signal is also reported as [`Error::Transfer`], with
    /// `ZERO_RETURN` captured as the classified code.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(closed)?;

        if buf.is_empty() {
            return Ok(0);
        }

        match stream.ssl_read(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.last_error = Some(ErrorState::new(SslOp::Read, e));
                Err(Error::Transfer)
            }
        }
    }

    /// Release the handshake handle, tearing the session down first if the
    /// handshake ever completed
    ///
    /// Idempotent: closing an already-closed socket is a no-op success. An
    /// indeterminate first teardown result is retried exactly once; a
    /// teardown error is captured and reported as an invalid-socket error,
    /// and the handle is kept so a later close can retry.
    pub fn close(&mut self) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        if self.connected {
            // A first SSL_shutdown may only have sent our close_notify;
            // the second waits for the peer's
            let rv = match stream.shutdown() {
                Ok(ShutdownResult::Sent) => stream.shutdown(),
                other => other,
            };

            if let Err(e) = rv {
                self.last_error = Some(ErrorState::new(SslOp::Shutdown, e));
                return Err(Error::InvalidSocket("TLS shutdown failed".to_string()));
            }
        }

        self.stream = None;
        tracing::trace!("secure socket closed");
        Ok(())
    }

    /// Whether a connect or accept has succeeded on this socket
    ///
    /// False from creation until a successful handshake; never reset.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Most recently captured backend failure, if any
    ///
    /// Survives [`close`](Self::close), so a failed connection remains
    /// diagnosable after its handle is released.
    pub fn last_error(&self) -> Option<&ErrorState> {
        self.last_error.as_ref()
    }

    /// Factory this socket was created from
    pub fn factory(&self) -> &'a Factory {
        self.factory
    }

    /// Parameters negotiated by the handshake
    ///
    /// `None` until a handshake succeeds, and again after the handle is
    /// released by `close`.
    pub fn session_info(&self) -> Option<SessionInfo> {
        if !self.connected {
            return None;
        }
        let stream = self.stream.as_ref()?;
        Some(SessionInfo::from_ssl(stream.ssl()))
    }
}

fn closed() -> Error {
    Error::InvalidArgument("socket is closed".to_string())
}
