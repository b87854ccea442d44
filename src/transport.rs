//! Borrowed-descriptor transport adapter
//!
//! The secure socket layer never owns the transport: it binds the backend
//! handshake handle to the native descriptor of a socket the caller opened
//! and will close. [`FdStream`] is that binding: a `Read`/`Write` view over
//! a [`BorrowedFd`] that performs raw descriptor I/O and leaves the
//! descriptor open when dropped. Blocking behavior is whatever mode the
//! caller left the descriptor in.

use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, BorrowedFd};

/// Non-owning byte stream over a raw transport descriptor
#[derive(Debug)]
pub struct FdStream<'fd> {
    fd: BorrowedFd<'fd>,
}

impl<'fd> FdStream<'fd> {
    /// Create a stream view over a borrowed descriptor
    pub fn new(fd: BorrowedFd<'fd>) -> Self {
        FdStream { fd }
    }

    /// The underlying raw descriptor
    pub fn as_raw_fd(&self) -> i32 {
        self.fd.as_raw_fd()
    }
}

impl Read for FdStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rv = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };

        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(rv as usize)
    }
}

impl Write for FdStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let rv = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
            )
        };

        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(rv as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Raw descriptors have no userspace buffer to flush
        Ok(())
    }
}
