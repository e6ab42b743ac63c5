//! Temporarily redirect this process's stdout or stderr into memory.
//!
//! This swaps the real file descriptor (1 or 2), so it sees everything
//! written to the stream: Rust output, C output, and children that inherit
//! the descriptor. That also makes it process-wide and non-reentrant: only
//! one capture per stream may be active, and nothing else may depend on the
//! stream's identity meanwhile. Meant for tests; the run policies never use it
//! (see [`Console`](crate::Console) for redirecting their output instead).

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::thread::{self, JoinHandle};

/// An active capture of stdout or stderr.
///
/// Released on drop if [`release`](Self::release) was not called.
pub struct Capture {
    fd: RawFd,
    saved: Option<OwnedFd>,
    reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

impl Capture {
    /// Buffers everything written to standard output.
    pub fn stdout() -> io::Result<Self> {
        let stdout = io::stdout();
        stdout.lock().flush()?;
        Self::begin(stdout.as_fd().try_clone_to_owned()?, libc::STDOUT_FILENO)
    }

    /// Buffers everything written to standard error.
    pub fn stderr() -> io::Result<Self> {
        Self::begin(io::stderr().as_fd().try_clone_to_owned()?, libc::STDERR_FILENO)
    }

    // `saved` is a close-on-exec duplicate of `fd`, restored on release.
    fn begin(saved: OwnedFd, fd: RawFd) -> io::Result<Self> {
        // Both ends are close-on-exec, so children only ever see the pipe
        // through the redirected stream.
        let (mut read_end, write_end) = io::pipe()?;
        cvt(unsafe { libc::dup2(write_end.as_raw_fd(), fd) })?;
        drop(write_end);

        // Drain concurrently so writers never block on a full pipe.
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            read_end.read_to_end(&mut buf)?;
            Ok(buf)
        });

        Ok(Self {
            fd,
            saved: Some(saved),
            reader: Some(reader),
        })
    }

    /// Restores the original stream. Calling it again does nothing.
    pub fn release(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };
        flush_std(self.fd);
        // Replacing the descriptor closes our last handle on the pipe's write
        // end, which lets the reader reach EOF.
        if let Err(e) = cvt(unsafe { libc::dup2(saved.as_raw_fd(), self.fd) }) {
            log::error!("failed to restore fd {}: {e}", self.fd);
        }
    }

    /// Whether the original stream is back in place.
    pub fn is_released(&self) -> bool {
        self.saved.is_none()
    }

    /// Releases the capture and returns everything written while it was
    /// active.
    ///
    /// Blocks until every writer has closed its end of the pipe, including
    /// child processes that inherited it.
    pub fn output(mut self) -> String {
        self.release();
        let bytes = match self.reader.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => bytes,
            Some(Ok(Err(e))) => {
                log::warn!("failed to read captured output: {e}");
                Vec::new()
            }
            Some(Err(_)) => {
                log::warn!("capture reader panicked");
                Vec::new()
            }
            None => Vec::new(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.release();
    }
}

fn flush_std(fd: RawFd) {
    let _ = match fd {
        libc::STDOUT_FILENO => io::stdout().flush(),
        libc::STDERR_FILENO => io::stderr().flush(),
        _ => Ok(()),
    };
}

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}
