use std::fmt;
use std::io::{self, Result as IoResult, Write};
use std::process::Stdio;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Writer shared between a configuration and the thread pumping child output.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Memory-backed writer for capturing child output.
///
/// Clones share the same buffer, so one handle can be given to a command
/// while another is kept to read the collected bytes afterwards.
#[derive(Clone, Default)]
pub struct MemBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the bytes collected so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Collected bytes as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether both handles write into the same buffer.
    pub fn same_buffer(&self, other: &MemBuffer) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for MemBuffer {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl fmt::Debug for MemBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBuffer")
            .field("len", &self.lock().len())
            .finish()
    }
}

/// Destination for one output stream of a child process.
#[derive(Clone, Default)]
pub enum Sink {
    /// Discard everything.
    #[default]
    Null,
    /// This process's standard output.
    Stdout,
    /// This process's standard error.
    Stderr,
    /// In-memory buffer.
    Buffer(MemBuffer),
    /// Any writer, shared behind a mutex.
    Writer(SharedWriter),
    /// Every byte goes to each of the inner sinks, in order.
    Tee(Vec<Sink>),
}

impl Sink {
    /// Wrap an arbitrary writer.
    pub fn writer(w: impl Write + Send + 'static) -> Self {
        Sink::Writer(Arc::new(Mutex::new(w)))
    }

    /// A fresh buffer sink plus a handle to read it back.
    pub fn buffer() -> (Self, MemBuffer) {
        let buf = MemBuffer::new();
        (Sink::Buffer(buf.clone()), buf)
    }

    /// Send output to both `self` and `other`.
    pub fn tee(self, other: Sink) -> Self {
        match (self, other) {
            (Sink::Null, s) | (s, Sink::Null) => s,
            (Sink::Tee(mut a), b) => {
                a.push(b);
                Sink::Tee(a)
            }
            (a, b) => Sink::Tee(vec![a, b]),
        }
    }

    /// Whether the sink discards everything.
    pub fn is_null(&self) -> bool {
        matches!(self, Sink::Null)
    }

    /// Whether `self` and `other` write into the same buffer or writer.
    pub(crate) fn shares_target(&self, other: &Sink) -> bool {
        match (self, other) {
            (Sink::Buffer(a), Sink::Buffer(b)) => a.same_buffer(b),
            (Sink::Writer(a), Sink::Writer(b)) => ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }

    /// Convert this sink into a [`Stdio`] handle for `std::process::Command`.
    ///
    /// Sinks that are not backed by a file descriptor become pipes which the
    /// caller must drain.
    pub(crate) fn stdio(&self) -> Stdio {
        match self {
            Sink::Null => Stdio::null(),
            Sink::Stdout => {
                let mut out = io::stdout();
                let _ = out.flush();
                Stdio::from(out)
            }
            Sink::Stderr => Stdio::from(io::stderr()),
            Sink::Buffer(_) | Sink::Writer(_) | Sink::Tee(_) => Stdio::piped(),
        }
    }

    /// Write `data` to the sink and flush it.
    pub fn write_all(&self, data: &[u8]) -> IoResult<()> {
        match self {
            Sink::Null => Ok(()),
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(data)?;
                out.flush()
            }
            Sink::Stderr => io::stderr().lock().write_all(data),
            Sink::Buffer(buf) => buf.clone().write_all(data),
            Sink::Writer(w) => {
                let mut w = w.lock().unwrap_or_else(PoisonError::into_inner);
                w.write_all(data)?;
                w.flush()
            }
            Sink::Tee(sinks) => sinks.iter().try_for_each(|s| s.write_all(data)),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Null => f.write_str("Null"),
            Sink::Stdout => f.write_str("Stdout"),
            Sink::Stderr => f.write_str("Stderr"),
            Sink::Buffer(b) => f.debug_tuple("Buffer").field(b).finish(),
            Sink::Writer(_) => f.write_str("Writer(..)"),
            Sink::Tee(sinks) => f.debug_tuple("Tee").field(sinks).finish(),
        }
    }
}

/// The streams that stand for "the caller's stdout and stderr" when a run
/// policy decides to show or replay output.
///
/// Defaults to this process's real streams; tests and embedders can point it
/// anywhere without touching process-wide state.
#[derive(Debug, Clone)]
pub struct Console {
    pub stdout: Sink,
    pub stderr: Sink,
}

impl Console {
    /// Console backed by two fresh buffers, returned alongside for reading.
    pub fn buffered() -> (Self, MemBuffer, MemBuffer) {
        let (stdout, out) = Sink::buffer();
        let (stderr, err) = Sink::buffer();
        (Self { stdout, stderr }, out, err)
    }
}

impl Default for Console {
    fn default() -> Self {
        Self {
            stdout: Sink::Stdout,
            stderr: Sink::Stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_handles_share_contents() {
        let (sink, handle) = Sink::buffer();
        sink.write_all(b"abc").unwrap();
        sink.clone().write_all(b"def").unwrap();
        assert_eq!(handle.to_string_lossy(), "abcdef");
    }

    #[test]
    fn tee_writes_every_sink_in_order() {
        let (a, a_buf) = Sink::buffer();
        let (b, b_buf) = Sink::buffer();
        let (c, c_buf) = Sink::buffer();
        let tee = a.tee(b).tee(c);
        assert!(matches!(&tee, Sink::Tee(v) if v.len() == 3));

        tee.write_all(b"x").unwrap();
        assert_eq!(a_buf.contents(), b"x");
        assert_eq!(b_buf.contents(), b"x");
        assert_eq!(c_buf.contents(), b"x");
    }

    #[test]
    fn tee_with_null_collapses() {
        let (a, _) = Sink::buffer();
        assert!(matches!(a.clone().tee(Sink::Null), Sink::Buffer(_)));
        assert!(matches!(Sink::Null.tee(a), Sink::Buffer(_)));
    }

    #[test]
    fn shared_target_detection() {
        let (a, _) = Sink::buffer();
        let (b, _) = Sink::buffer();
        assert!(a.shares_target(&a.clone()));
        assert!(!a.shares_target(&b));
        assert!(!Sink::Stdout.shares_target(&Sink::Stdout));

        let w = Sink::writer(Vec::<u8>::new());
        assert!(w.shares_target(&w.clone()));
        assert!(!w.shares_target(&Sink::writer(Vec::<u8>::new())));
    }

    #[test]
    fn null_discards() {
        assert!(Sink::Null.write_all(b"dropped").is_ok());
        assert!(Sink::default().is_null());
    }

    #[test]
    fn writer_sink_wraps_any_writer() {
        let shared = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = Sink::Writer(shared.clone());
        sink.write_all(b"hello").unwrap();
        assert_eq!(&*shared.lock().unwrap(), b"hello");
    }

    #[test]
    fn buffered_console_is_independent() {
        let (console, out, err) = Console::buffered();
        console.stdout.write_all(b"o").unwrap();
        console.stderr.write_all(b"e").unwrap();
        assert_eq!(out.to_string_lossy(), "o");
        assert_eq!(err.to_string_lossy(), "e");
    }
}
