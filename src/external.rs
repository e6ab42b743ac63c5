use crate::command::{ExitCode, PreparedCommand};
use crate::io_adapters::Sink;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// How a launch attempt ended, decided once at the OS boundary.
#[derive(Debug)]
pub enum Outcome {
    /// The process ran and exited with status 0.
    Success,
    /// The process ran and exited with a non-zero code (or was killed).
    Exited(ExitCode),
    /// The process could not be started at all.
    LaunchFailed(io::Error),
}

impl Outcome {
    /// Whether the process was started.
    pub fn ran(&self) -> bool {
        !matches!(self, Outcome::LaunchFailed(_))
    }

    /// Exit code; `1` when the process could not be started.
    pub fn code(&self) -> ExitCode {
        match self {
            Outcome::Success => 0,
            Outcome::Exited(code) => *code,
            Outcome::LaunchFailed(_) => 1,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Outcome::Success,
            Some(code) => Outcome::Exited(code),
            None => Outcome::Exited(terminated_by_signal(status)),
        }
    }
}

/// Launch an already expanded command and wait for it.
///
/// Sinks backed by a file descriptor are handed to the child directly; the
/// others get a pipe drained by a scoped thread. When stdout and stderr go to
/// the same sink they share one pipe, which keeps their relative order.
/// Errors while draining are logged and otherwise ignored.
pub(crate) fn launch(cmd: &PreparedCommand) -> Outcome {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .envs(cmd.env.iter())
        .stdin(Stdio::inherit());
    if let Some(dir) = &cmd.dir {
        command.current_dir(dir);
    }

    let merged = if cmd.stdout.shares_target(&cmd.stderr) {
        match merged_pipe() {
            Ok((reader, out, err)) => {
                command.stdout(out).stderr(err);
                Some(reader)
            }
            Err(e) => return Outcome::LaunchFailed(e),
        }
    } else {
        command.stdout(cmd.stdout.stdio()).stderr(cmd.stderr.stdio());
        None
    };

    let spawned = command.spawn();
    // Closes our copies of the merged write end so the reader sees EOF.
    drop(command);
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => return Outcome::LaunchFailed(e),
    };

    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();
    let waited = thread::scope(|s| {
        if let Some(pipe) = merged {
            s.spawn(|| pump(pipe, &cmd.stdout, "output"));
        }
        if let Some(pipe) = child_stdout {
            s.spawn(|| pump(pipe, &cmd.stdout, "stdout"));
        }
        if let Some(pipe) = child_stderr {
            s.spawn(|| pump(pipe, &cmd.stderr, "stderr"));
        }
        child.wait()
    });

    match waited {
        Ok(status) => Outcome::from_status(status),
        // The child was spawned, so it ran; we just lost track of its status.
        Err(e) => {
            log::warn!("failed to wait for {}: {e}", cmd.program);
            Outcome::Exited(1)
        }
    }
}

fn merged_pipe() -> io::Result<(io::PipeReader, io::PipeWriter, io::PipeWriter)> {
    let (reader, writer) = io::pipe()?;
    let second = writer.try_clone()?;
    Ok((reader, writer, second))
}

fn pump(mut pipe: impl Read, sink: &Sink, stream: &str) {
    let mut buf = [0u8; 8192];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = sink.write_all(&buf[..n]) {
                    log::warn!("dropping child {stream}: {e}");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("failed to read child {stream}: {e}");
                break;
            }
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a program name the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`) or `./`-prefixed:
///   returns it if it exists.
/// - Single path component: searches each directory in `search_paths` (PATH)
///   and returns the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
