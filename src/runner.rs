//! Run policies layered on top of [`PreparedCommand::exec`].
//!
//! | call        | stdout                          | stderr                 |
//! |-------------|---------------------------------|------------------------|
//! | `run`       | console only in verbose mode    | as configured          |
//! | `run_v`     | console                         | as configured          |
//! | `run_e`     | buffered, replayed on failure   | buffered with stdout   |
//! | `run_s`     | discarded                       | discarded              |
//! | `output*`   | same as the `run*` counterpart, and captured for return |

use crate::command::{ExitCode, PreparedCommand};
use crate::config;
use crate::error::ShError;
use crate::external::{self, Outcome};
use crate::io_adapters::{MemBuffer, Sink};
use std::ffi::OsStr;
use std::path::Path;

/// Classified result of [`PreparedCommand::exec`].
///
/// `ran` is false only when the program could not be started, in which case
/// `error` is always set. When `ran` is true and `error` is `None`, `code` is 0.
#[derive(Debug)]
pub struct Execution {
    pub ran: bool,
    pub code: ExitCode,
    pub error: Option<ShError>,
}

impl Execution {
    fn classify(command: String, outcome: Outcome) -> Self {
        let ran = outcome.ran();
        let code = outcome.code();
        let error = match outcome {
            Outcome::Success => None,
            Outcome::Exited(code) => Some(ShError::Exit {
                command,
                code,
                output: String::new(),
            }),
            Outcome::LaunchFailed(source) => Some(ShError::Launch { command, source }),
        };
        Self { ran, code, error }
    }

    /// Ran and exited with code 0.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Drop `ran`/`code` and keep only the error.
    pub fn into_result(self) -> Result<(), ShError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl PreparedCommand {
    /// Exec the prepared command, returning whether it ran and its exit code.
    /// Does not modify the configured outputs.
    ///
    /// `$NAME` and `${NAME}` references in the program and arguments are
    /// expanded first, using the command's environment overlay and then the
    /// process environment.
    pub fn exec(self) -> Execution {
        self.exec_as(config::verbose())
    }

    fn exec_as(self, verbose: bool) -> Execution {
        let cmd = self.expanded();
        if verbose {
            log::info!("Exec: {}", cmd.describe());
        }

        let outcome = external::launch(&cmd);
        log::debug!("{cmd}: {outcome:?}");
        Execution::classify(cmd.to_string(), outcome)
    }

    /// Run the command, directing stderr as configured (this process's stderr
    /// by default) and printing stdout only in verbose mode.
    pub fn run(self) -> Result<(), ShError> {
        let verbose = config::verbose();
        let stdout = self.verbose_stdout(verbose);
        self.stdout(stdout).exec_as(verbose).into_result()
    }

    /// Like [`run`](Self::run), but always writes the command's stdout to the
    /// console.
    pub fn run_v(self) -> Result<(), ShError> {
        let stdout = self.console.stdout.clone();
        self.stdout(stdout).exec().into_result()
    }

    /// Like [`run`](Self::run), but the command's output is only written to
    /// the console's stderr when it fails.
    pub fn run_e(self) -> Result<(), ShError> {
        let (combined, replay) = Sink::buffer();
        let console = self.console.clone();
        let res = self
            .stdout(combined.clone())
            .stderr(combined)
            .exec()
            .into_result();
        if res.is_err() {
            replay_to(&console.stderr, &replay.contents());
        }
        res
    }

    /// Like [`run`](Self::run), but nothing is written anywhere.
    pub fn run_s(self) -> Result<(), ShError> {
        self.silent().exec().into_result()
    }

    /// Executes the command and returns its stdout with one trailing newline
    /// removed. Stdout is also echoed to the console in verbose mode.
    ///
    /// On failure the captured text is kept on the error, see
    /// [`ShError::output`].
    pub fn output(self) -> Result<String, ShError> {
        let verbose = config::verbose();
        let (captured, text) = Sink::buffer();
        let stdout = captured.tee(self.verbose_stdout(verbose));
        let res = self.stdout(stdout).exec_as(verbose).into_result();
        with_captured(res, &text)
    }

    /// Like [`output`](Self::output), but always echoes stdout to the console.
    pub fn output_v(self) -> Result<String, ShError> {
        let (captured, text) = Sink::buffer();
        let stdout = captured.tee(self.console.stdout.clone());
        let res = self.stdout(stdout).exec().into_result();
        with_captured(res, &text)
    }

    /// Like [`output`](Self::output), but stdout and stderr are only written
    /// to the console's stderr when the command fails.
    pub fn output_e(self) -> Result<String, ShError> {
        let (captured, text) = Sink::buffer();
        let (combined, replay) = Sink::buffer();
        let console = self.console.clone();
        let res = self
            .stdout(captured.tee(combined.clone()))
            .stderr(combined)
            .exec()
            .into_result();
        if res.is_err() {
            replay_to(&console.stderr, &replay.contents());
        }
        with_captured(res, &text)
    }

    /// Like [`output`](Self::output), but nothing is written anywhere.
    pub fn output_s(self) -> Result<String, ShError> {
        let (captured, text) = Sink::buffer();
        let res = self.silent().stdout(captured).exec().into_result();
        with_captured(res, &text)
    }

    fn verbose_stdout(&self, verbose: bool) -> Sink {
        if verbose {
            self.console.stdout.clone()
        } else {
            Sink::Null
        }
    }

    fn expanded(mut self) -> Self {
        self.program = self.env.expand(&self.program);
        for arg in &mut self.args {
            *arg = self.env.expand(arg);
        }
        self
    }

    /// Resolved program path followed by the arguments, for logging.
    fn describe(&self) -> String {
        let program = self
            .env
            .get_var("PATH")
            .and_then(|paths| {
                external::find_command_path(OsStr::new(&paths), Path::new(&self.program))
                    .map(|p| p.display().to_string())
            })
            .unwrap_or_else(|| self.program.clone());
        std::iter::once(program)
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn replay_to(sink: &Sink, output: &[u8]) {
    if let Err(e) = sink.write_all(output) {
        log::warn!("failed to replay command output: {e}");
    }
}

fn with_captured(res: Result<(), ShError>, text: &MemBuffer) -> Result<String, ShError> {
    let captured = trim_newline(text.to_string_lossy());
    match res {
        Ok(()) => Ok(captured),
        Err(e) => Err(e.with_output(captured)),
    }
}

fn trim_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
    }
    s
}
