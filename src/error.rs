use crate::command::ExitCode;
use std::io;

/// Error produced when a prepared command fails.
///
/// The two variants mirror the two ways a subprocess can go wrong: it never
/// started, or it ran and reported failure through its exit status. The
/// latter carries the exit code so a driver can terminate with the same code,
/// plus whatever stdout was captured before the failure.
#[derive(Debug, thiserror::Error)]
pub enum ShError {
    /// The program could not be started (not found, not executable, ...).
    #[error("failed to run \"{command}\": {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    /// The program ran and exited with a non-zero code.
    ///
    /// `output` holds the captured stdout for the `output*` calls and is
    /// empty otherwise.
    #[error("running \"{command}\" failed with exit code {code}")]
    Exit {
        command: String,
        code: ExitCode,
        output: String,
    },
}

impl ShError {
    /// Whether the underlying process actually ran.
    pub fn ran(&self) -> bool {
        matches!(self, ShError::Exit { .. })
    }

    /// Exit code a driver should terminate with.
    ///
    /// Launch failures have no child status and report `1`.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShError::Launch { .. } => 1,
            ShError::Exit { code, .. } => *code,
        }
    }

    /// Stdout captured before the command failed, trailing newline trimmed.
    ///
    /// Empty for launch failures and for calls that do not capture.
    pub fn output(&self) -> &str {
        match self {
            ShError::Launch { .. } => "",
            ShError::Exit { output, .. } => output,
        }
    }

    pub(crate) fn with_output(self, text: String) -> Self {
        match self {
            ShError::Exit { command, code, .. } => ShError::Exit {
                command,
                code,
                output: text,
            },
            launch => launch,
        }
    }
}

/// Reports whether `err` came from a command that ran to completion.
///
/// Errors that are not a [`ShError`] somewhere in the chain are treated as
/// "did not run".
pub fn cmd_ran(err: &anyhow::Error) -> bool {
    find_sh_error(err).is_some_and(ShError::ran)
}

/// Exit status carried by `err`: the embedded code of a failed command, or
/// `1` for any other error.
pub fn exit_status(err: &anyhow::Error) -> ExitCode {
    find_sh_error(err).map_or(1, ShError::exit_code)
}

/// Like [`exit_status`], but `None` maps to `0`.
pub fn exit_status_of(err: Option<&anyhow::Error>) -> ExitCode {
    err.map_or(0, exit_status)
}

fn find_sh_error(err: &anyhow::Error) -> Option<&ShError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ShError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use pretty_assertions::assert_eq;

    fn exit_error(code: ExitCode) -> ShError {
        ShError::Exit {
            command: "make all".to_string(),
            code,
            output: String::new(),
        }
    }

    #[test]
    fn exit_error_message_embeds_code() {
        assert_eq!(
            exit_error(99).to_string(),
            "running \"make all\" failed with exit code 99"
        );
    }

    #[test]
    fn launch_error_message_embeds_cause() {
        let err = ShError::Launch {
            command: "nope --flag".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "failed to run \"nope --flag\": No such file or directory"
        );
        assert!(!err.ran());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.with_output("ignored".to_string()).output(), "");
    }

    #[test]
    fn exit_error_keeps_attached_output() {
        let err = exit_error(2).with_output("partial".to_string());
        assert_eq!(err.output(), "partial");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "running \"make all\" failed with exit code 2"
        );
    }

    #[test]
    fn exit_status_reads_embedded_code_through_context() {
        let err = anyhow::Error::new(exit_error(42)).context("building docs");
        assert_eq!(exit_status(&err), 42);
        assert!(cmd_ran(&err));
    }

    #[test]
    fn exit_status_defaults_for_foreign_errors() {
        let err = anyhow::anyhow!("something unrelated");
        assert_eq!(exit_status(&err), 1);
        assert!(!cmd_ran(&err));
        assert_eq!(exit_status_of(None), 0);
        assert_eq!(exit_status_of(Some(&err)), 1);
    }

    #[test]
    fn context_on_result_keeps_classification() {
        let res: Result<(), ShError> = Err(exit_error(3));
        let err = res.context("step failed").unwrap_err();
        assert_eq!(exit_status(&err), 3);
    }
}
