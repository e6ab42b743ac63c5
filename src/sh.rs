//! One-call shortcuts over [`PreparedCommand`].
//!
//! `env` arguments are `(name, value)` pairs layered over the process
//! environment; they are also visible to `$NAME` expansion in `cmd` and
//! `args`.

use crate::command::PreparedCommand;
use crate::error::ShError;
use crate::io_adapters::Sink;
use crate::runner::Execution;

fn prepare(env: &[(&str, &str)], cmd: &str, args: &[&str]) -> PreparedCommand {
    env.iter().fold(
        PreparedCommand::new(cmd, args.iter().copied()),
        |c, (k, v)| c.env_var(*k, *v),
    )
}

/// Runs `cmd`, sending stderr to our stderr and stdout to our stdout only in
/// verbose mode.
pub fn run(cmd: &str, args: &[&str]) -> Result<(), ShError> {
    run_with(&[], cmd, args)
}

/// Like [`run`], but always sends the command's stdout to our stdout.
pub fn run_v(cmd: &str, args: &[&str]) -> Result<(), ShError> {
    run_with_v(&[], cmd, args)
}

/// Like [`run`], with extra environment variables for the command.
pub fn run_with(env: &[(&str, &str)], cmd: &str, args: &[&str]) -> Result<(), ShError> {
    prepare(env, cmd, args).run()
}

/// Like [`run_with`], but always sends the command's stdout to our stdout.
pub fn run_with_v(env: &[(&str, &str)], cmd: &str, args: &[&str]) -> Result<(), ShError> {
    prepare(env, cmd, args).run_v()
}

/// Runs the command and returns what it wrote to stdout, minus one trailing
/// newline. If the command fails, the text is on the error
/// ([`ShError::output`]).
pub fn output(cmd: &str, args: &[&str]) -> Result<String, ShError> {
    output_with(&[], cmd, args)
}

/// Like [`output`], with extra environment variables for the command.
pub fn output_with(env: &[(&str, &str)], cmd: &str, args: &[&str]) -> Result<String, ShError> {
    prepare(env, cmd, args).output()
}

/// Runs the command with explicit sinks for its stdout and stderr.
///
/// If the command fails with a non-zero code, the returned error carries that
/// code so a driver can exit with it. See [`Execution`] for the meaning of
/// `ran` and `code`.
pub fn exec(
    env: &[(&str, &str)],
    stdout: Sink,
    stderr: Sink,
    cmd: &str,
    args: &[&str],
) -> Execution {
    prepare(env, cmd, args).stdout(stdout).stderr(stderr).exec()
}

/// Returns a function that runs `cmd` with `args` followed by whatever
/// arguments it is called with.
///
/// ```no_run
/// let go_install = shell_exec::run_cmd("go", &["install"]);
/// go_install(&["github.com/gohugo/hugo"])?;
/// # Ok::<(), shell_exec::ShError>(())
/// ```
pub fn run_cmd(cmd: &str, args: &[&str]) -> impl Fn(&[&str]) -> Result<(), ShError> + use<> {
    let base = PreparedCommand::new(cmd, args.iter().copied());
    move |more| base.clone().args(more.iter().copied()).run()
}

/// Like [`run_cmd`], but the returned function yields the command's stdout.
pub fn out_cmd(cmd: &str, args: &[&str]) -> impl Fn(&[&str]) -> Result<String, ShError> + use<> {
    let base = PreparedCommand::new(cmd, args.iter().copied());
    move |more| base.clone().args(more.iter().copied()).output()
}
