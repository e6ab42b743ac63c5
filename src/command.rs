use crate::env::Environment;
use crate::io_adapters::{Console, Sink};
use std::fmt;
use std::path::{Path, PathBuf};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Description of one subprocess invocation, built up before it is run.
///
/// Every builder method consumes the command and returns the updated value,
/// so a configuration is never changed behind the back of another holder.
/// To derive two variants from a common base, `clone()` it first.
///
/// By default the child inherits this process's environment and working
/// directory, writes stdout to our stdout and stderr to our stderr.
///
/// ```no_run
/// use shell_exec::PreparedCommand;
///
/// let version = PreparedCommand::new("git", ["describe", "--tags"])
///     .dir("/src/project")
///     .output()?;
/// # Ok::<(), shell_exec::ShError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PreparedCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) env: Environment,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) stdout: Sink,
    pub(crate) stderr: Sink,
    pub(crate) console: Console,
}

impl PreparedCommand {
    /// Creates a command for `program` with the given initial arguments.
    ///
    /// `program` is looked up on `PATH` unless it contains a path separator.
    /// Both output streams start on the console.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Console::default();
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Environment::new(),
            dir: None,
            stdout: console.stdout.clone(),
            stderr: console.stderr.clone(),
            console,
        }
    }

    /// Appends additional arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Removes empty arguments from the argument list.
    ///
    /// Lets optional flags be written inline as `if cond { "-x" } else { "" }`.
    pub fn collapse_args(mut self) -> Self {
        self.args.retain(|arg| !arg.is_empty());
        self
    }

    /// Defines additional environment variables as `NAME=value` entries.
    ///
    /// The ambient environment is always included; these entries override it,
    /// and a later entry overrides an earlier one with the same name.
    pub fn env<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for var in vars {
            self.env.push_entry(var.as_ref());
        }
        self
    }

    /// Like [`env`](Self::env), with name and value already split.
    pub fn env_var(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.env.set_var(key, val);
        self
    }

    /// Sets the working directory of the command.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Directs stdout from the command.
    pub fn stdout(mut self, sink: Sink) -> Self {
        self.stdout = sink;
        self
    }

    /// Directs stderr from the command.
    pub fn stderr(mut self, sink: Sink) -> Self {
        self.stderr = sink;
        self
    }

    /// Discards both stdout and stderr.
    pub fn silent(self) -> Self {
        self.stdout(Sink::Null).stderr(Sink::Null)
    }

    /// Replaces the streams the run policies treat as the caller's console.
    ///
    /// Sinks currently bound to the old console's streams are rebound to the
    /// new ones; explicitly configured sinks are left alone.
    pub fn console(mut self, console: Console) -> Self {
        if matches!(self.stdout, Sink::Stdout) {
            self.stdout = console.stdout.clone();
        }
        if matches!(self.stderr, Sink::Stderr) {
            self.stderr = console.stderr.clone();
        }
        self.console = console;
        self
    }

    /// Program name as given, before expansion.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments in the order they were added.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Environment overlay applied on top of the ambient environment.
    pub fn get_env(&self) -> &Environment {
        &self.env
    }

    /// Working directory, if one was set.
    pub fn get_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Where the child's stdout goes.
    pub fn get_stdout(&self) -> &Sink {
        &self.stdout
    }

    /// Where the child's stderr goes.
    pub fn get_stderr(&self) -> &Sink {
        &self.stderr
    }
}

impl fmt::Display for PreparedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_inherits_console_streams() {
        let c = PreparedCommand::new("echo", ["hi"]);
        assert!(matches!(c.get_stdout(), Sink::Stdout));
        assert!(matches!(c.get_stderr(), Sink::Stderr));
        assert!(c.get_env().is_empty());
        assert_eq!(c.get_dir(), None);
    }

    #[test]
    fn args_append_in_order() {
        let c = PreparedCommand::new("go", ["build"])
            .args(["-o", "bin/app"])
            .arg("./cmd");
        assert_eq!(c.get_args(), ["build", "-o", "bin/app", "./cmd"]);
        assert_eq!(c.to_string(), "go build -o bin/app ./cmd");
    }

    #[test]
    fn collapse_args_drops_only_empty_strings() {
        let c = PreparedCommand::new("tool", ["-x", "", "-y", "val"]).collapse_args();
        assert_eq!(c.get_args(), ["-x", "-y", "val"]);

        let twice = c.clone().collapse_args();
        assert_eq!(twice.get_args(), c.get_args());

        let spaces = PreparedCommand::new("tool", [" ", ""]).collapse_args();
        assert_eq!(spaces.get_args(), [" "]);
    }

    #[test]
    fn env_entries_accumulate_and_later_wins() {
        let c = PreparedCommand::new("env", Vec::<String>::new())
            .env(["X=1", "Y=2"])
            .env(["X=3"]);
        assert_eq!(c.get_env().get_var("X"), Some("3".to_string()));
        assert_eq!(c.get_env().get_var("Y"), Some("2".to_string()));
    }

    #[test]
    fn silent_then_stdout_reenables_stdout() {
        let (sink, _buf) = Sink::buffer();
        let c = PreparedCommand::new("echo", ["hi"]).silent().stdout(sink.clone());
        assert!(matches!(c.get_stdout(), Sink::Buffer(_)));
        assert!(c.get_stderr().is_null());

        let c = PreparedCommand::new("echo", ["hi"]).stdout(sink).silent();
        assert!(c.get_stdout().is_null());
        assert!(c.get_stderr().is_null());
    }

    #[test]
    fn branching_does_not_alias() {
        let base = PreparedCommand::new("cargo", ["build"]);
        let release = base.clone().arg("--release");
        let quiet = base.clone().silent();
        assert_eq!(base.get_args(), ["build"]);
        assert_eq!(release.get_args(), ["build", "--release"]);
        assert!(matches!(base.get_stdout(), Sink::Stdout));
        assert!(quiet.get_stdout().is_null());
    }

    #[test]
    fn console_rebinds_default_streams_only() {
        let (explicit, _) = Sink::buffer();
        let (console, _, _) = Console::buffered();
        let c = PreparedCommand::new("x", Vec::<String>::new())
            .stdout(explicit)
            .console(console);
        assert!(matches!(c.get_stdout(), Sink::Buffer(_)));
        assert!(matches!(c.get_stderr(), Sink::Buffer(_)));
    }

    #[test]
    fn dir_is_recorded() {
        let c = PreparedCommand::new("ls", Vec::<String>::new()).dir("/tmp");
        assert_eq!(c.get_dir(), Some(Path::new("/tmp")));
    }
}
