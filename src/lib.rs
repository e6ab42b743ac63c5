//! Build-script friendly subprocess helpers.
//!
//! This crate provides a small set of building blocks for running external
//! programs from build automation code: a chainable [`PreparedCommand`]
//! configuration, run policies that decide where the child's output goes
//! (`run`, `run_v`, `run_e`, `run_s` and their `output*` counterparts), and
//! errors that carry the child's exit code so a driver can exit with it.
//!
//! Command lines are expanded before launch: `$NAME` and `${NAME}` are looked
//! up in the command's own environment overlay, then in the process
//! environment. Setting [`config::VERBOSE_ENV`] logs every command line and
//! echoes the stdout of `run`/`output`.
//!
//! ```no_run
//! use shell_exec::PreparedCommand;
//!
//! let tag = shell_exec::output("git", &["describe", "--tags"])?;
//! PreparedCommand::new("cargo", ["build", "--release", ""])
//!     .collapse_args()
//!     .env([format!("BUILD_TAG={tag}")])
//!     .run_e()?;
//! # Ok::<(), shell_exec::ShError>(())
//! ```

#[cfg(unix)]
pub mod capture;
pub mod command;
pub mod config;
pub mod env;
mod error;
mod external;
mod io_adapters;
mod runner;
mod sh;

pub use command::{ExitCode, PreparedCommand};
pub use error::{ShError, cmd_ran, exit_status, exit_status_of};
pub use external::{Outcome, find_command_path};
pub use io_adapters::{Console, MemBuffer, SharedWriter, Sink};
pub use runner::Execution;
pub use sh::{exec, out_cmd, output, output_with, run, run_cmd, run_v, run_with, run_with_v};
