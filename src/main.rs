use anyhow::{Context, Result, bail};
use argh::FromArgs;
use shell_exec::{PreparedCommand, config, exit_status};
use std::str::FromStr;

#[derive(FromArgs)]
/// Run one command the way a build target would, exiting with its exit code.
struct Shx {
    #[argh(switch, short = 'v')]
    /// log the command line and show its stdout
    verbose: bool,

    #[argh(option, short = 'e')]
    /// extra environment variable as NAME=value; may be repeated
    env: Vec<String>,

    #[argh(option, short = 'C')]
    /// directory to run the command in
    dir: Option<String>,

    #[argh(option, short = 'm', default = "Mode::Run")]
    /// output policy: run, run-v, run-e, run-s, output, output-v, output-e or output-s
    mode: Mode,

    #[argh(switch)]
    /// drop empty arguments before running
    collapse: bool,

    #[argh(positional)]
    /// program to run; may reference $VARIABLES
    program: String,

    #[argh(positional, greedy)]
    /// arguments passed to the program
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    RunV,
    RunE,
    RunS,
    Output,
    OutputV,
    OutputE,
    OutputS,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "run" => Mode::Run,
            "run-v" => Mode::RunV,
            "run-e" => Mode::RunE,
            "run-s" => Mode::RunS,
            "output" => Mode::Output,
            "output-v" => Mode::OutputV,
            "output-e" => Mode::OutputE,
            "output-s" => Mode::OutputS,
            other => return Err(format!("unknown mode {other:?}")),
        })
    }
}

impl Shx {
    fn command(&self) -> PreparedCommand {
        let mut cmd = PreparedCommand::new(&self.program, &self.args).env(&self.env);
        if let Some(dir) = &self.dir {
            cmd = cmd.dir(dir);
        }
        if self.collapse {
            cmd = cmd.collapse_args();
        }
        cmd
    }

    fn execute(self) -> Result<()> {
        if self.program.is_empty() {
            bail!("no program given");
        }
        let cmd = self.command();
        let label = cmd.to_string();
        let printed = match self.mode {
            Mode::Run => cmd.run().map(|()| None),
            Mode::RunV => cmd.run_v().map(|()| None),
            Mode::RunE => cmd.run_e().map(|()| None),
            Mode::RunS => cmd.run_s().map(|()| None),
            Mode::Output => cmd.output().map(Some),
            Mode::OutputV => cmd.output_v().map(Some),
            Mode::OutputE => cmd.output_e().map(Some),
            Mode::OutputS => cmd.output_s().map(Some),
        }
        .with_context(|| format!("shx {:?} {label}", self.mode))?;

        if let Some(text) = printed {
            println!("{text}");
        }
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let shx: Shx = argh::from_env();
    if shx.verbose {
        config::set_verbose(true);
    }

    if let Err(e) = shx.execute() {
        eprintln!("shx: {e:#}");
        std::process::exit(exit_status(&e));
    }
}
