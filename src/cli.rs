use crate::errors;
use std::path::PathBuf;
use structopt::StructOpt;

/// Options for the CLI.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "mocha-mono",
    about = "Discover, run and reconcile mocha tests."
)]
pub struct Opts {
    /// Workspace directory containing mocha.toml.
    #[structopt(short = "C", long = "dir", default_value = ".", parse(from_os_str))]
    pub dir: PathBuf,

    /// Show expected/actual diffs for failing tests.
    #[structopt(short, long)]
    pub diff: bool,

    /// Only display tests with a specific outcome (pass or fail).
    #[structopt(short, long)]
    pub only: Option<OnlyOpt>,

    /// Log what the engine is doing.
    #[structopt(short, long)]
    pub verbose: bool,

    /// Number of worker threads. Defaults to the number of CPUs.
    #[structopt(short, long)]
    pub jobs: Option<usize>,

    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Discover tests and print the tree.
    List,

    /// Run a folder, file or case.
    Run {
        /// Node id, folder label or file path relative to the workspace.
        #[structopt(name = "TARGET")]
        target: String,

        /// Run a single case of the file.
        #[structopt(short, long)]
        case: Option<String>,

        /// Use the debug command.
        #[structopt(long)]
        debug: bool,
    },

    /// Apply a report produced by an earlier run.
    Reconcile {
        /// Node id, folder label or file path relative to the workspace.
        #[structopt(name = "TARGET")]
        target: String,

        /// JSON report to apply.
        #[structopt(name = "REPORT", parse(from_os_str))]
        report: PathBuf,

        /// The case the report was produced for.
        #[structopt(short, long)]
        case: Option<String>,
    },
}

/// Possible values for the --only flag.
#[derive(Debug, PartialEq, Eq)]
pub enum OnlyOpt {
    /// Failing tests.
    Fail,
    /// Passing tests.
    Pass,
}

impl std::str::FromStr for OnlyOpt {
    type Err = errors::MochaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(OnlyOpt::Fail),
            "pass" => Ok(OnlyOpt::Pass),
            _ => Err(errors::MochaError::Config(
                "Must be one of fail, pass.".to_string(),
            )),
        }
    }
}
