use futures::future::BoxFuture;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time};
use tokio_util::sync::CancellationToken;

use super::mode::{Profile, RunMode};
use crate::{errors::MochaError, picker::toml::Config, report::Report};

/// Everything the runner needs to execute one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Workspace root.
    pub root: PathBuf,
    /// File (or folder) backing the selected node.
    pub file: PathBuf,
    /// Label of the selected node.
    pub label: String,
    pub mode: RunMode,
    /// Id of the selected node.
    pub item: String,
}

/// Executes tests outside this process and hands back their report.
pub trait Runner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Report, MochaError>>;
}

/// Runs a shell command and decodes the report it produces.
///
/// The command may use these placeholders, each replaced by a shell-quoted
/// value:
/// - `{root}`: the workspace root
/// - `{file}` or `{}`: the selected file or folder
/// - `{name}`: the label of the selected node
/// - `{mode}`: `suite`, `file` or `folder`
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Command to be executed.
    pub cmd: String,
    /// Where the command writes its report, with the same placeholders as
    /// `cmd`. Read from stdout when `None`.
    pub report: Option<String>,
    /// Timeout for one invocation.
    pub timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(cmd: impl Into<String>) -> Self {
        CommandRunner {
            cmd: cmd.into(),
            report: None,
            timeout: None,
        }
    }

    /// Runner for `profile` as configured in `config`.
    pub fn from_config(config: &Config, profile: Profile) -> Self {
        let cmd = match (profile, &config.debug_cmd) {
            (Profile::Debug, Some(debug)) => debug.clone(),
            _ => config.cmd.clone(),
        };
        CommandRunner {
            cmd,
            report: config.report.clone(),
            timeout: config.timeout(),
        }
    }

    /// Replace the placeholders of `template` with values from `invocation`.
    pub fn substitute(template: &str, invocation: &Invocation) -> String {
        let file = quote(&invocation.file.to_string_lossy());
        template
            .replace("{root}", &quote(&invocation.root.to_string_lossy()))
            .replace("{file}", &file)
            .replace("{name}", &quote(&invocation.label))
            .replace("{mode}", invocation.mode.as_str())
            .replace("{}", &file)
    }

    /// Construct the command for `invocation`, run from the workspace root.
    fn construct_command(&self, invocation: &Invocation) -> Command {
        let concrete_command = Self::substitute(&self.cmd, invocation);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(concrete_command)
            .current_dir(&invocation.root)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn report_path(&self, invocation: &Invocation) -> Option<PathBuf> {
        let template = self.report.as_ref()?;
        let path = template
            .replace("{root}", &invocation.root.to_string_lossy())
            .replace("{file}", &invocation.file.to_string_lossy())
            .replace("{name}", &invocation.label)
            .replace("{mode}", invocation.mode.as_str());
        Some(resolve(&invocation.root, Path::new(&path)))
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        token: &CancellationToken,
    ) -> Result<Report, MochaError> {
        let mut cmd = self.construct_command(invocation);
        tracing::info!(
            item = %invocation.item,
            mode = %invocation.mode,
            cmd = %self.cmd,
            "running tests"
        );

        let output = cmd.output();
        let finished = tokio::select! {
            _ = token.cancelled() => {
                return Err(MochaError::Runner("cancelled".to_string()));
            }
            finished = async {
                match self.timeout {
                    Some(limit) => time::timeout(limit, output).await.map_err(|_| {
                        MochaError::Runner(format!("timed out after {:?}", limit))
                    }),
                    None => Ok(output.await),
                }
            } => finished?,
        };
        let out = finished.map_err(|err| MochaError::Runner(format!("{}: {}", self.cmd, err)))?;

        let stdout = String::from_utf8(out.stdout)?;
        if !out.stderr.is_empty() {
            tracing::debug!(stderr = %String::from_utf8_lossy(&out.stderr), "runner stderr");
        }

        // Test runners exit non-zero when tests fail, so the status alone
        // says nothing about whether a report exists.
        let json = match self.report_path(invocation) {
            Some(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| MochaError::io(path, err))?,
            None => stdout,
        };
        Report::from_json(&json).map_err(|err| {
            MochaError::Runner(format!(
                "no report from `{}` (exit code {}): {}",
                self.cmd,
                out.status.code().unwrap_or(-1),
                err
            ))
        })
    }
}

impl Runner for CommandRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Report, MochaError>> {
        Box::pin(self.execute(invocation, token))
    }
}

/// Wrap `value` in single quotes for `sh`.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
