//! Workspace configuration read from a `mocha.toml` file.
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::MochaError, id};

/// Name of the configuration file looked up in the workspace directory.
pub const CONFIG_FILE: &str = "mocha.toml";

/// Configuration for a workspace.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of mocha-mono this configuration is compatible with.
    pub ver: Option<String>,
    /// Suffixes of test files, e.g. `.test.ts`.
    pub test_extensions: Vec<String>,
    /// Glob of paths never scanned for tests.
    pub exclude: String,
    /// Resolve working directories from the nearest `tsconfig.json`.
    pub use_ts_config: bool,
    /// Command that runs tests and produces a report. See [crate::executor::CommandRunner]
    /// for the placeholders it may use.
    pub cmd: String,
    /// Command used by the debug profile. Defaults to `cmd`.
    pub debug_cmd: Option<String>,
    /// File the runner writes its report to. When unset the report is read
    /// from the runner's stdout.
    pub report: Option<String>,
    /// Timeout for a single runner invocation, in seconds.
    pub timeout: Option<u64>,
    /// Run configurations, the first matching one wins.
    pub configs: Vec<RunConfig>,
}

/// Settings for the files matching `pattern`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Glob matched against workspace-relative file paths.
    pub pattern: String,
    /// Working directory relative to the workspace root.
    pub cwd: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ver: None,
            test_extensions: vec![".test.ts".to_string(), ".test.js".to_string()],
            exclude: "**/node_modules/**".to_string(),
            use_ts_config: false,
            cmd: "npx mocha --reporter mocha-junit-reporter {file}".to_string(),
            debug_cmd: None,
            report: None,
            timeout: None,
            configs: Vec::new(),
        }
    }
}

impl Config {
    /// Create a configuration by reading the `mocha.toml` in `conf_dir`.
    /// A missing file yields the defaults. Ensures that a version given in
    /// the file matches the version of this tool.
    pub fn from_path(conf_dir: &Path) -> Result<Self, MochaError> {
        let conf_path = conf_dir.join(CONFIG_FILE);
        if !conf_path.exists() {
            tracing::debug!(path = %conf_path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&conf_path)
            .map_err(|err| MochaError::io(&conf_path, err))?;
        Self::from_toml(&contents).map_err(|err| {
            MochaError::Config(format!("Failed to parse {}: {}", conf_path.display(), err))
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, MochaError> {
        let conf: Config =
            toml::from_str(contents).map_err(|err| MochaError::Config(err.to_string()))?;

        if let Some(ver) = &conf.ver {
            if env!("CARGO_PKG_VERSION") != ver {
                return Err(MochaError::Config(format!(
                    "mocha-mono version mismatch. Configuration requires: {}, tool version: {}.",
                    ver,
                    env!("CARGO_PKG_VERSION")
                )));
            }
        }
        let patterns = conf.configs.iter().map(|run_config| &run_config.pattern);
        for pattern in std::iter::once(&conf.exclude).chain(patterns) {
            glob::Pattern::new(pattern).map_err(|source| MochaError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(conf)
    }

    /// First run configuration whose pattern matches the workspace-relative
    /// `relative_file`.
    pub fn matching(&self, relative_file: &Path) -> Option<&RunConfig> {
        let file = id::normalize(&relative_file.to_string_lossy());
        self.configs.iter().find(|conf| {
            glob::Pattern::new(&conf.pattern)
                .map(|pattern| pattern.matches(&file))
                .unwrap_or(false)
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
