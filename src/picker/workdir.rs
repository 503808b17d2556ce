use std::path::{Path, PathBuf};

use super::toml::RunConfig;

/// Marker file used to find a project's directory when `use_ts_config` is on.
pub const TS_CONFIG: &str = "tsconfig.json";

/// Decides the directory a test file is run from. Test files are grouped
/// under one folder node per working directory.
pub trait WorkingDirectory: Send + Sync {
    fn resolve(
        &self,
        root: &Path,
        matching: Option<&RunConfig>,
        use_ts_config: bool,
        relative_file: &Path,
    ) -> PathBuf;
}

/// Resolves working directories from the run configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigWorkingDirectory;

impl WorkingDirectory for ConfigWorkingDirectory {
    fn resolve(
        &self,
        root: &Path,
        matching: Option<&RunConfig>,
        use_ts_config: bool,
        relative_file: &Path,
    ) -> PathBuf {
        if use_ts_config {
            let file = root.join(relative_file);
            let project = file
                .ancestors()
                .skip(1)
                .take_while(|dir| dir.starts_with(root))
                .find(|dir| dir.join(TS_CONFIG).is_file());
            if let Some(dir) = project {
                return dir.to_path_buf();
            }
        }
        match matching.and_then(|conf| conf.cwd.as_ref()) {
            Some(cwd) => root.join(cwd),
            None => root.to_path_buf(),
        }
    }
}
