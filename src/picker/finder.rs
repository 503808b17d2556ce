use std::path::{Path, PathBuf};

use crate::{errors::MochaError, id};

/// Locates test files on disk.
pub trait TestFinder: Send + Sync {
    /// Files under `root` whose name ends in `extension`, minus those whose
    /// root-relative path matches the `exclude` glob.
    fn find_test_files(
        &self,
        root: &Path,
        extension: &str,
        exclude: &str,
    ) -> Result<Vec<PathBuf>, MochaError>;
}

/// Finds test files with `glob`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobFinder;

impl TestFinder for GlobFinder {
    fn find_test_files(
        &self,
        root: &Path,
        extension: &str,
        exclude: &str,
    ) -> Result<Vec<PathBuf>, MochaError> {
        let exclude = glob::Pattern::new(exclude).map_err(|source| MochaError::Pattern {
            pattern: exclude.to_string(),
            source,
        })?;
        let pattern = format!(
            "{}/**/*{}",
            glob::Pattern::escape(&root.to_string_lossy()),
            glob::Pattern::escape(extension)
        );
        let paths = glob::glob(&pattern).map_err(|source| MochaError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for path in paths {
            let path = path?;
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if exclude.matches(&id::normalize(&relative.to_string_lossy())) || !path.is_file() {
                continue;
            }
            files.push(path);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dependency_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in &[
            "test/math.test.ts",
            "test/nested/deep.test.ts",
            "test/helpers.ts",
            "pkg/node_modules/dep/lib.test.ts",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }

        let mut found = GlobFinder
            .find_test_files(root, ".test.ts", "**/node_modules/**")
            .unwrap();
        found.sort();
        assert_eq!(
            found,
            vec![
                root.join("test/math.test.ts"),
                root.join("test/nested/deep.test.ts")
            ]
        );
    }
}
