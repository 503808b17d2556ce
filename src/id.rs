//! Stable identifiers for tree nodes.
//!
//! Suites are identified by their file path and cases by
//! `"<file path>-<case name>"`. Paths are normalized to `/` separators so a
//! file referenced as `a\b.ts` and `a/b.ts` yields the same node.

use std::path::Path;

/// Id of the folder node for the workspace root itself.
pub const ROOT_ID: &str = "<root>";

/// Normalize every path separator to `/`.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Id for a suite file, or for a case inside it when `case` is given.
pub fn make_id(file: &str, case: Option<&str>) -> String {
    let file = normalize(file);
    match case {
        Some(case) => format!("{}-{}", file, case),
        None => file,
    }
}

/// [make_id] for a filesystem path.
pub fn path_id(file: &Path, case: Option<&str>) -> String {
    make_id(&file.to_string_lossy(), case)
}

/// `path` relative to `base` with `/` separators, stepping out of `base`
/// with `..` where the two diverge. Empty when they are the same.
pub fn relative(base: &Path, path: &Path) -> String {
    let base: Vec<_> = base.components().collect();
    let path: Vec<_> = path.components().collect();
    let common = base.iter().zip(&path).take_while(|(a, b)| a == b).count();
    let parts: Vec<String> = base[common..]
        .iter()
        .map(|_| "..".to_string())
        .chain(
            path[common..]
                .iter()
                .map(|part| part.as_os_str().to_string_lossy().into_owned()),
        )
        .collect();
    parts.join("/")
}

/// Recover the case name from a case id by stripping the `"<file>-"` prefix.
/// Ids that don't carry the prefix are returned unchanged.
///
/// A case name that itself contains the prefix is split at its last
/// occurrence.
pub fn case_name<'a>(id: &'a str, file: &str) -> &'a str {
    let prefix = format!("{}-", normalize(file));
    match id.rfind(&prefix) {
        Some(idx) => &id[idx + prefix.len()..],
        None => id,
    }
}
