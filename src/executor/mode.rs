use std::fmt;

use super::results::TestRun;
use crate::tree::{Tag, Tree};

/// Scope of a run, derived from the tag of the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// A case was selected: run every case of its suite.
    Suite,
    /// A file was selected: run the file and its known cases.
    File,
    /// A folder was selected: let the runner decide what to execute.
    Folder,
}

impl From<Tag> for RunMode {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Test => RunMode::Suite,
            Tag::TestSuite => RunMode::File,
            Tag::Folder => RunMode::Folder,
        }
    }
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Suite => "suite",
            RunMode::File => "file",
            RunMode::Folder => "folder",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which run profile a request was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Run,
    Debug,
}

/// A request to run tests.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Selected node ids. Only single selections are executed.
    pub include: Vec<String>,
    pub profile: Profile,
}

impl RunRequest {
    pub fn single(id: impl Into<String>) -> Self {
        RunRequest {
            include: vec![id.into()],
            profile: Profile::Run,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

/// Ids affected by running `id` in `mode`: the node first, followed by its
/// siblings (suite mode) or its children (file mode).
pub fn include_set(tree: &Tree, mode: RunMode, id: &str) -> Vec<String> {
    let mut include = vec![id.to_string()];
    match mode {
        RunMode::File => include.extend(tree.children(id).map(|child| child.id.clone())),
        RunMode::Suite => {
            if let Some(parent) = tree.parent(id) {
                include.extend(
                    tree.children(&parent.id)
                        .filter(|child| child.id != id)
                        .map(|child| child.id.clone()),
                );
            }
        }
        RunMode::Folder => (),
    }
    include
}

/// Open a session over everything `id` affects and mark it busy.
pub fn start_run(tree: &mut Tree, mode: RunMode, id: &str, request: &RunRequest) -> TestRun {
    let include = include_set(tree, mode, id);
    tracing::debug!(id, %mode, profile = ?request.profile, nodes = include.len(), "starting run");
    for node in &include {
        tree.set_busy(node, true);
    }
    TestRun::new(include)
}
