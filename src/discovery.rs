//! Fills the test tree: folders and suite files eagerly from a scan of the
//! workspace, cases lazily when a suite is expanded.
use futures::{stream, StreamExt};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::{MochaError, RichResult},
    executor::Context,
    id,
    picker::line_range,
    tree::{Node, Range, Tag},
};

/// Id of the placeholder shown while discovery is scanning.
pub const SEARCHING_ID: &str = "mocha-mono-searching";
const SEARCHING_LABEL: &str = "Searching for tests...";

impl Context {
    /// Rebuild the tree from scratch by scanning the workspace for test files.
    /// Returns the number of files found.
    ///
    /// Every configured extension is scanned concurrently. A cancelled
    /// discovery keeps the files found so far.
    pub async fn discover(&mut self, token: &CancellationToken) -> Result<usize, MochaError> {
        self.tree.clear();
        self.tree
            .add_root(Node::new(SEARCHING_ID, SEARCHING_LABEL, Tag::Folder));

        let handles: Vec<_> = self
            .config
            .test_extensions
            .iter()
            .map(|extension| {
                let finder = Arc::clone(&self.finder);
                let root = self.root.clone();
                let extension = extension.clone();
                let exclude = self.config.exclude.clone();
                tokio::task::spawn_blocking(move || {
                    finder.find_test_files(&root, &extension, &exclude)
                })
            })
            .collect();
        let pending = handles.len().max(1);
        let mut scans = stream::iter(handles).buffer_unordered(pending);

        let mut found = 0;
        loop {
            let next = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(found, "discovery cancelled");
                    break;
                }
                next = scans.next() => next,
            };
            let files = match next.map(|scan| scan.map_err(MochaError::from).collapse()) {
                Some(Ok(files)) => files,
                Some(Err(err)) => {
                    self.tree.remove(SEARCHING_ID);
                    return Err(err);
                }
                None => break,
            };
            tracing::debug!(files = files.len(), "scan finished");
            for file in files {
                self.add_suite(&file);
                found += 1;
            }
            self.tree.remove(SEARCHING_ID);
        }
        self.tree.remove(SEARCHING_ID);
        Ok(found)
    }

    /// Parse the source of `suite` and replace its children with one case
    /// per declared test. Returns the number of cases.
    pub async fn resolve_children(&mut self, suite: &str) -> Result<usize, MochaError> {
        let uri = match self.tree.get(suite) {
            Some(node) if node.tag == Tag::TestSuite => match &node.uri {
                Some(uri) => uri.clone(),
                None => return Ok(0),
            },
            _ => return Ok(0),
        };
        let text = tokio::fs::read_to_string(&uri)
            .await
            .map_err(|err| MochaError::io(&uri, err))?;

        self.tree.clear_children(suite);
        let mut count = 0;
        for entry in self.parser.parse(&text) {
            let case = Node::new(id::path_id(&uri, Some(&entry.name)), entry.name, Tag::Test)
                .with_uri(&uri)
                .with_range(line_range(&text, entry.start));
            self.tree.add_child(suite, case);
            count += 1;
        }
        tracing::debug!(suite, cases = count, "resolved children");
        Ok(count)
    }

    /// Resolve the children of every suite in the tree.
    pub async fn resolve_all(&mut self) -> Result<usize, MochaError> {
        let suites: Vec<String> = self
            .tree
            .walk()
            .into_iter()
            .filter(|(_, node)| node.tag == Tag::TestSuite && node.can_resolve_children)
            .map(|(_, node)| node.id.clone())
            .collect();
        let mut total = 0;
        for suite in suites {
            total += self.resolve_children(&suite).await?;
        }
        Ok(total)
    }

    /// Id of the node named by `target`: a node id, a folder label or a file
    /// path relative to the workspace root. Suites get their cases resolved
    /// so runs see them; with `case`, the id of that case is returned.
    pub async fn select_target(
        &mut self,
        target: &str,
        case: Option<&str>,
    ) -> Result<String, MochaError> {
        let selected = if self.tree.contains(target) {
            target.to_string()
        } else if let Some(folder) = self.tree.root_by_label(target) {
            folder.id.clone()
        } else {
            let suite = id::path_id(&self.root.join(target), None);
            if !self.tree.contains(&suite) {
                return Err(MochaError::UnknownTarget(target.to_string()));
            }
            suite
        };
        self.resolve_children(&selected).await?;

        let case = match case {
            Some(case) => case,
            None => return Ok(selected),
        };
        let case_id = self
            .tree
            .children(&selected)
            .find(|child| child.label == case)
            .map(|child| child.id.clone());
        case_id.ok_or_else(|| MochaError::UnknownTarget(format!("{} ({})", target, case)))
    }

    /// Register a case known without a discovery pass, creating its folder
    /// and suite as needed. Existing nodes are reused; a reused case takes the
    /// new `uri` and `range`.
    pub fn add_test_file(
        &mut self,
        file: &Path,
        case: &str,
        uri: impl Into<PathBuf>,
        range: Range,
    ) -> String {
        let uri = uri.into();
        let suite = self.add_suite_with_uri(file, uri.clone(), false);
        let case_id = id::path_id(file, Some(case));
        let node = Node::new(case_id.clone(), case, Tag::Test)
            .with_uri(&uri)
            .with_range(range);
        self.tree.add_child(&suite, node);
        if let Some(existing) = self.tree.get_mut(&case_id) {
            existing.uri = Some(uri);
            existing.range = Some(range);
        }
        case_id
    }

    /// Find or create the folder node grouping `file`, named after the file's
    /// working directory relative to the workspace root.
    pub fn test_root(&mut self, file: &Path) -> String {
        let relative_file = file.strip_prefix(&self.root).unwrap_or(file);
        let matching = self.config.matching(relative_file);
        let dir = self.workdir.resolve(
            &self.root,
            matching,
            self.config.use_ts_config,
            relative_file,
        );
        let label = match id::relative(&self.root, &dir) {
            relative if relative.is_empty() => id::ROOT_ID.to_string(),
            relative => relative,
        };

        if let Some(existing) = self.tree.root_by_label(&label) {
            return existing.id.clone();
        }
        self.tree
            .add_root(Node::new(label.clone(), label, Tag::Folder).with_uri(dir))
    }

    fn add_suite(&mut self, file: &Path) -> String {
        self.add_suite_with_uri(file, file.to_path_buf(), true)
    }

    fn add_suite_with_uri(&mut self, file: &Path, uri: PathBuf, resolvable: bool) -> String {
        let root = self.test_root(file);
        let label = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string_lossy().into_owned());
        let mut suite = Node::new(id::path_id(file, None), label, Tag::TestSuite).with_uri(uri);
        if resolvable {
            suite = suite.resolvable();
        }
        // add_child only fails for an unknown parent, and the root was just
        // looked up or created.
        self.tree
            .add_child(&root, suite)
            .unwrap_or_else(|| id::path_id(file, None))
    }
}
