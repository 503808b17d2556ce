//! The in-memory test forest.
//!
//! The [Tree] owns every node. Each node keeps the ordered ids of its
//! children and the id of its parent; the parent link is only used for
//! traversal and never keeps a node alive.
use std::{collections::HashMap, fmt, path::PathBuf};

/// Tag that decides how a node is identified and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A single test case.
    Test,
    /// A test file.
    TestSuite,
    /// A working directory grouping test files.
    Folder,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Test => "test",
            Tag::TestSuite => "testSuite",
            Tag::Folder => "folder",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-based position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// An element of the test hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// File (or folder) backing this node.
    pub uri: Option<PathBuf>,
    /// Declaration span, only set for cases.
    pub range: Option<Range>,
    pub tag: Tag,
    /// True while an open run has not recorded an outcome for this node.
    pub busy: bool,
    /// Children are produced lazily by parsing the source.
    pub can_resolve_children: bool,
    children: Vec<String>,
    parent: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, tag: Tag) -> Self {
        Node {
            id: id.into(),
            label: label.into(),
            uri: None,
            range: None,
            tag,
            busy: false,
            can_resolve_children: false,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<PathBuf>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn resolvable(mut self) -> Self {
        self.can_resolve_children = true;
        self
    }

    /// Ids of the children in discovery order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// Forest of folder roots and everything below them.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Child nodes of `id` in discovery order.
    pub fn children<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.nodes.get(child))
    }

    pub fn parent(&self, id: &str) -> Option<&Node> {
        self.nodes
            .get(id)
            .and_then(|node| node.parent.as_deref())
            .and_then(|parent| self.nodes.get(parent))
    }

    /// Top-level node carrying `label`.
    pub fn root_by_label(&self, label: &str) -> Option<&Node> {
        self.roots
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.label == label)
    }

    /// Add a top-level node. An existing node with the same id is kept.
    pub fn add_root(&mut self, node: Node) -> String {
        let id = node.id.clone();
        if !self.nodes.contains_key(&id) {
            self.roots.push(id.clone());
            self.nodes.insert(id.clone(), node);
        }
        id
    }

    /// Add `node` under `parent`, reusing a node that already carries the same
    /// id. Returns `None` when `parent` is unknown.
    pub fn add_child(&mut self, parent: &str, mut node: Node) -> Option<String> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = node.id.clone();
        if let Some(existing) = self.nodes.get(&id) {
            if existing.parent.as_deref() == Some(parent) {
                return Some(id);
            }
            // Known under another parent: move it here.
            self.detach(&id);
            if let Some(existing) = self.nodes.get_mut(&id) {
                existing.parent = Some(parent.to_string());
            }
        } else {
            node.parent = Some(parent.to_string());
            self.nodes.insert(id.clone(), node);
        }
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id.clone());
        }
        Some(id)
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        self.detach(id);
        let node = self.nodes.remove(id)?;
        for child in &node.children {
            self.remove_subtree(child);
        }
        Some(node)
    }

    /// Remove every descendant of `id`, keeping the node itself.
    pub fn clear_children(&mut self, id: &str) {
        let children = match self.nodes.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in &children {
            self.remove_subtree(child);
        }
    }

    pub fn set_busy(&mut self, id: &str, busy: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.busy = busy;
        }
    }

    /// Ids of every busy node.
    pub fn busy(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .filter(|(_, node)| node.busy)
            .map(|(_, node)| node.id.as_str())
            .collect()
    }

    /// Depth-first traversal in discovery order, paired with each node's depth.
    pub fn walk(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &str)> =
            self.roots.iter().rev().map(|id| (0, id.as_str())).collect();
        while let Some((depth, id)) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push((depth, node));
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c.as_str())));
            }
        }
        out
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for child in &node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Unlink `id` from its parent (or from the roots) without removing it.
    fn detach(&mut self, id: &str) {
        let parent = self.nodes.get(id).and_then(|node| node.parent.clone());
        match parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }
    }
}
