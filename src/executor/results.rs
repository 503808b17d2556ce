use std::{path::PathBuf, time::Duration};

use crate::tree::{Position, Tree};

/// Place in a source file a failure points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub uri: PathBuf,
    pub position: Position,
}

/// Body of a failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageText {
    Plain(String),
    /// Markdown with inline HTML, used when stack frames were turned into links.
    Markdown(String),
}

impl MessageText {
    pub fn as_str(&self) -> &str {
        match self {
            MessageText::Plain(text) | MessageText::Markdown(text) => text,
        }
    }
}

/// Everything known about why a node failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMessage {
    pub message: MessageText,
    pub location: Option<Location>,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
}

impl TestMessage {
    pub fn plain(message: impl Into<String>) -> Self {
        TestMessage {
            message: MessageText::Plain(message.into()),
            location: None,
            expected_output: None,
            actual_output: None,
        }
    }
}

/// Outcome recorded for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed(Duration),
    Failed(TestMessage, Duration),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(..))
    }
}

/// A run session over a fixed set of included nodes.
///
/// Outcomes are kept in the order they were recorded. A node may receive
/// more than one outcome; [TestRun::outcome] reports the latest.
#[derive(Debug)]
pub struct TestRun {
    include: Vec<String>,
    outcomes: Vec<(String, Outcome)>,
    ended: bool,
}

impl TestRun {
    pub(crate) fn new(include: Vec<String>) -> Self {
        TestRun {
            include,
            outcomes: Vec::new(),
            ended: false,
        }
    }

    /// Ids the session was opened for.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn passed(&mut self, id: &str, duration: Duration) {
        self.record(id, Outcome::Passed(duration));
    }

    pub fn failed(&mut self, id: &str, message: TestMessage, duration: Duration) {
        self.record(id, Outcome::Failed(message, duration));
    }

    /// Close the session. Nodes it included stop being busy.
    pub fn end(&mut self, tree: &mut Tree) {
        if self.ended {
            return;
        }
        for id in &self.include {
            tree.set_busy(id, false);
        }
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn outcomes(&self) -> &[(String, Outcome)] {
        &self.outcomes
    }

    /// Latest outcome recorded for `id`.
    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(node, _)| node == id)
            .map(|(_, outcome)| outcome)
    }

    /// Ids whose latest outcome is a failure, in the order first recorded.
    pub fn failed_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for (id, _) in &self.outcomes {
            if !ids.contains(&id.as_str())
                && self.outcome(id).map_or(false, Outcome::is_failed)
            {
                ids.push(id.as_str());
            }
        }
        ids
    }

    fn record(&mut self, id: &str, outcome: Outcome) {
        if self.ended {
            tracing::warn!(id, "outcome recorded after the run ended; ignoring");
            return;
        }
        self.outcomes.push((id.to_string(), outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Tag};

    #[test]
    fn latest_outcome_wins_and_end_clears_busy() {
        let mut tree = Tree::new();
        tree.add_root(Node::new("f", "f", Tag::Folder));
        tree.set_busy("f", true);

        let mut run = TestRun::new(vec!["f".to_string()]);
        run.passed("f", Duration::ZERO);
        run.failed("f", TestMessage::plain("boom"), Duration::ZERO);
        assert!(run.outcome("f").unwrap().is_failed());
        assert_eq!(run.failed_ids(), vec!["f"]);

        run.end(&mut tree);
        assert!(run.is_ended());
        assert!(!tree.get("f").unwrap().busy);

        run.passed("f", Duration::ZERO);
        assert_eq!(run.outcomes().len(), 2);
    }
}
