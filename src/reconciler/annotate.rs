use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use crate::{
    executor::{Location, MessageText, TestMessage},
    tree::Position,
};

/// Structured data scraped from a failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub location: Option<Location>,
    /// `(expected, actual)`.
    pub diff: Option<(String, String)>,
    pub message: MessageText,
}

impl Annotation {
    pub fn into_message(self) -> TestMessage {
        let (expected_output, actual_output) = match self.diff {
            Some((expected, actual)) => (Some(expected), Some(actual)),
            None => (None, None),
        };
        TestMessage {
            message: self.message,
            location: self.location,
            expected_output,
            actual_output,
        }
    }
}

/// Turns a runner's failure text into an [Annotation]. Extraction that fails
/// leaves the corresponding field empty.
pub trait Annotator: Send + Sync {
    /// `file` is the test file the run was started for.
    fn annotate(&self, message: &str, file: &Path) -> Annotation;
}

/// `expected 'A' to equal 'B'`
static DIFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"expected (.*) to .*? (.*)").expect("diff pattern"));

/// `at fn_name (file:///path/to/file.ts:740:24)`
static STACK_FRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(at [^()]+) \((file://[^:]+):([0-9]+):([0-9]+)\)").expect("frame pattern")
});

/// Characters escaped as HTML entities in markdown messages.
static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{00A0}-\u{9999}<>&]").expect("markup pattern"));

/// Reads chai/mocha assertion output.
#[derive(Debug, Default, Clone, Copy)]
pub struct MochaAnnotator;

impl Annotator for MochaAnnotator {
    fn annotate(&self, message: &str, file: &Path) -> Annotation {
        Annotation {
            location: location(message, file),
            diff: diff(message),
            message: format_message(message),
        }
    }
}

/// First `<basename>:<line>:<column>` of `file` in `message`, made zero-based.
pub fn location(message: &str, file: &Path) -> Option<Location> {
    let base = file.file_name()?.to_string_lossy();
    let pattern = Regex::new(&format!("{}:([0-9]+):([0-9]+)", regex::escape(&base))).ok()?;
    let caps = pattern.captures(message)?;
    let line: u32 = caps[1].parse().ok()?;
    let character: u32 = caps[2].parse().ok()?;
    Some(Location {
        uri: file.to_path_buf(),
        position: Position::new(line.checked_sub(1)?, character.checked_sub(1)?),
    })
}

/// Expected and actual values of an `expected X to ... Y` assertion.
pub fn diff(message: &str) -> Option<(String, String)> {
    let caps = DIFF.captures(message)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Render messages carrying stack frames as markdown with clickable frames.
/// Anything else is passed through unchanged.
pub fn format_message(message: &str) -> MessageText {
    if !STACK_FRAME.is_match(message) {
        return MessageText::Plain(message.to_string());
    }
    let escaped = MARKUP.replace_all(message, |caps: &Captures| {
        let c = caps[0].chars().next().unwrap_or_default();
        format!("&#{};", c as u32)
    });
    let broken = escaped.replace('\n', "<br/>\n");
    let linked = STACK_FRAME.replace_all(&broken, |caps: &Captures| {
        let (frame, file, line, character) = (&caps[1], &caps[2], &caps[3], &caps[4]);
        format!(
            "{} ([{}:{}:{}]({}#L{}:{}))",
            frame, file, line, character, file, line, character
        )
    });
    MessageText::Markdown(linked.into_owned())
}
