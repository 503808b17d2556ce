use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::{Position, Range};

/// A test declared in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntryPoint {
    pub name: String,
    /// Where the declaration starts.
    pub start: Position,
}

/// Extracts test declarations from source text.
pub trait SourceParser: Send + Sync {
    fn parse(&self, text: &str) -> Vec<TestEntryPoint>;
}

/// `it("name", ...)`, `test('name', ...)` and `specify(`name`, ...)`, with
/// optional `.only`/`.skip`.
static TEST_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?:it|test|specify)(?:\.only|\.skip)?\s*\(\s*(?:'((?:[^'\\\n]|\\.)*)'|"((?:[^"\\\n]|\\.)*)"|`([^`]*)`)"#,
    )
    .expect("test call pattern")
});

/// Finds mocha-style test calls with a string literal name.
#[derive(Debug, Default, Clone, Copy)]
pub struct MochaParser;

impl SourceParser for MochaParser {
    fn parse(&self, text: &str) -> Vec<TestEntryPoint> {
        TEST_CALL
            .captures_iter(text)
            .filter_map(|caps| {
                let call = caps.get(0)?;
                let name = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
                Some(TestEntryPoint {
                    name: name.as_str().to_string(),
                    start: position_at(text, call.start()),
                })
            })
            .collect()
    }
}

/// Zero-based line and character of a byte offset.
pub fn position_at(text: &str, offset: usize) -> Position {
    let before = &text[..offset];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    Position::new(line as u32, before[line_start..].chars().count() as u32)
}

/// Range from `start` to the end of its line.
pub fn line_range(text: &str, start: Position) -> Range {
    let line_len = text
        .lines()
        .nth(start.line as usize)
        .map_or(start.character, |line| line.chars().count() as u32);
    Range {
        start,
        end: Position::new(start.line, line_len.max(start.character)),
    }
}
