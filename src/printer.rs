//! Terminal rendering of the test tree and of run outcomes.
use colored::Colorize;
use difference::{Changeset, Difference};

use crate::{
    cli::OnlyOpt,
    executor::{Outcome, TestMessage, TestRun},
    tree::{Node, Tag, Tree},
};

/// Line-numbered diff from the expected to the actual output.
pub fn gen_diff(expected: &str, actual: &str) -> String {
    let changes = Changeset::new(expected, actual, "\n");
    let (mut expected_line, mut actual_line) = (0, 0);
    let mut lines = Vec::new();

    for diff in &changes.diffs {
        let (text, in_expected, in_actual) = match diff {
            Difference::Same(text) => (text, true, true),
            Difference::Rem(text) => (text, true, false),
            Difference::Add(text) => (text, false, true),
        };
        for line in text.split('\n') {
            let left = lineno(in_expected, &mut expected_line);
            let right = lineno(in_actual, &mut actual_line);
            let (marker, line) = match diff {
                Difference::Add(_) => ("+".green(), line.green()),
                Difference::Rem(_) => ("-".red(), line.red()),
                Difference::Same(_) => (" ".normal(), line.dimmed()),
            };
            lines.push(format!("{:>3} {:>3}│{}{}", left, right, marker, line));
        }
    }

    lines.join("\n").trim_end().to_string()
}

/// Advance `counter` and render it, or nothing for a line missing on that side.
fn lineno(present: bool, counter: &mut usize) -> String {
    if !present {
        return String::new();
    }
    *counter += 1;
    counter.to_string()
}

fn status_marker(node: &Node, run: Option<&TestRun>) -> String {
    if node.busy {
        return "…".yellow().to_string();
    }
    match run.and_then(|run| run.outcome(&node.id)) {
        Some(Outcome::Passed(_)) => "✓".green().to_string(),
        Some(Outcome::Failed(..)) => "✗".red().to_string(),
        None => match node.tag {
            Tag::Folder => "▸".blue().to_string(),
            Tag::TestSuite => "•".normal().to_string(),
            Tag::Test => "○".dimmed().to_string(),
        },
    }
}

/// Indented listing of the tree, annotated with the outcomes of `run`.
pub fn tree(tree: &Tree, run: Option<&TestRun>) -> String {
    let mut buf = String::new();
    for (depth, node) in tree.walk() {
        let label = match node.tag {
            Tag::Folder => node.label.bold().to_string(),
            Tag::TestSuite | Tag::Test => node.label.clone(),
        };
        buf.push_str(&format!(
            "{}{} {}\n",
            "  ".repeat(depth),
            status_marker(node, run),
            label
        ));
    }
    buf
}

fn failure_details(message: &TestMessage, show_diff: bool) -> String {
    let mut buf = String::new();
    for line in message.message.as_str().lines().filter(|l| !l.trim().is_empty()) {
        buf.push_str(&format!("    {}\n", line.dimmed()));
    }
    if let Some(location) = &message.location {
        buf.push_str(&format!(
            "    at {}:{}:{}\n",
            location.uri.display(),
            location.position.line + 1,
            location.position.character + 1
        ));
    }
    if show_diff {
        if let (Some(expected), Some(actual)) = (&message.expected_output, &message.actual_output) {
            buf.push_str(&gen_diff(expected, actual));
            buf.push('\n');
        }
    }
    buf
}

/// Outcome of every node in `run`, followed by a pass/fail count.
pub fn summary(tree: &Tree, run: &TestRun, show_diff: bool, only: Option<&OnlyOpt>) -> String {
    let mut buf = String::with_capacity(500);
    let (mut pass, mut fail) = (0, 0);

    for id in run.include() {
        let label = tree.get(id).map_or(id.as_str(), |node| node.label.as_str());
        match run.outcome(id) {
            Some(Outcome::Passed(duration)) => {
                pass += 1;
                if matches!(only, None | Some(OnlyOpt::Pass)) {
                    buf.push_str(&format!(
                        "{} {} {}\n",
                        "✓".green(),
                        label.green(),
                        format!("({:.0?})", duration).dimmed()
                    ));
                }
            }
            Some(Outcome::Failed(message, duration)) => {
                fail += 1;
                if matches!(only, None | Some(OnlyOpt::Fail)) {
                    buf.push_str(&format!(
                        "{} {} {}\n",
                        "✗".red(),
                        label.red(),
                        format!("({:.0?})", duration).dimmed()
                    ));
                    buf.push_str(&failure_details(message, show_diff));
                }
            }
            None => {
                if only.is_none() {
                    buf.push_str(&format!("{} {}\n", "?".yellow(), label.yellow()));
                }
            }
        }
    }
    buf.push_str(&format!(
        "  {} / {}\n",
        format!("{} passing", pass).green(),
        format!("{} failing", fail).red()
    ));
    buf
}
