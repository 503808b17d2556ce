//! Maps a runner's report back onto the test tree.
//!
//! The report may come from a different process than the one that built the
//! tree, so cases are correlated by name through a [MatchPolicy] rather than
//! by any runner state. Failure text is mined for a location and an
//! expected/actual pair by an [Annotator].

mod annotate;
mod matcher;

pub use annotate::{diff, format_message, location, Annotation, Annotator, MochaAnnotator};
pub use matcher::{Candidate, ExactMatch, LooseMatch, MatchPolicy};

use std::{collections::HashSet, path::Path};

use crate::{
    executor::{Invocation, RunMode, TestMessage, TestRun},
    id,
    report::{self, CaseResult, Report},
    tree::Tree,
};

/// Writes report outcomes into a run session.
pub struct Reconciler {
    policy: Box<dyn MatchPolicy>,
    annotator: Box<dyn Annotator>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler::new(Box::new(LooseMatch), Box::new(MochaAnnotator))
    }
}

impl Reconciler {
    pub fn new(policy: Box<dyn MatchPolicy>, annotator: Box<dyn Annotator>) -> Self {
        Reconciler { policy, annotator }
    }

    /// Nodes a reported case should update. Cases are looked up among the
    /// siblings of `item` in suite mode and among its children in file mode;
    /// folder runs update no cases.
    pub fn matching_nodes(
        &self,
        tree: &Tree,
        file: &Path,
        item: &str,
        mode: RunMode,
        case: &CaseResult,
    ) -> Vec<String> {
        let file = file.to_string_lossy();
        let reported_id = id::make_id(&file, Some(&case.name));
        let scope = match mode {
            RunMode::Suite => match tree.parent(item) {
                Some(parent) => parent.id.as_str(),
                None => return Vec::new(),
            },
            RunMode::File => item,
            RunMode::Folder => return Vec::new(),
        };
        tree.children(scope)
            .filter(|child| {
                let candidate = Candidate {
                    id: &child.id,
                    case_name: id::case_name(&child.id, &file),
                };
                self.policy.is_match(&candidate, &reported_id, case)
            })
            .map(|child| child.id.clone())
            .collect()
    }

    /// Record the outcome of every reported case on its matching nodes, then
    /// the overall outcome on the invocation's item, and end the session.
    ///
    /// A node that failed during this pass is never marked passed afterwards.
    /// `item` fails when the report counts any failure or error; its message
    /// joins every case's failure text, empty ones included.
    pub fn register_results(
        &self,
        tree: &mut Tree,
        invocation: &Invocation,
        report: &Report,
        run: &mut TestRun,
    ) {
        let Invocation {
            file,
            label,
            mode,
            item,
            ..
        } = invocation;
        let (file, mode, item) = (file.as_path(), *mode, item.as_str());
        let suite = &report.testsuite;
        tracing::debug!(
            item,
            label = %label,
            %mode,
            cases = suite.cases.len(),
            failures = suite.failures,
            errors = suite.errors,
            "registering results"
        );

        let mut total_time = 0.0;
        let mut failure_list: Vec<&str> = Vec::with_capacity(suite.cases.len());
        let mut failed: HashSet<String> = HashSet::new();

        for case in &suite.cases {
            let failure = case.failure_message();
            failure_list.push(failure.unwrap_or_default());
            total_time += case.time;

            let matches = self.matching_nodes(tree, file, item, mode, case);
            if matches.is_empty() && mode != RunMode::Folder {
                tracing::warn!(
                    name = %case.name,
                    classname = %case.classname,
                    "reported case matches no test; dropping it"
                );
            }

            for node in matches {
                tree.set_busy(&node, false);
                match failure {
                    Some(message) => {
                        let message = self.annotator.annotate(message, file).into_message();
                        run.failed(&node, message, case.duration());
                        failed.insert(node);
                    }
                    None if failed.contains(&node) => {
                        tracing::trace!(node = %node, "already failed in this report");
                    }
                    None => run.passed(&node, case.duration()),
                }
            }
        }

        let total = report::seconds_to_duration(total_time);
        if report.error_total() > 0 {
            run.failed(item, TestMessage::plain(failure_list.join("\n")), total);
        } else {
            run.passed(item, total);
        }
        tree.set_busy(item, false);
        run.end(tree);
    }
}
