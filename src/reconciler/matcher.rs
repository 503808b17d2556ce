use crate::report::CaseResult;

/// A tree node considered for a reported case.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: &'a str,
    /// The node id with its `"<file>-"` prefix stripped.
    pub case_name: &'a str,
}

/// Decides whether a reported case belongs to a tree node.
pub trait MatchPolicy: Send + Sync {
    /// `reported_id` is the id the reported case would have in the tree.
    fn is_match(&self, candidate: &Candidate<'_>, reported_id: &str, case: &CaseResult) -> bool;
}

/// Matches by id, or by a case name that equals, ends or starts the reported
/// class name. Runners decorate class names with suite titles and parameter
/// suffixes, so a node may match several reported cases and a short case name
/// may match several nodes; every match is updated.
#[derive(Debug, Default, Clone, Copy)]
pub struct LooseMatch;

impl MatchPolicy for LooseMatch {
    fn is_match(&self, candidate: &Candidate<'_>, reported_id: &str, case: &CaseResult) -> bool {
        if candidate.id == reported_id {
            return true;
        }
        // A nameless case would be a prefix of everything.
        !candidate.case_name.is_empty()
            && (case.classname == candidate.case_name
                || case.classname.ends_with(candidate.case_name)
                || case.classname.starts_with(candidate.case_name))
    }
}

/// Matches only by id or exact class name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatch;

impl MatchPolicy for ExactMatch {
    fn is_match(&self, candidate: &Candidate<'_>, reported_id: &str, case: &CaseResult) -> bool {
        candidate.id == reported_id
            || (!candidate.case_name.is_empty() && case.classname == candidate.case_name)
    }
}
