//! The runner's structured result report.
//!
//! The report is the JSON rendition of a JUnit document as produced by an
//! XML-to-JSON converter: attributes are prefixed with `@_`, numbers usually
//! arrive as strings and a suite with one case carries an object instead of
//! an array.
//!
//! ```text
//! { "testsuite": {
//!     "@_failures": "1", "@_errors": "0",
//!     "testcase": [
//!       { "@_name": "adds", "@_classname": "math adds", "@_time": "0.003",
//!         "failure": "AssertionError: expected 1 to equal 2" }
//!     ] } }
//! ```
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::errors::MochaError;

/// Report for one runner invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Report {
    pub testsuite: SuiteResult,
}

/// Aggregate counts and case results of a suite.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SuiteResult {
    #[serde(rename = "@_failures", default, deserialize_with = "count")]
    pub failures: u64,
    #[serde(rename = "@_errors", default, deserialize_with = "count")]
    pub errors: u64,
    #[serde(rename = "testcase", default, deserialize_with = "one_or_many")]
    pub cases: Vec<CaseResult>,
}

/// Result of a single case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseResult {
    #[serde(rename = "@_name", default)]
    pub name: String,
    #[serde(rename = "@_classname", default)]
    pub classname: String,
    /// Elapsed seconds.
    #[serde(rename = "@_time", default, deserialize_with = "seconds")]
    pub time: f64,
    #[serde(default)]
    pub failure: Option<Failure>,
}

/// Failure payload of a case: either the element's text or an element with
/// attributes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Failure {
    Text(String),
    Element {
        #[serde(rename = "#text", default)]
        text: Option<String>,
        #[serde(rename = "@_message", default)]
        message: Option<String>,
    },
}

impl Report {
    pub fn from_json(json: &str) -> Result<Self, MochaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Failures plus errors.
    pub fn error_total(&self) -> u64 {
        self.testsuite.failures + self.testsuite.errors
    }
}

impl CaseResult {
    /// The failure text, if the case failed. An empty failure is no failure.
    pub fn failure_message(&self) -> Option<&str> {
        let text = match self.failure.as_ref()? {
            Failure::Text(text) => text.as_str(),
            Failure::Element { text, message } => {
                text.as_deref().or(message.as_deref()).unwrap_or_default()
            }
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn duration(&self) -> Duration {
        seconds_to_duration(self.time)
    }
}

/// Convert reported seconds, treating garbage as zero.
pub fn seconds_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Num(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn scalar<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(de)? {
        Some(Scalar::Num(n)) => Some(n),
        Some(Scalar::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn count<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(scalar(de)?.filter(|n| *n > 0.0).map(|n| n as u64).unwrap_or(0))
}

fn seconds<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(scalar(de)?.filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn one_or_many<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(de)? {
        Some(OneOrMany::Many(all)) => all,
        Some(OneOrMany::One(one)) => vec![one],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_case_is_a_one_element_sequence() {
        let report = Report::from_json(
            r#"{"testsuite": {"@_failures": "0", "@_errors": "0",
                "testcase": {"@_name": "adds", "@_classname": "math adds", "@_time": "0.5"}}}"#,
        )
        .unwrap();
        assert_eq!(report.testsuite.cases.len(), 1);
        assert_eq!(report.testsuite.cases[0].classname, "math adds");
        assert_eq!(report.testsuite.cases[0].duration(), Duration::from_millis(500));
        assert_eq!(report.error_total(), 0);
    }

    #[test]
    fn numbers_may_be_numeric_or_strings() {
        let report = Report::from_json(
            r#"{"testsuite": {"@_failures": 2, "@_errors": "1", "testcase": [
                {"@_name": "a", "@_classname": "a", "@_time": 0.25},
                {"@_name": "b", "@_classname": "b", "@_time": "oops"}]}}"#,
        )
        .unwrap();
        assert_eq!(report.error_total(), 3);
        assert_eq!(report.testsuite.cases[0].time, 0.25);
        assert_eq!(report.testsuite.cases[1].time, 0.0);
    }

    #[test]
    fn failure_text_comes_from_string_or_element() {
        let report = Report::from_json(
            r##"{"testsuite": {"@_failures": "3", "@_errors": "0", "testcase": [
                {"@_name": "a", "@_classname": "a", "@_time": "0", "failure": "boom"},
                {"@_name": "b", "@_classname": "b", "@_time": "0",
                 "failure": {"@_message": "short", "#text": "long trace"}},
                {"@_name": "c", "@_classname": "c", "@_time": "0",
                 "failure": {"@_message": "only message"}},
                {"@_name": "d", "@_classname": "d", "@_time": "0", "failure": ""}]}}"##,
        )
        .unwrap();
        let messages: Vec<_> = report
            .testsuite
            .cases
            .iter()
            .map(CaseResult::failure_message)
            .collect();
        assert_eq!(
            messages,
            vec![Some("boom"), Some("long trace"), Some("only message"), None]
        );
    }

    #[test]
    fn missing_cases_are_empty() {
        let report =
            Report::from_json(r#"{"testsuite": {"@_failures": "0", "@_errors": "0"}}"#).unwrap();
        assert!(report.testsuite.cases.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            Report::from_json("not json"),
            Err(MochaError::Report(_))
        ));
    }
}
