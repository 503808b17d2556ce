use futures::future::BoxFuture;
use mocha_mono::{
    errors::MochaError,
    executor::{CommandRunner, Context, Invocation, Outcome, RunMode, RunRequest, Runner},
    id,
    picker::toml::Config,
    report::Report,
    tree::{Position, Tag},
};
use pretty_assertions::assert_eq;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

const MATH: &str = r#"import { expect } from 'chai';

describe('math', () => {
  it('adds', () => {
    expect(add(1, 1)).to.equal(3);
  });

  it('subtracts', () => {
    expect(1 - 1).to.equal(0);
  });
});
"#;

const STRINGS: &str = r#"describe('strings', () => {
  it('joins', () => {});
});
"#;

/// Returns a canned report and remembers what it was asked to run.
struct CannedRunner {
    report: String,
    seen: Mutex<Vec<Invocation>>,
}

impl CannedRunner {
    fn new(report: &str) -> Self {
        CannedRunner {
            report: report.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Invocation> {
        self.seen.lock().unwrap().clone()
    }
}

impl Runner for CannedRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        _token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Report, MochaError>> {
        self.seen.lock().unwrap().push(invocation.clone());
        Box::pin(async move { Report::from_json(&self.report) })
    }
}

fn workspace() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    for (path, text) in &[
        ("test/math.test.ts", MATH),
        ("test/strings.test.ts", STRINGS),
        ("node_modules/dep/ignored.test.ts", STRINGS),
    ] {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    (dir, root)
}

async fn discovered(root: &Path) -> Context {
    let mut ctx = Context::new(root, Config::default());
    let found = ctx.discover(&CancellationToken::new()).await.unwrap();
    assert_eq!(found, 2);
    ctx.resolve_all().await.unwrap();
    ctx
}

fn file_id(root: &Path, file: &str) -> String {
    id::path_id(&root.join(file), None)
}

fn case_id(root: &Path, file: &str, case: &str) -> String {
    id::path_id(&root.join(file), Some(case))
}

const ADDS_FAILS: &str = r#"{"testsuite": {"@_failures": "1", "@_errors": "0", "testcase": [
    {"@_name": "math adds", "@_classname": "math adds", "@_time": "0.004",
     "failure": "AssertionError: expected 2 to equal 3\n    at Context.<anonymous> (test/math.test.ts:5:23)"},
    {"@_name": "math subtracts", "@_classname": "math subtracts", "@_time": "0.001"}
]}}"#;

#[tokio::test]
async fn discovery_builds_folders_suites_and_cases() {
    let (_dir, root) = workspace();
    let ctx = discovered(&root).await;

    assert_eq!(ctx.tree.roots(), &["<root>".to_string()]);
    let suites: Vec<_> = ctx.tree.children("<root>").map(|n| n.label.clone()).collect();
    let mut sorted = suites.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["math.test.ts", "strings.test.ts"]);

    let math = file_id(&root, "test/math.test.ts");
    let cases: Vec<_> = ctx
        .tree
        .children(&math)
        .map(|n| (n.label.clone(), n.tag, n.range.map(|r| r.start)))
        .collect();
    assert_eq!(
        cases,
        vec![
            ("adds".to_string(), Tag::Test, Some(Position::new(3, 2))),
            ("subtracts".to_string(), Tag::Test, Some(Position::new(7, 2))),
        ]
    );
}

#[tokio::test]
async fn rediscovery_and_reexpansion_do_not_duplicate() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let before = ctx.tree.len();

    let math = file_id(&root, "test/math.test.ts");
    ctx.resolve_children(&math).await.unwrap();
    assert_eq!(ctx.tree.len(), before);

    ctx.discover(&CancellationToken::new()).await.unwrap();
    ctx.resolve_all().await.unwrap();
    assert_eq!(ctx.tree.len(), before);
    assert!(!ctx.tree.contains(mocha_mono::discovery::SEARCHING_ID));
}

#[tokio::test]
async fn file_run_reconciles_every_case() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let math = file_id(&root, "test/math.test.ts");
    let adds = case_id(&root, "test/math.test.ts", "adds");
    let subtracts = case_id(&root, "test/math.test.ts", "subtracts");

    let runner = CannedRunner::new(ADDS_FAILS);
    let run = ctx
        .execute_test(&RunRequest::single(math.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mode, RunMode::File);
    assert_eq!(calls[0].file, root.join("test/math.test.ts"));
    assert_eq!(calls[0].label, "math.test.ts");

    match run.outcome(&adds) {
        Some(Outcome::Failed(message, _)) => {
            let location = message.location.as_ref().unwrap();
            assert_eq!(location.position, Position::new(4, 22));
            assert_eq!(message.expected_output.as_deref(), Some("2"));
            assert_eq!(message.actual_output.as_deref(), Some("3"));
        }
        other => panic!("adds should have failed, got {:?}", other),
    }
    assert!(matches!(run.outcome(&subtracts), Some(Outcome::Passed(_))));
    assert!(run.outcome(&math).unwrap().is_failed());
    assert!(run.is_ended());
    assert!(ctx.tree.busy().is_empty());
}

#[tokio::test]
async fn case_run_covers_the_whole_suite_only() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let adds = case_id(&root, "test/math.test.ts", "adds");
    let subtracts = case_id(&root, "test/math.test.ts", "subtracts");
    let joins = case_id(&root, "test/strings.test.ts", "joins");

    let runner = CannedRunner::new(ADDS_FAILS);
    let run = ctx
        .execute_test(&RunRequest::single(adds.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.include(), &[adds.clone(), subtracts.clone()]);
    assert_eq!(runner.calls()[0].mode, RunMode::Suite);
    assert_eq!(runner.calls()[0].label, "adds");
    assert!(run.outcome(&adds).unwrap().is_failed());
    assert!(matches!(run.outcome(&subtracts), Some(Outcome::Passed(_))));
    assert!(run.outcome(&joins).is_none());
}

#[tokio::test]
async fn passing_report_passes_the_selection() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let strings = file_id(&root, "test/strings.test.ts");

    let runner = CannedRunner::new(
        r#"{"testsuite": {"@_failures": "0", "@_errors": "0", "testcase":
            {"@_name": "strings joins", "@_classname": "strings joins", "@_time": "0.5"}}}"#,
    );
    let run = ctx
        .execute_test(&RunRequest::single(strings.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        run.outcome(&strings),
        Some(Outcome::Passed(d)) if d.as_millis() == 500
    ));
}

#[tokio::test]
async fn errors_fail_the_selection_with_every_message() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let math = file_id(&root, "test/math.test.ts");

    let runner = CannedRunner::new(
        r#"{"testsuite": {"@_failures": "0", "@_errors": "1", "testcase": [
            {"@_name": "adds", "@_classname": "math adds", "@_time": "0.25", "failure": "first"},
            {"@_name": "subtracts", "@_classname": "math subtracts", "@_time": "0.25"},
            {"@_name": "adds", "@_classname": "math adds", "@_time": "0.5", "failure": "third"}
        ]}}"#,
    );
    let run = ctx
        .execute_test(&RunRequest::single(math.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();
    match run.outcome(&math) {
        Some(Outcome::Failed(message, duration)) => {
            assert_eq!(message.message.as_str(), "first\n\nthird");
            assert_eq!(duration.as_millis(), 1000);
        }
        other => panic!("math should have failed, got {:?}", other),
    }
}

#[tokio::test]
async fn unmatched_cases_are_dropped() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let strings = file_id(&root, "test/strings.test.ts");
    let joins = case_id(&root, "test/strings.test.ts", "joins");

    // The report describes a case the tree doesn't know; its failure only
    // shows on the selected file.
    let runner = CannedRunner::new(
        r#"{"testsuite": {"@_failures": "1", "@_errors": "0", "testcase":
            {"@_name": "splits", "@_classname": "text splits", "@_time": "0.1", "failure": "boom"}}}"#,
    );
    let run = ctx
        .execute_test(&RunRequest::single(strings.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.outcomes().len(), 1);
    assert!(run.outcome(&strings).unwrap().is_failed());
    assert!(run.outcome(&joins).is_none());
    assert!(!ctx.tree.get(&joins).unwrap().busy);
}

#[tokio::test]
async fn only_single_selections_run() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let runner = CannedRunner::new(ADDS_FAILS);

    let none = RunRequest::default();
    let both = RunRequest {
        include: vec![
            file_id(&root, "test/math.test.ts"),
            file_id(&root, "test/strings.test.ts"),
        ],
        ..RunRequest::default()
    };
    let unknown = RunRequest::single("nowhere");
    for request in &[none, both, unknown] {
        let run = ctx
            .execute_test(request, &CancellationToken::new(), &runner)
            .await
            .unwrap();
        assert!(run.is_none());
    }
    assert!(runner.calls().is_empty());
    assert!(ctx.tree.busy().is_empty());
}

#[tokio::test]
async fn nodes_without_source_do_not_run() {
    let mut ctx = Context::new("/w", Config::default());
    ctx.tree
        .add_root(mocha_mono::tree::Node::new("orphan", "orphan", Tag::Folder));
    let runner = CannedRunner::new(ADDS_FAILS);

    let run = ctx
        .execute_test(&RunRequest::single("orphan"), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();
    assert!(runner.calls().is_empty());
    assert!(run.outcomes().is_empty());
    assert!(run.is_ended());
    assert!(!ctx.tree.get("orphan").unwrap().busy);
}

#[tokio::test]
async fn command_runner_end_to_end() {
    let (_dir, root) = workspace();
    fs::write(root.join("report.json"), ADDS_FAILS).unwrap();
    let mut ctx = discovered(&root).await;
    let math = file_id(&root, "test/math.test.ts");

    let runner = CommandRunner::new("cat report.json; exit 1");
    let run = ctx
        .execute_test(&RunRequest::single(math.clone()), &CancellationToken::new(), &runner)
        .await
        .unwrap()
        .unwrap();
    assert!(run.outcome(&math).unwrap().is_failed());
    assert_eq!(run.failed_ids().len(), 2);
}

#[tokio::test]
async fn failed_runner_releases_the_nodes() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let math = file_id(&root, "test/math.test.ts");

    let err = ctx
        .execute_test(
            &RunRequest::single(math),
            &CancellationToken::new(),
            &CommandRunner::new("echo 'not a report'"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MochaError::Runner(_)));
    assert!(ctx.tree.busy().is_empty());
}

#[tokio::test]
async fn reports_from_elsewhere_can_be_reconciled() {
    let (_dir, root) = workspace();
    let mut ctx = discovered(&root).await;
    let id = ctx
        .select_target("test/math.test.ts", Some("subtracts"))
        .await
        .unwrap();
    assert_eq!(id, case_id(&root, "test/math.test.ts", "subtracts"));

    let run = ctx.reconcile(&id, &Report::from_json(ADDS_FAILS).unwrap()).unwrap();
    assert!(run.outcome(&case_id(&root, "test/math.test.ts", "adds")).unwrap().is_failed());
    assert!(run.is_ended());

    assert!(matches!(
        ctx.select_target("test/missing.test.ts", None).await,
        Err(MochaError::UnknownTarget(_))
    ));
}
