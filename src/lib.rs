//! mocha-mono keeps a tree of mocha tests in sync with the source and with the
//! results of running them.
//!
//! Tests are found by scanning the workspace for test files, presented as a
//! hierarchy of folders, files and cases, executed through an external test
//! runner, and the runner's report is mapped back onto the hierarchy so every
//! node shows whether it passed, how long it took and, for failures, where and
//! why it failed.
//!
//! ## Installation
//!
//! ```bash
//! cargo install --path .
//! ```
//!
//! ## The Test Tree
//! Every node carries exactly one tag:
//!   - `folder`: a working directory. Named after its path relative to the
//!     workspace root, or `<root>` for the root itself.
//!   - `testSuite`: a test file. Its id is the file path with `/` separators.
//!   - `test`: a case declared in a file, with id `<file path>-<case name>`.
//!
//! Folders and files are discovered eagerly; cases appear when a file is
//! expanded and its source is parsed.
//!
//! ## Configuration
//! A workspace is configured with a `mocha.toml` file. Every key is optional.
//! ```toml
//! # Suffixes of test files.
//! test_extensions = [".test.ts", ".test.js"]
//! # Never look for tests here.
//! exclude = "**/node_modules/**"
//! # Command that runs the tests and prints a JSON report.
//! # {root}, {file}, {name} and {mode} are replaced before running.
//! cmd = "npx mocha --reporter ./junit-json.js {file}"
//! # (Optional) Command used with --debug.
//! debug_cmd = "npx mocha --inspect-brk {file}"
//! # (Optional) File the report is written to instead of stdout.
//! report = "reports/results.json"
//! # (Optional) Timeout in seconds.
//! timeout = 120
//!
//! # Files matching `pattern` are grouped and run from `cwd`.
//! [[configs]]
//! pattern = "packages/api/**"
//! cwd = "packages/api"
//! ```
//!
//! ## Running Tests
//! Running a node runs everything it affects:
//!   - a case runs with its whole file, since the runner works per file, and
//!     every case of the file is updated;
//!   - a file runs with all its known cases;
//!   - a folder is handed to the runner as is.
//!
//! ```bash
//! mocha-mono list
//! mocha-mono run test/math.test.ts
//! mocha-mono --diff run test/math.test.ts --case adds
//! mocha-mono reconcile test/math.test.ts report.json
//! ```
//!
//! ## Reports
//! The runner must emit the JSON form of a JUnit suite, see [report]. Cases
//! are matched to tree nodes by name, which tolerates the decoration test
//! runners add to class names. Failure messages are searched for a
//! `file:line:column` location in the test file, an
//! `expected X to equal Y` assertion and stack frames, which are rendered as
//! links.
pub mod cli;
pub mod discovery;
pub mod errors;
pub mod executor;
pub mod id;
pub mod picker;
pub mod printer;
pub mod reconciler;
pub mod report;
pub mod tree;
