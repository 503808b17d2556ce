use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;

use super::{
    command::{Invocation, Runner},
    mode::{start_run, RunMode, RunRequest},
    results::TestRun,
};
use crate::{
    errors::MochaError,
    picker::{
        toml::Config, ConfigWorkingDirectory, GlobFinder, MochaParser, SourceParser, TestFinder,
        WorkingDirectory,
    },
    reconciler::Reconciler,
    report::Report,
    tree::Tree,
};

/// Everything one workspace needs: its test tree, configuration and the
/// collaborators that discover, run and reconcile tests. Built once and
/// passed to every operation.
pub struct Context {
    /// Workspace root.
    pub root: PathBuf,
    pub config: Config,
    pub tree: Tree,
    pub(crate) finder: Arc<dyn TestFinder>,
    pub(crate) parser: Box<dyn SourceParser>,
    pub(crate) workdir: Box<dyn WorkingDirectory>,
    reconciler: Reconciler,
}

impl Context {
    /// A context with the default collaborators.
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Context {
            root: root.into(),
            config,
            tree: Tree::new(),
            finder: Arc::new(GlobFinder),
            parser: Box::new(MochaParser),
            workdir: Box::new(ConfigWorkingDirectory),
            reconciler: Reconciler::default(),
        }
    }

    pub fn with_finder(mut self, finder: impl TestFinder + 'static) -> Self {
        self.finder = Arc::new(finder);
        self
    }

    pub fn with_parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_working_directory(mut self, workdir: impl WorkingDirectory + 'static) -> Self {
        self.workdir = Box::new(workdir);
        self
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// What running node `id` would hand to a runner. `None` when the node is
    /// unknown or has no backing file.
    pub fn invocation(&self, id: &str) -> Option<Invocation> {
        let node = self.tree.get(id)?;
        Some(Invocation {
            root: self.root.clone(),
            file: node.uri.clone()?,
            label: node.label.clone(),
            mode: RunMode::from(node.tag),
            item: node.id.clone(),
        })
    }

    /// Run the single node named by `request`.
    ///
    /// Requests naming zero or several nodes, or an unknown node, are ignored
    /// and yield `None`. Otherwise the run is opened over everything the node
    /// affects. Nodes without a backing file end their run right away; all
    /// others are handed to `runner` and its report is reconciled into the
    /// run, which is returned ended.
    pub async fn execute_test(
        &mut self,
        request: &RunRequest,
        token: &CancellationToken,
        runner: &dyn Runner,
    ) -> Result<Option<TestRun>, MochaError> {
        let id = match request.include.as_slice() {
            [id] => id,
            _ => {
                tracing::debug!(selected = request.include.len(), "ignoring run request");
                return Ok(None);
            }
        };
        let mode = match self.tree.get(id) {
            Some(node) => RunMode::from(node.tag),
            None => return Ok(None),
        };

        let mut run = start_run(&mut self.tree, mode, id, request);
        let invocation = match self.invocation(id) {
            Some(invocation) => invocation,
            None => {
                run.end(&mut self.tree);
                return Ok(Some(run));
            }
        };

        match runner.run(&invocation, token).await {
            Ok(report) => {
                self.register_results(&invocation, &report, &mut run);
                Ok(Some(run))
            }
            Err(err) => {
                run.end(&mut self.tree);
                Err(err)
            }
        }
    }

    /// Reconcile `report` for `invocation` into `run` and end it.
    pub fn register_results(
        &mut self,
        invocation: &Invocation,
        report: &Report,
        run: &mut TestRun,
    ) {
        self.reconciler
            .register_results(&mut self.tree, invocation, report, run);
    }

    /// Reconcile a report produced outside this process for node `id`, as if
    /// `id` had just been run.
    pub fn reconcile(&mut self, id: &str, report: &Report) -> Result<TestRun, MochaError> {
        let invocation = self
            .invocation(id)
            .ok_or_else(|| MochaError::UnknownTarget(id.to_string()))?;
        let request = RunRequest::single(id);
        let mut run = start_run(&mut self.tree, invocation.mode, id, &request);
        self.register_results(&invocation, report, &mut run);
        Ok(run)
    }
}
