//! Static task graph and its sequential runner.
//!
//! Requested tasks are expanded depth-first into one execution plan before
//! anything runs: dependencies first, in declared order, each task at most
//! once. The runner then walks the plan and stops at the first failure.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::checklist::Checklist;
use crate::config::{is_contained, BuildConfig};
use crate::error::{BuildGateError, Result};
use crate::file_list::FileList;
use crate::lint::{
    browser_lint_options, lint_scratch_dir, node_lint_options, LintGlobals, LintOptions,
    LintRunner,
};
use crate::shell::Shell;
use crate::test_runner::{run_browser_tests, run_node_tests, BrowserTestArgs, NodeTestArgs};
use crate::version::{ComparisonPolicy, VersionGate};

/// Task run when none is named
pub const DEFAULT_TASK: &str = "default";

/// What a task does once its dependencies are done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pure grouping task
    Nothing,
    /// Remove the generated directory
    Clean,
    /// Create a directory below the project root
    Directory(PathBuf),
    /// Gate the runtime version
    NodeVersion,
    LintNode,
    LintClient,
    TestNode,
    TestClient,
    Checklist(Checklist),
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    /// Only described tasks are listed
    pub description: Option<&'static str>,
    pub deps: Vec<String>,
    pub action: Action,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        description: Option<&'static str>,
        deps: &[&str],
        action: Action,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            deps: deps.iter().map(|d| d.to_string()).collect(),
            action,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// The stock build: lint, test, deploy and the checklists.
    pub fn standard(config: &BuildConfig) -> Self {
        let test_dir = config.test_file_dir();
        let test_dir_name = test_dir.to_string_lossy().replace('\\', "/");

        Self::new(vec![
            Task::new(test_dir_name.clone(), None, &[], Action::Directory(test_dir)),
            Task::new("clean", Some("Delete all generated files"), &[], Action::Clean),
            Task::new("default", Some("Build and test"), &["lint", "test"], Action::Nothing),
            Task::new("lint", Some("Lint everything"), &["lintNode", "lintClient"], Action::Nothing),
            Task::new("lintNode", None, &["nodeVersion"], Action::LintNode),
            Task::new("lintClient", None, &[], Action::LintClient),
            Task::new("test", Some("Test everything"), &["testNode", "testClient"], Action::Nothing),
            Task::new(
                "testNode",
                Some("Test server code"),
                &["nodeVersion", test_dir_name.as_str()],
                Action::TestNode,
            ),
            Task::new("testClient", Some("Test client code"), &[], Action::TestClient),
            Task::new(
                "deploy",
                Some("Deploy to Heroku"),
                &["default"],
                Action::Checklist(Checklist::Deploy),
            ),
            Task::new("nodeVersion", None, &[], Action::NodeVersion),
            Task::new(
                "integrate",
                Some("Integration checklist"),
                &["default"],
                Action::Checklist(Checklist::Integrate),
            ),
            Task::new(
                "episode",
                Some("End-of-episode checklist"),
                &[],
                Action::Checklist(Checklist::Episode),
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Tasks with a description, in declaration order
    pub fn described(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.description.is_some())
    }

    /// Expand `requested` into execution order.
    ///
    /// Fails on an unknown name (requested or as a dependency) or a cycle.
    pub fn plan(&self, requested: &[String]) -> Result<Vec<&Task>> {
        if let Some(unknown) = requested.iter().find(|name| self.get(name).is_none()) {
            return Err(BuildGateError::UnknownTask(unknown.clone()));
        }

        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        for name in requested {
            self.visit(name, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        visiting: &mut HashSet<String>,
        done: &mut HashSet<String>,
        order: &mut Vec<&'a Task>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(BuildGateError::Cycle(name.to_string()));
        }

        let task = self
            .get(name)
            .ok_or_else(|| BuildGateError::UnknownTask(name.to_string()))?;
        for dep in &task.deps {
            self.visit(dep, visiting, done, order)?;
        }

        visiting.remove(name);
        done.insert(name.to_string());
        order.push(task);
        Ok(())
    }
}

/// Everything task actions need from the outside world
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub root: PathBuf,
    pub config: BuildConfig,
    pub policy: ComparisonPolicy,
    pub shell: Shell,
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig, policy: ComparisonPolicy) -> Self {
        let root = root.into();
        Self {
            shell: Shell::new(&root),
            root,
            config,
            policy,
        }
    }

    fn generated_dir(&self) -> &Path {
        Path::new(&self.config.generated_dir)
    }

    fn files(&self, patterns: &crate::config::FilePatterns) -> Result<Vec<PathBuf>> {
        FileList::from_patterns(patterns)
            .and_then(|list| list.resolve(&self.root))
            .map_err(|e| BuildGateError::config(format!("{:#}", e)))
    }
}

/// Runs planned tasks one at a time; checklist text goes to `out`.
pub struct TaskRunner<W: Write> {
    graph: TaskGraph,
    ctx: TaskContext,
    out: W,
}

impl<W: Write> TaskRunner<W> {
    pub fn new(graph: TaskGraph, ctx: TaskContext, out: W) -> Self {
        Self { graph, ctx, out }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run `requested` (or the default task) with dependencies.
    ///
    /// Returns the names of the tasks that ran, in order.
    pub fn run(&mut self, requested: &[String]) -> Result<Vec<String>> {
        let requested = if requested.is_empty() {
            vec![DEFAULT_TASK.to_string()]
        } else {
            requested.to_vec()
        };

        let plan: Vec<(String, Action)> = self
            .graph
            .plan(&requested)?
            .into_iter()
            .map(|t| (t.name.clone(), t.action.clone()))
            .collect();
        debug!(
            "Execution plan: {:?}",
            plan.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
        );

        let mut ran = Vec::with_capacity(plan.len());
        for (name, action) in plan {
            info!("Running task {}", name);
            self.execute(&action).inspect_err(|e| {
                tracing::error!("Task {} failed: {}", name, e);
            })?;
            ran.push(name);
        }
        Ok(ran)
    }

    fn execute(&mut self, action: &Action) -> Result<()> {
        let ctx = &self.ctx;
        match action {
            Action::Nothing => Ok(()),
            Action::Clean => {
                if !is_contained(ctx.generated_dir()) {
                    return Err(BuildGateError::config(format!(
                        "Refusing to clean {:?}: not inside the project root",
                        ctx.generated_dir()
                    )));
                }
                let dir = ctx.root.join(ctx.generated_dir());
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                    info!("Removed {:?}", dir);
                }
                Ok(())
            }
            Action::Directory(path) => {
                fs::create_dir_all(ctx.root.join(path))?;
                Ok(())
            }
            Action::NodeVersion => {
                let output = ctx
                    .shell
                    .capture(&ctx.config.commands.version_check, "Could not determine Node version")?;
                let gate = VersionGate::new("Node", &ctx.config.required_node_version, ctx.policy);
                gate.verify(output.trim())?;
                info!(
                    "Node version {} satisfies {} [{}]",
                    output.trim(),
                    ctx.policy.qualifier(),
                    gate.required()
                );
                Ok(())
            }
            Action::LintNode => {
                let files = ctx.files(&ctx.config.node_files)?;
                lint(ctx, "node", &files, &node_lint_options())
            }
            Action::LintClient => {
                let files = ctx.files(&ctx.config.client_files)?;
                lint(ctx, "client", &files, &browser_lint_options())
            }
            Action::TestNode => {
                let args = NodeTestArgs {
                    command: ctx.config.commands.node_test.clone(),
                    files: ctx.files(&ctx.config.node_test_files)?,
                };
                run_node_tests(&ctx.shell, &args)
            }
            Action::TestClient => {
                let args = BrowserTestArgs {
                    command: ctx.config.commands.browser_test.clone(),
                };
                run_browser_tests(&ctx.shell, &args, &ctx.config.supported_browsers)
            }
            Action::Checklist(checklist) => {
                checklist.print_to(&mut self.out)?;
                Ok(())
            }
        }
    }
}

fn lint(ctx: &TaskContext, name: &str, files: &[PathBuf], options: &LintOptions) -> Result<()> {
    let runner = LintRunner::new(
        &ctx.shell,
        &ctx.config.commands.lint,
        lint_scratch_dir(ctx.generated_dir()),
    );
    if runner.validate_file_list(name, files, options, &LintGlobals::new())? {
        Ok(())
    } else {
        Err(BuildGateError::lint("Lint failed"))
    }
}
