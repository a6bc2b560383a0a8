// ABOUTME: Build engine: task registration, lifecycle hooks, and target execution
// ABOUTME: Brackets traversal with build setup/teardown and drives the chosen executor

use futures::future::join_all;
use futures::Future;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::report::BuildReport;
use super::runner::TaskRunner;
use super::strategy::{
    ExecutionStrategy, SetupAction, TaskSetupAction, TaskSetupContext, TaskTeardownAction,
    TaskTeardownContext, TeardownAction, TeardownContext,
};
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::graph::{GraphBuilder, TaskGraph};
use crate::task::{canonical_name, Task, TaskBuilder};

/// How the traversal order is driven: one task at a time, or independent
/// groups of tasks concurrently with a barrier between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Engine-level lifecycle hooks. Each is single-valued; re-registration
/// replaces the previous hook.
#[derive(Clone, Default)]
pub(crate) struct EngineHooks {
    setup: Option<SetupAction>,
    teardown: Option<TeardownAction>,
    task_setup: Option<TaskSetupAction>,
    task_teardown: Option<TaskTeardownAction>,
}

impl EngineHooks {
    pub(crate) fn setup(&self) -> Option<&SetupAction> {
        self.setup.as_ref()
    }

    pub(crate) fn teardown(&self) -> Option<&TeardownAction> {
        self.teardown.as_ref()
    }

    pub(crate) fn task_setup(&self) -> Option<&TaskSetupAction> {
        self.task_setup.as_ref()
    }

    pub(crate) fn task_teardown(&self) -> Option<&TaskTeardownAction> {
        self.task_teardown.as_ref()
    }
}

/// The build engine. Callers register tasks and hooks, then run a target:
///
/// ```ignore
/// let mut engine = BuildEngine::new();
/// engine.register_task("compile")?.does(|ctx| async move { ... });
/// engine
///     .register_task("package")?
///     .depends_on("compile")
///     .does(|ctx| async move { ... });
///
/// let report = engine
///     .run_target(context, Arc::new(DefaultStrategy), "package")
///     .await?;
/// ```
pub struct BuildEngine {
    tasks: IndexMap<String, Task>,
    hooks: EngineHooks,
    mode: ExecutionMode,
}

impl BuildEngine {
    pub fn new() -> Self {
        Self::with_mode(ExecutionMode::Sequential)
    }

    pub fn with_mode(mode: ExecutionMode) -> Self {
        Self {
            tasks: IndexMap::new(),
            hooks: EngineHooks::default(),
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Register a task and return its configuration builder. Task names are
    /// unique under case-insensitive comparison.
    pub fn register_task(&mut self, name: &str) -> Result<TaskBuilder<'_>> {
        if name.trim().is_empty() {
            return Err(BuildError::invalid_argument(
                "name",
                "task name must not be empty",
            ));
        }

        let canonical = canonical_name(name);
        if self.tasks.contains_key(&canonical) {
            return Err(BuildError::DuplicateTask {
                name: name.to_string(),
            });
        }

        let task = self
            .tasks
            .entry(canonical)
            .or_insert_with(|| Task::new(name));
        Ok(TaskBuilder::new(task))
    }

    /// Registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(&canonical_name(name))
    }

    /// Run once before any task of a build.
    pub fn register_setup_action<F, Fut>(&mut self, action: F)
    where
        F: Fn(Arc<BuildContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.hooks.setup.is_some() {
            debug!("Replacing existing setup action");
        }
        self.hooks.setup = Some(Arc::new(move |context| Box::pin(action(context))));
    }

    /// Run once after the last task of a build, whether or not it failed.
    pub fn register_teardown_action<F, Fut>(&mut self, action: F)
    where
        F: Fn(Arc<BuildContext>, TeardownContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.hooks.teardown.is_some() {
            debug!("Replacing existing teardown action");
        }
        self.hooks.teardown = Some(Arc::new(move |context, teardown| {
            Box::pin(action(context, teardown))
        }));
    }

    /// Run before each task.
    pub fn register_task_setup_action<F, Fut>(&mut self, action: F)
    where
        F: Fn(Arc<BuildContext>, TaskSetupContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.hooks.task_setup.is_some() {
            debug!("Replacing existing task setup action");
        }
        self.hooks.task_setup = Some(Arc::new(move |context, setup| {
            Box::pin(action(context, setup))
        }));
    }

    /// Run after each task, including skipped ones.
    pub fn register_task_teardown_action<F, Fut>(&mut self, action: F)
    where
        F: Fn(Arc<BuildContext>, TaskTeardownContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.hooks.task_teardown.is_some() {
            debug!("Replacing existing task teardown action");
        }
        self.hooks.task_teardown = Some(Arc::new(move |context, teardown| {
            Box::pin(action(context, teardown))
        }));
    }

    /// Execute `target` and its transitive prerequisites in dependency
    /// order, returning the per-task report. A failed run surfaces exactly
    /// one error: the first propagating cause.
    pub async fn run_target(
        &self,
        context: Arc<BuildContext>,
        strategy: Arc<dyn ExecutionStrategy>,
        target: &str,
    ) -> Result<BuildReport> {
        if target.trim().is_empty() {
            return Err(BuildError::invalid_argument(
                "target",
                "target name must not be empty",
            ));
        }

        let run_id = Uuid::new_v4();
        info!("Starting build {} targeting '{}'", run_id, target);

        let graph = GraphBuilder::build(self.tasks.values())?;
        if !graph.exists(target) {
            return Err(BuildError::UnknownTarget {
                target: target.to_string(),
            });
        }

        let report = Arc::new(BuildReport::new());
        let mut failure: Option<BuildError> = None;

        if let Some(setup) = self.hooks.setup() {
            if let Err(setup_failure) = strategy
                .perform_setup(setup, Arc::clone(&context))
                .await
            {
                error!("Build setup failed: {}", setup_failure);
                failure = Some(setup_failure);
            }
        }

        if failure.is_none() {
            let traversal = match self.mode {
                ExecutionMode::Sequential => {
                    self.run_sequential(&graph, target, &context, &strategy, &report)
                        .await
                }
                ExecutionMode::Parallel => {
                    self.run_parallel(&graph, target, &context, &strategy, &report)
                        .await
                }
            };
            failure = traversal.err();
        }

        // Build teardown always runs; its failure only surfaces when nothing
        // else is propagating.
        if let Some(teardown) = self.hooks.teardown() {
            let teardown_context = TeardownContext {
                exception_was_thrown: failure.is_some(),
            };
            if let Err(teardown_failure) = strategy
                .perform_teardown(teardown, Arc::clone(&context), teardown_context)
                .await
            {
                match &failure {
                    Some(original) => error!(
                        "Build teardown failed: {} (suppressed, '{}' is already propagating)",
                        teardown_failure, original
                    ),
                    None => failure = Some(teardown_failure),
                }
            }
        }

        if let Some(failure) = failure {
            return Err(failure);
        }

        let mut report = Arc::try_unwrap(report).unwrap_or_else(|shared| shared.snapshot());
        report.mark_completed();
        info!("Build {} finished: {}", run_id, report.summary());
        Ok(report)
    }

    async fn run_sequential(
        &self,
        graph: &TaskGraph,
        target: &str,
        context: &Arc<BuildContext>,
        strategy: &Arc<dyn ExecutionStrategy>,
        report: &Arc<BuildReport>,
    ) -> Result<()> {
        let order = graph.traverse(target)?;
        debug!("Traversal order: {:?}", order);

        let runner = TaskRunner::new(self.hooks.clone(), canonical_name(target));

        for name in &order {
            let task = self.registered_task(name);
            runner
                .run(task, Arc::clone(context), strategy.as_ref(), report)
                .await?;
        }

        Ok(())
    }

    async fn run_parallel(
        &self,
        graph: &TaskGraph,
        target: &str,
        context: &Arc<BuildContext>,
        strategy: &Arc<dyn ExecutionStrategy>,
        report: &Arc<BuildReport>,
    ) -> Result<()> {
        let groups = graph.traverse_and_group(target)?;
        let runner = Arc::new(TaskRunner::new(self.hooks.clone(), canonical_name(target)));

        for group in groups {
            debug!("Executing group of {} tasks: {:?}", group.len(), group);

            let mut handles = Vec::with_capacity(group.len());
            for name in &group {
                let task = self.registered_task(name).clone();
                let runner = Arc::clone(&runner);
                let context = Arc::clone(context);
                let strategy = Arc::clone(strategy);
                let report = Arc::clone(report);

                handles.push(tokio::spawn(async move {
                    runner
                        .run(&task, context, strategy.as_ref(), &report)
                        .await
                }));
            }

            let outcomes = join_all(handles).await;

            // Siblings all ran to completion; surface the first failure in
            // group order and discard the rest.
            let mut first_failure: Option<BuildError> = None;
            for (name, outcome) in group.iter().zip(outcomes) {
                let result = match outcome {
                    Ok(result) => result,
                    Err(join_failure) => Err(BuildError::UserFailure(anyhow::anyhow!(
                        "task '{}' aborted: {}",
                        name,
                        join_failure
                    ))),
                };

                if let Err(task_failure) = result {
                    if first_failure.is_none() {
                        first_failure = Some(task_failure);
                    } else {
                        error!(
                            "Additional failure in task '{}' discarded: {}",
                            name, task_failure
                        );
                    }
                }
            }

            if let Some(failure) = first_failure {
                return Err(failure);
            }
        }

        Ok(())
    }

    fn registered_task(&self, name: &str) -> &Task {
        self.tasks
            .get(&canonical_name(name))
            .expect("GraphBuilder only returns names of registered tasks")
    }
}

impl Default for BuildEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuildEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEngine")
            .field("tasks", &self.tasks.len())
            .field("mode", &self.mode)
            .finish()
    }
}
