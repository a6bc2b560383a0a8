// ABOUTME: Fluent builder for configuring a registered task
// ABOUTME: Chains dependencies, criteria, the action, and error hooks onto a task

use futures::Future;
use std::sync::Arc;

use super::task::Task;
use crate::context::BuildContext;
use crate::error::BuildError;

/// Fluent configuration handle returned by `BuildEngine::register_task`.
/// Borrows the registered task, so configuration happens in place:
///
/// ```ignore
/// engine
///     .register_task("package")?
///     .depends_on("compile")
///     .does(|ctx| async move { ... });
/// ```
pub struct TaskBuilder<'a> {
    task: &'a mut Task,
}

impl<'a> TaskBuilder<'a> {
    pub(crate) fn new(task: &'a mut Task) -> Self {
        Self { task }
    }

    pub fn described_as(self, description: &str) -> Self {
        self.task.set_description(description.to_string());
        self
    }

    /// Require `name` to run before this task. The dependency does not have
    /// to be registered yet; it must exist by the time `run_target` is called.
    pub fn depends_on(self, name: &str) -> Self {
        self.task.add_dependency(name);
        self
    }

    /// Add a predicate that must hold for the task to execute. Criteria are
    /// evaluated in the order they were added.
    pub fn with_criteria<F>(self, criterion: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.task.add_criterion(Arc::new(criterion));
        self
    }

    /// Set the task's action.
    pub fn does<F, Fut>(self, action: F) -> Self
    where
        F: Fn(Arc<BuildContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.task
            .set_action(Arc::new(move |context| Box::pin(action(context))));
        self
    }

    /// Observe a failure of the action before any handler runs. Failures
    /// raised by the reporter itself are swallowed.
    pub fn report_error<F>(self, reporter: F) -> Self
    where
        F: Fn(&BuildError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.task.set_error_reporter(Arc::new(reporter));
        self
    }

    /// Handle a failure of the action. A handler that returns `Ok` converts
    /// the failure into a recovery; a failing handler propagates.
    pub fn on_error<F>(self, handler: F) -> Self
    where
        F: Fn(&BuildError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.task.set_error_handler(Arc::new(handler));
        self
    }

    /// Run after the action (or its error handler), whether or not the task
    /// succeeded.
    pub fn finally<F>(self, handler: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.task.set_finally_handler(Arc::new(handler));
        self
    }
}
