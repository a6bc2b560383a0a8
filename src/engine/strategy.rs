// ABOUTME: Execution strategy seam through which every user callable is invoked
// ABOUTME: Ships the pass-through default strategy and an announce-only dry-run variant

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::task::{ErrorHandler, ErrorReporter, FinallyHandler, Task, TaskInfo};

/// Build-scoped setup hook.
pub type SetupAction =
    Arc<dyn Fn(Arc<BuildContext>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Build-scoped teardown hook.
pub type TeardownAction = Arc<
    dyn Fn(Arc<BuildContext>, TeardownContext) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Task-scoped setup hook, run before each task.
pub type TaskSetupAction = Arc<
    dyn Fn(Arc<BuildContext>, TaskSetupContext) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Task-scoped teardown hook, run after each task.
pub type TaskTeardownAction = Arc<
    dyn Fn(Arc<BuildContext>, TaskTeardownContext) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

#[derive(Debug, Clone)]
pub struct TeardownContext {
    pub exception_was_thrown: bool,
}

#[derive(Debug, Clone)]
pub struct TaskSetupContext {
    pub task: TaskInfo,
    pub skipped: bool,
}

#[derive(Debug, Clone)]
pub struct TaskTeardownContext {
    pub task: TaskInfo,
    pub duration: Duration,
    pub skipped: bool,
}

/// The seam between the engine and user-supplied logic. The engine never
/// invokes a user callable directly; every invocation flows through the
/// current strategy so cross-cutting variants (tracing, dry runs) compose
/// without touching the engine. Implementations must preserve failures from
/// user callables unchanged.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn perform_setup(&self, action: &SetupAction, context: Arc<BuildContext>) -> Result<()>;

    async fn perform_teardown(
        &self,
        action: &TeardownAction,
        context: Arc<BuildContext>,
        teardown: TeardownContext,
    ) -> Result<()>;

    async fn perform_task_setup(
        &self,
        action: &TaskSetupAction,
        context: Arc<BuildContext>,
        setup: TaskSetupContext,
    ) -> Result<()>;

    async fn perform_task_teardown(
        &self,
        action: &TaskTeardownAction,
        context: Arc<BuildContext>,
        teardown: TaskTeardownContext,
    ) -> Result<()>;

    /// Drive the task's action.
    async fn execute(&self, task: &Task, context: Arc<BuildContext>) -> Result<()>;

    /// Announce a task whose criteria denied execution.
    fn skip(&self, task: &Task);

    fn report_errors(&self, reporter: &ErrorReporter, error: &BuildError) -> Result<()>;

    fn handle_errors(&self, handler: &ErrorHandler, error: &BuildError) -> Result<()>;

    fn invoke_finally(&self, handler: &FinallyHandler) -> Result<()>;
}

/// Pass-through strategy: invokes every callable as-is.
#[derive(Debug, Default)]
pub struct DefaultStrategy;

#[async_trait]
impl ExecutionStrategy for DefaultStrategy {
    async fn perform_setup(&self, action: &SetupAction, context: Arc<BuildContext>) -> Result<()> {
        debug!("Performing build setup");
        action(context).await?;
        Ok(())
    }

    async fn perform_teardown(
        &self,
        action: &TeardownAction,
        context: Arc<BuildContext>,
        teardown: TeardownContext,
    ) -> Result<()> {
        debug!("Performing build teardown");
        action(context, teardown).await?;
        Ok(())
    }

    async fn perform_task_setup(
        &self,
        action: &TaskSetupAction,
        context: Arc<BuildContext>,
        setup: TaskSetupContext,
    ) -> Result<()> {
        action(context, setup).await?;
        Ok(())
    }

    async fn perform_task_teardown(
        &self,
        action: &TaskTeardownAction,
        context: Arc<BuildContext>,
        teardown: TaskTeardownContext,
    ) -> Result<()> {
        action(context, teardown).await?;
        Ok(())
    }

    async fn execute(&self, task: &Task, context: Arc<BuildContext>) -> Result<()> {
        info!("Executing task: {}", task.name());
        if let Some(action) = task.action() {
            action(context).await?;
        }
        Ok(())
    }

    fn skip(&self, task: &Task) {
        info!("Skipping task: {}", task.name());
    }

    fn report_errors(&self, reporter: &ErrorReporter, error: &BuildError) -> Result<()> {
        reporter(error)?;
        Ok(())
    }

    fn handle_errors(&self, handler: &ErrorHandler, error: &BuildError) -> Result<()> {
        handler(error)?;
        Ok(())
    }

    fn invoke_finally(&self, handler: &FinallyHandler) -> Result<()> {
        handler()?;
        Ok(())
    }
}

/// Announces what would run without invoking any user callable. Useful for
/// previewing the traversal order of a large build.
#[derive(Debug, Default)]
pub struct DryRunStrategy;

#[async_trait]
impl ExecutionStrategy for DryRunStrategy {
    async fn perform_setup(&self, _action: &SetupAction, _context: Arc<BuildContext>) -> Result<()> {
        info!("Performing build setup (dry run)");
        Ok(())
    }

    async fn perform_teardown(
        &self,
        _action: &TeardownAction,
        _context: Arc<BuildContext>,
        _teardown: TeardownContext,
    ) -> Result<()> {
        info!("Performing build teardown (dry run)");
        Ok(())
    }

    async fn perform_task_setup(
        &self,
        _action: &TaskSetupAction,
        _context: Arc<BuildContext>,
        _setup: TaskSetupContext,
    ) -> Result<()> {
        Ok(())
    }

    async fn perform_task_teardown(
        &self,
        _action: &TaskTeardownAction,
        _context: Arc<BuildContext>,
        _teardown: TaskTeardownContext,
    ) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, task: &Task, _context: Arc<BuildContext>) -> Result<()> {
        info!("Executing task: {} (dry run)", task.name());
        Ok(())
    }

    fn skip(&self, task: &Task) {
        info!("Skipping task: {} (dry run)", task.name());
    }

    fn report_errors(&self, _reporter: &ErrorReporter, _error: &BuildError) -> Result<()> {
        Ok(())
    }

    fn handle_errors(&self, _handler: &ErrorHandler, _error: &BuildError) -> Result<()> {
        Ok(())
    }

    fn invoke_finally(&self, _handler: &FinallyHandler) -> Result<()> {
        Ok(())
    }
}
