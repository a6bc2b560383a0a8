// ABOUTME: Runs a single task through its full lifecycle
// ABOUTME: Criteria gate, setup/teardown bracketing, error reporter/handler/finally semantics

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::engine::EngineHooks;
use super::report::BuildReport;
use super::strategy::{ExecutionStrategy, TaskSetupContext, TaskTeardownContext};
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::task::Task;

/// Executes one task and records it in the report. Holds the engine's hook
/// set and the canonical name of the run's target (a skipped target is an
/// error; any other skipped task is benign).
pub(crate) struct TaskRunner {
    hooks: EngineHooks,
    target: String,
}

impl TaskRunner {
    pub(crate) fn new(hooks: EngineHooks, target: String) -> Self {
        Self { hooks, target }
    }

    pub(crate) async fn run(
        &self,
        task: &Task,
        context: Arc<BuildContext>,
        strategy: &dyn ExecutionStrategy,
        report: &BuildReport,
    ) -> Result<()> {
        if !task.criteria().iter().all(|criterion| criterion()) {
            if task.canonical_name() == self.target {
                return Err(BuildError::TargetSkipped {
                    target: task.name().to_string(),
                });
            }
            return self.skip(task, context, strategy, report).await;
        }

        let clock = Instant::now();

        self.task_setup(task, &context, strategy, false).await?;

        let failure = strategy.execute(task, Arc::clone(&context)).await.err();

        let mut propagating: Option<BuildError> = None;

        if let Some(original) = failure {
            error!(
                "An error occurred when executing task '{}': {}",
                task.name(),
                original
            );

            if let Some(reporter) = task.error_reporter() {
                if let Err(report_failure) = strategy.report_errors(reporter, &original) {
                    debug!(
                        "Error reporter for task '{}' failed: {}",
                        task.name(),
                        report_failure
                    );
                }
            }

            match task.error_handler() {
                Some(handler) => match strategy.handle_errors(handler, &original) {
                    Ok(()) => {
                        info!("Task '{}' recovered via its error handler", task.name());
                    }
                    Err(handler_failure) => {
                        if handler_failure.to_string() != original.to_string() {
                            error!("Error: {}", original);
                        }
                        propagating = Some(handler_failure);
                    }
                },
                None => propagating = Some(original),
            }
        }

        if let Some(handler) = task.finally_handler() {
            if let Err(finally_failure) = strategy.invoke_finally(handler) {
                if let Some(displaced) = propagating.replace(finally_failure) {
                    error!(
                        "Failure in task '{}' displaced by its finally handler: {}",
                        task.name(),
                        displaced
                    );
                }
            }
        }

        // Teardown is unconditional; an earlier failure wins over its own.
        if let Some(hook) = self.hooks.task_teardown() {
            let teardown = TaskTeardownContext {
                task: task.info(),
                duration: clock.elapsed(),
                skipped: false,
            };
            if let Err(teardown_failure) = strategy
                .perform_task_teardown(hook, Arc::clone(&context), teardown)
                .await
            {
                match &propagating {
                    Some(original) => error!(
                        "Task teardown for '{}' failed: {} (suppressed, '{}' is already propagating)",
                        task.name(),
                        teardown_failure,
                        original
                    ),
                    None => propagating = Some(teardown_failure),
                }
            }
        }

        if let Some(failure) = propagating {
            return Err(failure);
        }

        report.add_executed(task.name(), clock.elapsed());
        Ok(())
    }

    /// Benign skip: the task still passes through setup, the strategy's skip
    /// announcement, and teardown, and is recorded with zero duration.
    async fn skip(
        &self,
        task: &Task,
        context: Arc<BuildContext>,
        strategy: &dyn ExecutionStrategy,
        report: &BuildReport,
    ) -> Result<()> {
        self.task_setup(task, &context, strategy, true).await?;

        strategy.skip(task);

        if let Some(hook) = self.hooks.task_teardown() {
            let teardown = TaskTeardownContext {
                task: task.info(),
                duration: Duration::ZERO,
                skipped: true,
            };
            strategy
                .perform_task_teardown(hook, Arc::clone(&context), teardown)
                .await?;
        }

        report.add_skipped(task.name());
        Ok(())
    }

    /// Run the task setup hook. On failure the teardown hook still runs
    /// (with its own failure suppressed), the action never starts, and the
    /// setup failure propagates.
    async fn task_setup(
        &self,
        task: &Task,
        context: &Arc<BuildContext>,
        strategy: &dyn ExecutionStrategy,
        skipped: bool,
    ) -> Result<()> {
        let Some(hook) = self.hooks.task_setup() else {
            return Ok(());
        };

        let setup = TaskSetupContext {
            task: task.info(),
            skipped,
        };

        if let Err(setup_failure) = strategy
            .perform_task_setup(hook, Arc::clone(context), setup)
            .await
        {
            if let Some(teardown_hook) = self.hooks.task_teardown() {
                let teardown = TaskTeardownContext {
                    task: task.info(),
                    duration: Duration::ZERO,
                    skipped,
                };
                if let Err(teardown_failure) = strategy
                    .perform_task_teardown(teardown_hook, Arc::clone(context), teardown)
                    .await
                {
                    error!(
                        "Task teardown for '{}' failed: {} (suppressed, setup already failed)",
                        task.name(),
                        teardown_failure
                    );
                }
            }
            return Err(setup_failure);
        }

        Ok(())
    }
}
