// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides event probes, task registration shorthands, and a counting strategy

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use smelter::engine::{SetupAction, TaskSetupAction, TaskTeardownAction, TeardownAction};
use smelter::task::{ErrorHandler, ErrorReporter, FinallyHandler};
use smelter::{
    BuildContext, BuildEngine, BuildError, DefaultStrategy, ExecutionStrategy, Task,
    TaskSetupContext, TaskTeardownContext, TeardownContext,
};

/// Shared, thread-safe event log for asserting execution order.
#[derive(Clone, Default)]
pub struct Probe {
    events: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.position(event).is_some()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Register a task whose action records its own name into the probe.
pub fn register_recording_task(
    engine: &mut BuildEngine,
    probe: &Probe,
    name: &str,
    dependencies: &[&str],
) {
    let mut builder = engine.register_task(name).unwrap();
    for dependency in dependencies {
        builder = builder.depends_on(dependency);
    }

    let probe = probe.clone();
    let event = name.to_string();
    builder.does(move |_ctx| {
        let probe = probe.clone();
        let event = event.clone();
        async move {
            probe.record(&event);
            Ok(())
        }
    });
}

/// Register a task whose action fails with `message` after recording itself.
pub fn register_failing_task(
    engine: &mut BuildEngine,
    probe: &Probe,
    name: &str,
    dependencies: &[&str],
    message: &str,
) {
    let mut builder = engine.register_task(name).unwrap();
    for dependency in dependencies {
        builder = builder.depends_on(dependency);
    }

    let probe = probe.clone();
    let event = name.to_string();
    let message = message.to_string();
    builder.does(move |_ctx| {
        let probe = probe.clone();
        let event = event.clone();
        let message = message.clone();
        async move {
            probe.record(&event);
            anyhow::bail!(message)
        }
    });
}

/// Strategy that counts every seam invocation and otherwise behaves like the
/// default. Used to verify the engine never bypasses the strategy.
#[derive(Default)]
pub struct CountingStrategy {
    inner: DefaultStrategy,
    pub setups: AtomicUsize,
    pub teardowns: AtomicUsize,
    pub task_setups: AtomicUsize,
    pub task_teardowns: AtomicUsize,
    pub executions: AtomicUsize,
    pub skips: AtomicUsize,
    pub reported: AtomicUsize,
    pub handled: AtomicUsize,
    pub finalized: AtomicUsize,
}

impl CountingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionStrategy for CountingStrategy {
    async fn perform_setup(
        &self,
        action: &SetupAction,
        context: Arc<BuildContext>,
    ) -> smelter::Result<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        self.inner.perform_setup(action, context).await
    }

    async fn perform_teardown(
        &self,
        action: &TeardownAction,
        context: Arc<BuildContext>,
        teardown: TeardownContext,
    ) -> smelter::Result<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        self.inner.perform_teardown(action, context, teardown).await
    }

    async fn perform_task_setup(
        &self,
        action: &TaskSetupAction,
        context: Arc<BuildContext>,
        setup: TaskSetupContext,
    ) -> smelter::Result<()> {
        self.task_setups.fetch_add(1, Ordering::SeqCst);
        self.inner.perform_task_setup(action, context, setup).await
    }

    async fn perform_task_teardown(
        &self,
        action: &TaskTeardownAction,
        context: Arc<BuildContext>,
        teardown: TaskTeardownContext,
    ) -> smelter::Result<()> {
        self.task_teardowns.fetch_add(1, Ordering::SeqCst);
        self.inner
            .perform_task_teardown(action, context, teardown)
            .await
    }

    async fn execute(&self, task: &Task, context: Arc<BuildContext>) -> smelter::Result<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(task, context).await
    }

    fn skip(&self, task: &Task) {
        self.skips.fetch_add(1, Ordering::SeqCst);
        self.inner.skip(task);
    }

    fn report_errors(&self, reporter: &ErrorReporter, error: &BuildError) -> smelter::Result<()> {
        self.reported.fetch_add(1, Ordering::SeqCst);
        self.inner.report_errors(reporter, error)
    }

    fn handle_errors(&self, handler: &ErrorHandler, error: &BuildError) -> smelter::Result<()> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        self.inner.handle_errors(handler, error)
    }

    fn invoke_finally(&self, handler: &FinallyHandler) -> smelter::Result<()> {
        self.finalized.fetch_add(1, Ordering::SeqCst);
        self.inner.invoke_finally(handler)
    }
}
