// ABOUTME: Task data model and callable type aliases for user-supplied logic
// ABOUTME: A task owns its action, criteria, error hooks, and dependency names

use futures::future::BoxFuture;
use std::sync::Arc;

use crate::context::BuildContext;
use crate::error::BuildError;

/// Asynchronous task body. Receives the ambient build context.
pub type TaskAction =
    Arc<dyn Fn(Arc<BuildContext>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Predicate gating task execution. All criteria must hold for the task to run.
pub type Criterion = Arc<dyn Fn() -> bool + Send + Sync>;

/// Observes a task failure before the error handler runs. Failures from the
/// reporter itself are swallowed.
pub type ErrorReporter = Arc<dyn Fn(&BuildError) -> anyhow::Result<()> + Send + Sync>;

/// Handles a task failure. Returning `Ok` converts the failure into a recovery.
pub type ErrorHandler = Arc<dyn Fn(&BuildError) -> anyhow::Result<()> + Send + Sync>;

/// Invoked after the action (or its error handler), before task teardown.
pub type FinallyHandler = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Canonical form used for every task-name comparison.
pub fn canonical_name(name: &str) -> String {
    name.to_lowercase()
}

/// Immutable task facts handed to lifecycle hooks.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

/// A named unit of work with dependencies, criteria, and error hooks.
/// Created through `BuildEngine::register_task` and configured through the
/// fluent `TaskBuilder`.
#[derive(Clone)]
pub struct Task {
    name: String,
    canonical: String,
    description: Option<String>,
    action: Option<TaskAction>,
    dependencies: Vec<String>,
    criteria: Vec<Criterion>,
    error_reporter: Option<ErrorReporter>,
    error_handler: Option<ErrorHandler>,
    finally_handler: Option<FinallyHandler>,
}

impl Task {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            canonical: canonical_name(name),
            description: None,
            action: None,
            dependencies: Vec::new(),
            criteria: Vec::new(),
            error_reporter: None,
            error_handler: None,
            finally_handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn action(&self) -> Option<&TaskAction> {
        self.action.as_ref()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn error_reporter(&self) -> Option<&ErrorReporter> {
        self.error_reporter.as_ref()
    }

    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    pub fn finally_handler(&self) -> Option<&FinallyHandler> {
        self.finally_handler.as_ref()
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            dependencies: self.dependencies.clone(),
        }
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub(crate) fn add_dependency(&mut self, name: &str) {
        self.dependencies.push(name.to_string());
    }

    pub(crate) fn add_criterion(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    pub(crate) fn set_action(&mut self, action: TaskAction) {
        self.action = Some(action);
    }

    pub(crate) fn set_error_reporter(&mut self, reporter: ErrorReporter) {
        self.error_reporter = Some(reporter);
    }

    pub(crate) fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    pub(crate) fn set_finally_handler(&mut self, handler: FinallyHandler) {
        self.finally_handler = Some(handler);
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .field("criteria", &self.criteria.len())
            .field("has_action", &self.action.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_lowercases() {
        assert_eq!(canonical_name("Build-All"), "build-all");
    }

    #[test]
    fn test_new_task_has_no_hooks() {
        let task = Task::new("Compile");

        assert_eq!(task.name(), "Compile");
        assert_eq!(task.canonical_name(), "compile");
        assert!(task.action().is_none());
        assert!(task.error_handler().is_none());
        assert!(task.criteria().is_empty());
    }

    #[test]
    fn test_info_snapshot() {
        let mut task = Task::new("package");
        task.set_description("Builds the release archive".to_string());
        task.add_dependency("compile");

        let info = task.info();
        assert_eq!(info.name, "package");
        assert_eq!(
            info.description.as_deref(),
            Some("Builds the release archive")
        );
        assert_eq!(info.dependencies, vec!["compile"]);
    }
}
