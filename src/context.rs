// ABOUTME: Ambient build context handed to every user-supplied callable
// ABOUTME: Carries working directory, environment snapshot, and shared runtime variables

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Ambient state for a build run. The engine never interprets it; it is
/// passed through to task actions and lifecycle hooks as `Arc<BuildContext>`.
#[derive(Debug)]
pub struct BuildContext {
    working_directory: PathBuf,
    environment: HashMap<String, String>,
    variables: RwLock<HashMap<String, String>>,
}

impl BuildContext {
    /// Create a context rooted at the current working directory with a
    /// snapshot of the process environment.
    pub fn new() -> Self {
        Self {
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            environment: std::env::vars().collect(),
            variables: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = path.into();
        self
    }

    pub fn with_variables(self, variables: HashMap<String, String>) -> Self {
        Self {
            variables: RwLock::new(variables),
            ..self
        }
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn env(&self, key: &str) -> Option<&String> {
        self.environment.get(key)
    }

    pub async fn variable(&self, key: &str) -> Option<String> {
        let variables = self.variables.read().await;
        variables.get(key).cloned()
    }

    pub async fn set_variable(&self, key: String, value: String) {
        let mut variables = self.variables.write().await;
        variables.insert(key, value);
    }

    pub async fn variables(&self) -> HashMap<String, String> {
        let variables = self.variables.read().await;
        variables.clone()
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}
