// ABOUTME: Execution report collecting per-task durations in completion order
// ABOUTME: Appends are atomic so parallel group members can record concurrently

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::task::canonical_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    Executed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub task_name: String,
    pub duration: Duration,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_tasks: usize,
    pub executed_tasks: usize,
    pub skipped_tasks: usize,
    pub total_duration: Duration,
}

/// Ordered record of what a build run did. Entries appear in task-completion
/// order; a skipped task contributes a zero-duration entry. The entry log is
/// guarded by a mutex because parallel group members append concurrently
/// (appends never suspend, so a std mutex is safe under the async runtime).
#[derive(Debug)]
pub struct BuildReport {
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    entries: Mutex<Vec<ReportEntry>>,
}

impl BuildReport {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_executed(&self, task_name: &str, duration: Duration) {
        self.push(ReportEntry {
            task_name: task_name.to_string(),
            duration,
            outcome: TaskOutcome::Executed,
        });
    }

    pub(crate) fn add_skipped(&self, task_name: &str) {
        self.push(ReportEntry {
            task_name: task_name.to_string(),
            duration: Duration::ZERO,
            outcome: TaskOutcome::Skipped,
        });
    }

    fn push(&self, entry: ReportEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(entry);
    }

    pub(crate) fn mark_completed(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Copy of this report, used when the shared handle cannot be unwrapped.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            started_at: self.started_at,
            finished_at: self.finished_at,
            entries: Mutex::new(self.entries()),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.clone()
    }

    /// Task names in completion order.
    pub fn task_names(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|entry| entry.task_name)
            .collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry for a task, matched case-insensitively.
    pub fn entry_for(&self, task_name: &str) -> Option<ReportEntry> {
        let wanted = canonical_name(task_name);
        self.entries()
            .into_iter()
            .find(|entry| canonical_name(&entry.task_name) == wanted)
    }

    pub fn summary(&self) -> ReportSummary {
        let entries = self.entries();
        let executed = entries
            .iter()
            .filter(|entry| entry.outcome == TaskOutcome::Executed)
            .count();
        let skipped = entries.len() - executed;
        let total_duration = entries.iter().map(|entry| entry.duration).sum();

        ReportSummary {
            total_tasks: entries.len(),
            executed_tasks: executed,
            skipped_tasks: skipped,
            total_duration,
        }
    }
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tasks ({} executed, {} skipped) in {:?}",
            self.total_tasks, self.executed_tasks, self.skipped_tasks, self.total_duration
        )
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::Executed => write!(f, "executed"),
            TaskOutcome::Skipped => write!(f, "skipped"),
        }
    }
}
