// ABOUTME: Builds a TaskGraph from the engine's registered task list
// ABOUTME: Adds every task as a node and wires dependency edges with validation

use std::collections::HashSet;

use super::graph::TaskGraph;
use crate::error::{BuildError, Result};
use crate::task::{canonical_name, Task};

pub struct GraphBuilder;

impl GraphBuilder {
    /// Translate a flat task list into a graph: one node per task, one edge
    /// `dependency -> task` per declared dependency. Dependencies must name
    /// registered tasks.
    pub fn build<'a, I>(tasks: I) -> Result<TaskGraph>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        let known: HashSet<String> = tasks
            .iter()
            .map(|task| task.canonical_name().to_string())
            .collect();

        let mut graph = TaskGraph::new();

        for task in &tasks {
            graph.add(task.name())?;
        }

        for task in &tasks {
            for dependency in task.dependencies() {
                if !known.contains(&canonical_name(dependency)) {
                    return Err(BuildError::UnknownDependency {
                        task: task.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
                graph.connect_allowing_mutual(dependency, task.name())?;
            }
        }

        Ok(graph)
    }
}
