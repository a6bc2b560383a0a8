// ABOUTME: Error types for the build engine and task graph
// ABOUTME: Defines the single BuildError enum covering structural, invocation, and execution failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Another task with the name '{name}' has already been added")]
    DuplicateTask { name: String },

    #[error("The node '{name}' already exists in the graph")]
    DuplicateNode { name: String },

    #[error("Task '{name}' cannot depend on itself")]
    ReflexiveEdge { name: String },

    #[error("Unable to add edge '{start}' -> '{end}': the reverse edge already exists")]
    InverseEdge { start: String, end: String },

    #[error("Graph contains a circular dependency involving '{name}'")]
    CyclicGraph { name: String },

    #[error("Task '{task}' depends on '{dependency}' which is not registered")]
    UnknownDependency { task: String, dependency: String },

    #[error("The target '{target}' was not found")]
    UnknownTarget { target: String },

    #[error("Invalid argument: {name} - {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Could not reach target '{target}' since it was skipped due to a criteria")]
    TargetSkipped { target: String },

    #[error("{0}")]
    UserFailure(anyhow::Error),
}

impl From<anyhow::Error> for BuildError {
    fn from(error: anyhow::Error) -> Self {
        BuildError::UserFailure(error)
    }
}

impl BuildError {
    pub fn invalid_argument(name: &str, reason: &str) -> Self {
        BuildError::InvalidArgument {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
