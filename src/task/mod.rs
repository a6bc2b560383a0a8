// ABOUTME: Task module for the smelter build engine
// ABOUTME: Exposes the task data model and the fluent registration builder

pub mod builder;
pub mod task;

pub use builder::TaskBuilder;
pub use task::{
    canonical_name, Criterion, ErrorHandler, ErrorReporter, FinallyHandler, Task, TaskAction,
    TaskInfo,
};
