// ABOUTME: Main library module for the smelter build engine
// ABOUTME: Exports all core modules and provides the public API

pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod task;

// Re-export commonly used types
pub use context::BuildContext;
pub use engine::{
    BuildEngine, BuildReport, DefaultStrategy, DryRunStrategy, ExecutionMode, ExecutionStrategy,
    ReportEntry, ReportSummary, TaskOutcome, TaskSetupContext, TaskTeardownContext,
    TeardownContext,
};
pub use error::{BuildError, Result};
pub use graph::{GraphBuilder, TaskGraph};
pub use task::{Task, TaskBuilder, TaskInfo};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
