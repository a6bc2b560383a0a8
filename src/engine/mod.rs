// ABOUTME: Execution engine module for the smelter build engine
// ABOUTME: Handles target runs, per-task lifecycle, strategies, and reporting

pub mod engine;
pub mod report;
pub mod runner;
pub mod strategy;

pub use engine::{BuildEngine, ExecutionMode};
pub use report::{BuildReport, ReportEntry, ReportSummary, TaskOutcome};
pub use strategy::{
    DefaultStrategy, DryRunStrategy, ExecutionStrategy, SetupAction, TaskSetupAction,
    TaskSetupContext, TaskTeardownAction, TaskTeardownContext, TeardownAction, TeardownContext,
};
