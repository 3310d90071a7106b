//! Soar CLI - Command line tools for the soaring task engine.
//!
//! This crate provides the CLI binaries:
//! - fly_task: flies a synthetic track through a task file and logs the stats

pub mod config;
pub mod report;
pub mod sim;
pub mod task_file;

pub use config::{Config, EngineSettings};
pub use task_file::{TaskFile, TaskFilePoint};
