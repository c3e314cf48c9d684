//! procplot - a lightweight process profiler
//!
//! Samples the CPU and memory usage of one process at a fixed interval,
//! prints each sample, and on Ctrl-C optionally writes the whole series as
//! an HTML chart.

pub mod app;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod core;
pub mod formatting;
pub mod internal_metrics;
pub mod parsing;
pub mod provider;
pub mod records;
pub mod report;
pub mod sampler;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
