//! Conversion orchestrator for batch processing.
//!
//! The orchestrator owns the per-file lifecycle of every batch:
//! - **Registration**: every path is (re-)initialized to `pending` up front
//! - **Encoding**: one task per file, bounded by a shared worker pool
//! - **Reporting**: one progress event per status change, delivered to every subscriber
//!
//! A failing, missing, or panicking file ends in `error` without touching its
//! siblings.

mod config;
mod locks;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::ConversionOrchestrator;
pub use types::{
    AudioFile, ConversionProgress, FileStatus, OrchestratorError, OrchestratorStatus,
    SubmittedBatch,
};
