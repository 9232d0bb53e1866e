//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the conversion orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum encodes running at once, shared by all batches.
    /// 0 means one per available CPU.
    #[serde(default)]
    pub max_parallel_encodes: usize,

    /// Directory receiving every output.
    /// When unset, each output is written next to its input.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_encodes: 0,
            output_dir: None,
        }
    }
}

impl OrchestratorConfig {
    /// Worker pool size after resolving 0 to the CPU count.
    pub fn effective_parallelism(&self) -> usize {
        if self.max_parallel_encodes > 0 {
            return self.max_parallel_encodes;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
