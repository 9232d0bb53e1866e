//! Types for the conversion orchestrator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when submitting a batch.
///
/// Problems with individual files never show up here; they end in that
/// file's `error` status instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// The batch contained no paths.
    #[error("batch contains no input paths")]
    EmptyBatch,
}

/// A batch accepted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedBatch {
    pub batch_id: Uuid,
    /// Files in the batch after duplicates were dropped.
    pub total: usize,
}

/// Lifecycle state of one tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Converting,
    Done,
    Error,
}

impl FileStatus {
    /// Whether the file has reached `done` or `error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Converting => "converting",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file tracked by the orchestrator, keyed by its path.
///
/// `output_path` and `error` are never both set, and both stay unset until
/// the file reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFile {
    pub path: PathBuf,
    /// Display label, the path's final component.
    pub name: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
}

impl AudioFile {
    /// A fresh `pending` record with every optional field cleared.
    pub fn pending(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            name,
            status: FileStatus::Pending,
            output_path: None,
            error: None,
            input_size: None,
            output_size: None,
        }
    }
}

/// One status change of one file, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionProgress {
    /// Batch the file was submitted in.
    pub batch_id: Uuid,
    pub file_path: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Position within the batch, 0-based.
    pub index: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
}

impl ConversionProgress {
    /// Snapshot of `file` at position `index` of a batch of `total`.
    pub fn from_file(batch_id: Uuid, file: &AudioFile, index: usize, total: usize) -> Self {
        Self {
            batch_id,
            file_path: file.path.clone(),
            status: file.status,
            output_path: file.output_path.clone(),
            error: file.error.clone(),
            index,
            total,
            input_size: file.input_size,
            output_size: file.output_size,
        }
    }
}

/// Current status of the orchestrator's worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Maximum encodes running at once.
    pub pool_size: usize,
    /// Encodes currently running.
    pub active_encodes: usize,
    /// Files waiting for a worker slot.
    pub queued_encodes: usize,
    /// Files that finished `done` since startup.
    pub total_processed: u64,
    /// Files that finished `error` since startup.
    pub total_failed: u64,
    /// Most recently submitted batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_batch: Option<Uuid>,
    /// Files currently tracked.
    pub tracked_files: usize,
}
