//! Error types for the encoder adapter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running one encode.
///
/// These stay inside the adapter: [`FfmpegEncoder`](super::FfmpegEncoder)
/// folds them into an [`EncodeResult`](super::EncodeResult) before they reach
/// the orchestrator. Only [`version`](super::Encoder::version) returns them.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    EncoderNotFound { path: PathBuf },

    /// FFmpeg exists but does not behave like ffmpeg.
    #[error("FFmpeg at {path} is not usable: {reason}")]
    EncoderUnusable { path: PathBuf, reason: String },

    /// Input file missing or unreadable.
    #[error("Cannot read input {path}: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// Output directory does not exist and could not be created.
    #[error("Cannot write to output directory {path}: {reason}")]
    OutputDirectoryFailed { path: PathBuf, reason: String },

    /// FFmpeg exited unsuccessfully.
    #[error("{}", encode_failed_message(.code, .stderr))]
    EncodeFailed {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Encode timed out.
    #[error("Encode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// FFmpeg reported success but left no output behind.
    #[error("FFmpeg exited successfully but produced no output at {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn encode_failed_message(code: &Option<i32>, stderr: &Option<String>) -> String {
    let status = match code {
        Some(code) => format!("FFmpeg exited with code {}", code),
        None => "FFmpeg was terminated by a signal".to_string(),
    };
    match stderr {
        Some(stderr) => format!("{}: {}", status, stderr),
        None => status,
    }
}

impl EncoderError {
    /// Creates an encode failed error from an exit code and raw stderr.
    pub fn encode_failed(code: Option<i32>, stderr: &str) -> Self {
        let stderr = stderr.trim();
        Self::EncodeFailed {
            code,
            stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
        }
    }

    /// Whether this error points at the environment rather than one file.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            Self::EncoderNotFound { .. } | Self::EncoderUnusable { .. }
        )
    }
}
