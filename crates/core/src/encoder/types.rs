//! Types for the encoder adapter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::EncoderError;

/// Outcome of a successful encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOutput {
    /// Where the output was written.
    pub output_path: PathBuf,
    /// Size of the input in bytes.
    pub input_size: u64,
    /// Size of the output in bytes.
    pub output_size: u64,
    /// Wall-clock time of the encode in milliseconds.
    pub duration_ms: u64,
}

/// Result of one encode as seen by the orchestrator.
///
/// Per-file failures travel as a value rather than an error so that nothing
/// raised for one file can unwind the rest of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EncodeResult {
    /// The encoder exited successfully and the output exists.
    Success(EncodeOutput),
    /// The encode could not be started or did not succeed.
    Failure {
        /// Human-readable reason, including encoder diagnostics when available.
        reason: String,
        /// Size of the input, if it could be read before failing.
        input_size: Option<u64>,
    },
}

impl EncodeResult {
    /// Builds a failure from an adapter error.
    pub fn failure(error: &EncoderError, input_size: Option<u64>) -> Self {
        Self::Failure {
            reason: error.to_string(),
            input_size,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Input size, whichever way the encode went.
    pub fn input_size(&self) -> Option<u64> {
        match self {
            Self::Success(output) => Some(output.input_size),
            Self::Failure { input_size, .. } => *input_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_from_error() {
        let err = EncoderError::Timeout { timeout_secs: 10 };
        let result = EncodeResult::failure(&err, Some(512));
        assert!(!result.is_success());
        assert_eq!(result.input_size(), Some(512));
        match result {
            EncodeResult::Failure { reason, .. } => {
                assert_eq!(reason, "Encode timed out after 10 seconds")
            }
            EncodeResult::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_success_serialization() {
        let result = EncodeResult::Success(EncodeOutput {
            output_path: PathBuf::from("/music/a.mp3"),
            input_size: 2048,
            output_size: 1024,
            duration_ms: 15,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["output_size"], 1024);
    }
}
