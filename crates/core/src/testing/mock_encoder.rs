//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::encoder::{EncodeOutput, EncodeResult, Encoder, EncoderError};
use crate::registry::{OutputFormat, ValidatedOptions};

/// A recorded encode for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub bitrate: Option<String>,
    pub quality: Option<i32>,
    /// Whether the encode succeeded.
    pub success: bool,
}

/// How the mock treats one specific input path.
#[derive(Debug, Clone)]
enum Behavior {
    Fail(String),
    Panic,
}

/// Mock implementation of the Encoder trait.
///
/// Provides controllable behavior for testing:
/// - Track encodes for assertions
/// - Fail or panic for chosen input paths
/// - Simulate encode duration
/// - Report the highest number of overlapping encodes
///
/// # Example
///
/// ```rust,ignore
/// use soundshift_core::testing::MockEncoder;
///
/// let encoder = MockEncoder::new();
/// encoder.fail_on("/music/bad.wav", "FFmpeg exited with code 1").await;
///
/// // Hand it to a ConversionOrchestrator, run a batch...
///
/// assert_eq!(encoder.encode_count().await, 3);
/// ```
#[derive(Debug)]
pub struct MockEncoder {
    /// Recorded encodes.
    encodes: Arc<RwLock<Vec<RecordedEncode>>>,
    /// Per-path behavior overrides.
    behaviors: Arc<RwLock<HashMap<PathBuf, Behavior>>>,
    /// Simulated encode duration in milliseconds.
    encode_duration_ms: Arc<RwLock<u64>>,
    /// Reason `version()` fails, if set.
    unavailable: Arc<RwLock<Option<String>>>,
    /// Sizes reported for successful encodes.
    sizes: Arc<RwLock<(u64, u64)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    /// Create a new mock encoder.
    pub fn new() -> Self {
        Self {
            encodes: Arc::new(RwLock::new(Vec::new())),
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            encode_duration_ms: Arc::new(RwLock::new(10)),
            unavailable: Arc::new(RwLock::new(None)),
            sizes: Arc::new(RwLock::new((4096, 1024))),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Get all recorded encodes.
    pub async fn recorded_encodes(&self) -> Vec<RecordedEncode> {
        self.encodes.read().await.clone()
    }

    /// Input paths of every encode, in the order they started.
    pub async fn encoded_paths(&self) -> Vec<PathBuf> {
        self.encodes
            .read()
            .await
            .iter()
            .map(|e| e.input_path.clone())
            .collect()
    }

    /// Get the number of encodes performed.
    pub async fn encode_count(&self) -> usize {
        self.encodes.read().await.len()
    }

    /// Make every encode of `path` fail with `reason`.
    pub async fn fail_on(&self, path: impl AsRef<Path>, reason: impl Into<String>) {
        self.behaviors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), Behavior::Fail(reason.into()));
    }

    /// Make every encode of `path` panic.
    pub async fn panic_on(&self, path: impl AsRef<Path>) {
        self.behaviors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), Behavior::Panic);
    }

    /// Remove all per-path overrides.
    pub async fn clear_behaviors(&self) {
        self.behaviors.write().await.clear();
    }

    /// Set the simulated encode duration.
    pub async fn set_encode_duration(&self, duration: Duration) {
        *self.encode_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Make `version()` report the encoder as unusable.
    pub async fn set_unavailable(&self, reason: impl Into<String>) {
        *self.unavailable.write().await = Some(reason.into());
    }

    /// Set the input and output sizes reported on success.
    pub async fn set_sizes(&self, input_size: u64, output_size: u64) {
        *self.sizes.write().await = (input_size, output_size);
    }

    /// Highest number of encodes that ran at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn version(&self) -> Result<String, EncoderError> {
        match self.unavailable.read().await.clone() {
            Some(reason) => Err(EncoderError::EncoderUnusable {
                path: PathBuf::from("mock"),
                reason,
            }),
            None => Ok("mock version 1.0".to_string()),
        }
    }

    async fn encode_to(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ValidatedOptions,
    ) -> EncodeResult {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let behavior = self.behaviors.read().await.get(input_path).cloned();
        let mut record = RecordedEncode {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            format: options.format(),
            bitrate: options.bitrate().map(str::to_string),
            quality: options.quality(),
            success: false,
        };

        let duration = *self.encode_duration_ms.read().await;
        if duration > 0 {
            tokio::time::sleep(Duration::from_millis(duration)).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let (input_size, output_size) = *self.sizes.read().await;
        let result = match behavior {
            Some(Behavior::Panic) => {
                self.encodes.write().await.push(record);
                panic!("mock encoder panic for {}", input_path.display());
            }
            Some(Behavior::Fail(reason)) => EncodeResult::Failure {
                reason,
                input_size: Some(input_size),
            },
            None => {
                record.success = true;
                EncodeResult::Success(EncodeOutput {
                    output_path: output_path.to_path_buf(),
                    input_size,
                    output_size,
                    duration_ms: duration,
                })
            }
        };

        self.encodes.write().await.push(record);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{validate, ConversionOptions};

    #[tokio::test]
    async fn test_mock_success_records_options() {
        let encoder = MockEncoder::new();
        let options =
            validate(&ConversionOptions::new(OutputFormat::Mp3).with_bitrate("256k")).unwrap();

        let result = encoder.encode(Path::new("/m/a.wav"), None, &options).await;

        match result {
            EncodeResult::Success(output) => {
                assert_eq!(output.output_path, PathBuf::from("/m/a.mp3"));
                assert_eq!(output.output_size, 1024);
            }
            EncodeResult::Failure { .. } => panic!("expected success"),
        }
        let recorded = encoder.recorded_encodes().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].bitrate.as_deref(), Some("256k"));
        assert_eq!(recorded[0].output_path, PathBuf::from("/m/a.mp3"));
        assert!(recorded[0].success);
    }

    #[tokio::test]
    async fn test_mock_failure_and_version() {
        let encoder = MockEncoder::new();
        encoder.fail_on("/m/bad.wav", "boom").await;
        encoder.set_unavailable("not installed").await;
        let options = validate(&ConversionOptions::new(OutputFormat::Wav)).unwrap();

        let result = encoder.encode(Path::new("/m/bad.wav"), None, &options).await;
        assert!(!result.is_success());
        assert!(encoder.version().await.is_err());
    }
}
