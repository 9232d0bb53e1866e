//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::EncoderConfig;
use super::error::EncoderError;
use super::traits::Encoder;
use super::types::{EncodeOutput, EncodeResult};
use crate::registry::{config_for, ValidatedOptions};

/// Lines of ffmpeg stderr kept for failure reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based encoder implementation.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Builds the ffmpeg argument vector for one encode.
    ///
    /// Every option-derived flag is looked up in the capability table, so a
    /// field the format does not support never reaches the command line.
    pub fn build_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ValidatedOptions,
    ) -> Vec<String> {
        let format = config_for(options.format());

        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
        ];

        if format.audio_only {
            args.push("-vn".to_string());
        }

        args.extend(["-c:a".to_string(), format.audio_codec.to_string()]);

        if format.supports_bitrate {
            if let Some(bitrate) = options.bitrate() {
                args.extend(["-b:a".to_string(), bitrate.to_string()]);
            }
        }

        if let (Some(flag), Some(quality)) = (format.quality_flag, options.quality()) {
            if format.supports_quality {
                args.extend([flag.to_string(), quality.to_string()]);
            }
        }

        if let Some(rate) = options.sample_rate() {
            args.extend(["-ar".to_string(), rate.to_string()]);
        }

        if let Some(channels) = options.channels() {
            args.extend(["-ac".to_string(), channels.to_string()]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        args.extend(["-f".to_string(), format.muxer.to_string()]);
        args.push(output_path.to_string_lossy().to_string());

        args
    }

    fn spawn_error(&self, e: std::io::Error) -> EncoderError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EncoderError::EncoderNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            EncoderError::Io(e)
        }
    }

    /// Runs one encode and returns the output details.
    async fn run_encode(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ValidatedOptions,
        input_size: u64,
    ) -> Result<EncodeOutput, EncoderError> {
        let start = Instant::now();

        if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                EncoderError::OutputDirectoryFailed {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
        }

        let args = self.build_args(input_path, output_path, options);
        debug!(ffmpeg = %self.config.ffmpeg_path.display(), ?args, "Spawning ffmpeg");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    input = %input_path.display(),
                    timeout_secs = self.config.timeout_secs,
                    "FFmpeg timed out, killing process"
                );
                return Err(EncoderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncoderError::encode_failed(
                output.status.code(),
                &stderr_tail(&stderr),
            ));
        }

        let output_meta = tokio::fs::metadata(output_path)
            .await
            .map_err(|_| EncoderError::OutputMissing {
                path: output_path.to_path_buf(),
            })?;

        Ok(EncodeOutput {
            output_path: output_path.to_path_buf(),
            input_size,
            output_size: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Keeps the last few lines of ffmpeg's stderr.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[skip..].join("\n")
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn version(&self) -> Result<String, EncoderError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or_default().trim();

        if !output.status.success() || !first_line.starts_with("ffmpeg version") {
            return Err(EncoderError::EncoderUnusable {
                path: self.config.ffmpeg_path.clone(),
                reason: if first_line.is_empty() {
                    format!("`-version` exited with {}", output.status)
                } else {
                    format!("unexpected version banner: {}", first_line)
                },
            });
        }

        Ok(first_line.to_string())
    }

    async fn encode_to(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ValidatedOptions,
    ) -> EncodeResult {
        let input_size = match tokio::fs::metadata(input_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                let err = EncoderError::InputUnreadable {
                    path: input_path.to_path_buf(),
                    reason: "not a regular file".to_string(),
                };
                return EncodeResult::failure(&err, None);
            }
            Err(e) => {
                let err = EncoderError::InputUnreadable {
                    path: input_path.to_path_buf(),
                    reason: e.to_string(),
                };
                return EncodeResult::failure(&err, None);
            }
        };

        match self
            .run_encode(input_path, output_path, options, input_size)
            .await
        {
            Ok(output) => EncodeResult::Success(output),
            Err(e) => EncodeResult::failure(&e, Some(input_size)),
        }
    }
}
