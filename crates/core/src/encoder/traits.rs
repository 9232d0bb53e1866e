//! Trait definitions for the encoder adapter.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::EncoderError;
use super::types::EncodeResult;
use crate::registry::{OutputFormat, ValidatedOptions};

/// Something that can encode one input file into an output format.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Returns the encoder's version string, or why it cannot be used.
    async fn version(&self) -> Result<String, EncoderError>;

    /// Computes where the output for `input_path` will be written.
    ///
    /// The output goes into `output_dir` when given, else next to the input.
    /// It never equals `input_path`.
    fn output_path_for(
        &self,
        input_path: &Path,
        output_dir: Option<&Path>,
        format: OutputFormat,
    ) -> PathBuf {
        output_path_for(input_path, output_dir, format)
    }

    /// Encodes one file next to its input or into `output_dir`.
    ///
    /// Never fails: every problem is reported as [`EncodeResult::Failure`].
    async fn encode(
        &self,
        input_path: &Path,
        output_dir: Option<&Path>,
        options: &ValidatedOptions,
    ) -> EncodeResult {
        let output_path = self.output_path_for(input_path, output_dir, options.format());
        self.encode_to(input_path, &output_path, options).await
    }

    /// Encodes one file to an exact output path, creating its parent
    /// directory when missing. Blocks the calling task until the encode
    /// finishes.
    async fn encode_to(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &ValidatedOptions,
    ) -> EncodeResult;
}

/// Default output naming: `<stem>.<ext>`, or `<stem>_converted.<ext>` when the
/// plain name would overwrite the input. Names differing only in ASCII case
/// count as the same file.
pub fn output_path_for(
    input_path: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let candidate = dir.join(format!("{}.{}", stem, format.extension()));
    if collision_key(&candidate) == collision_key(input_path) {
        dir.join(format!("{}_converted.{}", stem, format.extension()))
    } else {
        candidate
    }
}

/// `<stem>_<n>.<ext>` next to `path`, used when `path` is already claimed.
pub fn numbered_output_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

/// Key under which two paths name the same file, on case-insensitive
/// filesystems included.
pub fn collision_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
