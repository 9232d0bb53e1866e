//! Testing utilities and mock implementations.
//!
//! [`MockEncoder`] stands in for ffmpeg so the orchestrator and the HTTP
//! layer can be exercised without an encoder installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use soundshift_core::testing::{fixtures, MockEncoder};
//!
//! let encoder = MockEncoder::new();
//! encoder.panic_on("/music/cursed.wav").await;
//!
//! let dir = tempfile::tempdir()?;
//! let wav = fixtures::write_silent_wav(dir.path(), "a.wav", 100)?;
//! ```

mod mock_encoder;

pub use mock_encoder::{MockEncoder, RecordedEncode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    const SAMPLE_RATE: u32 = 44_100;
    const CHANNELS: u16 = 2;
    const BITS_PER_SAMPLE: u16 = 16;

    /// Write a silent 16-bit stereo 44.1 kHz WAV file of `millis` length.
    pub fn write_silent_wav(dir: &Path, name: &str, millis: u32) -> std::io::Result<PathBuf> {
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let frames = SAMPLE_RATE as u64 * millis as u64 / 1000;
        let data_len = (frames * block_align as u64) as u32;

        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&CHANNELS.to_le_bytes());
        bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(44 + data_len as usize, 0);

        let path = dir.join(name);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(&bytes)?;
        Ok(path)
    }

    /// Whether an ffmpeg binary can be run from `PATH`.
    pub fn ffmpeg_available() -> bool {
        std::process::Command::new("ffmpeg")
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

}
