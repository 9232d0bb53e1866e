//! Types for the format capability registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output format selectable for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MPEG Audio Layer III
    Mp3,
    /// WAVE (uncompressed PCM)
    Wav,
    /// Raw AAC in an ADTS stream
    Aac,
    /// Ogg Vorbis
    Ogg,
    /// Free Lossless Audio Codec
    Flac,
    /// AAC in an MPEG-4 audio container
    M4a,
    /// MPEG-4 Part 14
    Mp4,
}

impl OutputFormat {
    /// Every supported output format, in presentation order.
    pub const ALL: [OutputFormat; 7] = [
        Self::Mp3,
        Self::Wav,
        Self::Aac,
        Self::Ogg,
        Self::Flac,
        Self::M4a,
        Self::Mp4,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| ValidationError::UnknownFormat(s.to_string()))
    }
}

/// Capabilities and encoder mapping of one output format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatConfig {
    pub supports_bitrate: bool,
    pub bitrate_options: &'static [&'static str],
    pub default_bitrate: &'static str,
    pub supports_quality: bool,
    pub quality_label: &'static str,
    /// Inclusive (min, max).
    pub quality_range: (i32, i32),
    pub default_quality: &'static str,
    /// Value passed to ffmpeg's `-f`.
    pub muxer: &'static str,
    /// Value passed to ffmpeg's `-c:a`.
    pub audio_codec: &'static str,
    /// Encoder flag carrying the quality value, when quality is supported.
    pub quality_flag: Option<&'static str>,
    /// Whether video streams are dropped from the output.
    pub audio_only: bool,
}

impl FormatConfig {
    /// Whether `bitrate` is one of the enumerated options.
    pub fn accepts_bitrate(&self, bitrate: &str) -> bool {
        self.supports_bitrate && self.bitrate_options.contains(&bitrate)
    }

    /// Whether `quality` lies inside the inclusive range.
    pub fn accepts_quality(&self, quality: i32) -> bool {
        let (min, max) = self.quality_range;
        self.supports_quality && (min..=max).contains(&quality)
    }
}

/// Options requested by the presentation layer for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    pub format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl ConversionOptions {
    /// Options for `format` with everything else left to the source.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            bitrate: None,
            sample_rate: None,
            channels: None,
            quality: None,
        }
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = Some(bitrate.into());
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate = Some(hz);
        self
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }
}

/// Options that passed validation against the registry.
///
/// Unsupported fields have already been dropped, so every present field is
/// legal for `format`. Only [`validate`](super::validate) builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedOptions {
    pub(super) format: OutputFormat,
    pub(super) bitrate: Option<String>,
    pub(super) sample_rate: Option<u32>,
    pub(super) channels: Option<u32>,
    pub(super) quality: Option<i32>,
}

impl ValidatedOptions {
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn bitrate(&self) -> Option<&str> {
        self.bitrate.as_deref()
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn channels(&self) -> Option<u32> {
        self.channels
    }

    pub fn quality(&self) -> Option<i32> {
        self.quality
    }
}

/// Errors raised when options are illegal for the chosen format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Format name is not one of the supported formats.
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    /// Bitrate is not one of the format's enumerated options.
    #[error("bitrate {bitrate} is not supported for {format} (allowed: {allowed})")]
    UnsupportedBitrate {
        format: OutputFormat,
        bitrate: String,
        allowed: String,
    },

    /// Quality could not be parsed as an integer.
    #[error("quality {quality:?} for {format} is not an integer")]
    MalformedQuality { format: OutputFormat, quality: String },

    /// Quality lies outside the format's inclusive range.
    #[error("quality {quality} for {format} is outside {min}..={max}")]
    QualityOutOfRange {
        format: OutputFormat,
        quality: i32,
        min: i32,
        max: i32,
    },

    /// Sample rate must be a positive integer.
    #[error("sample rate must be a positive integer")]
    InvalidSampleRate,

    /// Channel count must be a positive integer.
    #[error("channel count must be a positive integer")]
    InvalidChannels,
}
