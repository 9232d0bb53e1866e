//! The static per-format capability table.

use super::types::{FormatConfig, OutputFormat};

const LOSSY_BITRATES: &[&str] = &["64k", "128k", "192k", "256k", "320k"];

const MP3: FormatConfig = FormatConfig {
    supports_bitrate: true,
    bitrate_options: LOSSY_BITRATES,
    default_bitrate: "192k",
    supports_quality: true,
    quality_label: "VBR Quality (0=best, 9=worst)",
    quality_range: (0, 9),
    default_quality: "2",
    muxer: "mp3",
    audio_codec: "libmp3lame",
    quality_flag: Some("-q:a"),
    audio_only: true,
};

const WAV: FormatConfig = FormatConfig {
    supports_bitrate: false,
    bitrate_options: &[],
    default_bitrate: "",
    supports_quality: false,
    quality_label: "",
    quality_range: (0, 0),
    default_quality: "",
    muxer: "wav",
    audio_codec: "pcm_s16le",
    quality_flag: None,
    audio_only: true,
};

const AAC: FormatConfig = FormatConfig {
    supports_bitrate: true,
    bitrate_options: LOSSY_BITRATES,
    default_bitrate: "192k",
    supports_quality: false,
    quality_label: "",
    quality_range: (0, 0),
    default_quality: "",
    muxer: "adts",
    audio_codec: "aac",
    quality_flag: None,
    audio_only: true,
};

const OGG: FormatConfig = FormatConfig {
    supports_bitrate: true,
    bitrate_options: LOSSY_BITRATES,
    default_bitrate: "192k",
    supports_quality: true,
    quality_label: "Quality (-1 to 10, higher=better)",
    quality_range: (-1, 10),
    default_quality: "5",
    muxer: "ogg",
    audio_codec: "libvorbis",
    quality_flag: Some("-q:a"),
    audio_only: true,
};

const FLAC: FormatConfig = FormatConfig {
    supports_bitrate: false,
    bitrate_options: &[],
    default_bitrate: "",
    supports_quality: true,
    quality_label: "Compression Level (0=fast, 8=small)",
    quality_range: (0, 8),
    default_quality: "5",
    muxer: "flac",
    audio_codec: "flac",
    quality_flag: Some("-compression_level"),
    audio_only: true,
};

const M4A: FormatConfig = FormatConfig {
    supports_bitrate: true,
    bitrate_options: LOSSY_BITRATES,
    default_bitrate: "192k",
    supports_quality: false,
    quality_label: "",
    quality_range: (0, 0),
    default_quality: "",
    muxer: "ipod",
    audio_codec: "aac",
    quality_flag: None,
    audio_only: true,
};

const MP4: FormatConfig = FormatConfig {
    supports_bitrate: true,
    bitrate_options: LOSSY_BITRATES,
    default_bitrate: "192k",
    supports_quality: false,
    quality_label: "",
    quality_range: (0, 0),
    default_quality: "",
    muxer: "mp4",
    audio_codec: "aac",
    quality_flag: None,
    audio_only: false,
};

/// Returns the capabilities of `format`.
pub fn config_for(format: OutputFormat) -> &'static FormatConfig {
    match format {
        OutputFormat::Mp3 => &MP3,
        OutputFormat::Wav => &WAV,
        OutputFormat::Aac => &AAC,
        OutputFormat::Ogg => &OGG,
        OutputFormat::Flac => &FLAC,
        OutputFormat::M4a => &M4A,
        OutputFormat::Mp4 => &MP4,
    }
}

/// Returns every format with its capabilities, in presentation order.
pub fn all_formats() -> impl Iterator<Item = (OutputFormat, &'static FormatConfig)> {
    OutputFormat::ALL.into_iter().map(|f| (f, config_for(f)))
}
