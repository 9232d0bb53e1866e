//! Encoder process adapter.
//!
//! Turns validated options into one external ffmpeg invocation per file and
//! reports the outcome as an [`EncodeResult`]. Nothing this module does for
//! one file can raise into the caller.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{EncoderConfig, FFMPEG_LOG_LEVELS};
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::{collision_key, numbered_output_path, output_path_for, Encoder};
pub use types::{EncodeOutput, EncodeResult};
