//! Format capability registry.
//!
//! A process-wide, immutable table describing which options each output
//! format accepts, plus how those options map onto encoder flags. The table
//! is plain `'static` data, so workers share it without synchronization.
//!
//! # Example
//!
//! ```
//! use soundshift_core::registry::{config_for, validate, ConversionOptions, OutputFormat};
//!
//! let options = ConversionOptions::new(OutputFormat::Mp3).with_bitrate("192k");
//! let validated = validate(&options).unwrap();
//! assert_eq!(validated.bitrate(), Some("192k"));
//! assert!(config_for(OutputFormat::Mp3).supports_quality);
//! ```

mod table;
mod types;
mod validate;

pub use table::{all_formats, config_for};
pub use types::{ConversionOptions, FormatConfig, OutputFormat, ValidatedOptions, ValidationError};
pub use validate::validate;
