use tracing::debug;

use super::table::config_for;
use super::types::{ConversionOptions, ValidatedOptions, ValidationError};

/// Validates `options` against the capabilities of `options.format`.
///
/// Fields the format does not support are dropped rather than rejected, since
/// the presentation layer resets them on format change anyway. Blank strings
/// count as unset.
pub fn validate(options: &ConversionOptions) -> Result<ValidatedOptions, ValidationError> {
    let format = options.format;
    let config = config_for(format);

    let bitrate = match non_blank(options.bitrate.as_deref()) {
        Some(bitrate) if config.supports_bitrate => {
            if !config.accepts_bitrate(bitrate) {
                return Err(ValidationError::UnsupportedBitrate {
                    format,
                    bitrate: bitrate.to_string(),
                    allowed: config.bitrate_options.join(", "),
                });
            }
            Some(bitrate.to_string())
        }
        Some(bitrate) => {
            debug!(%format, bitrate, "Dropping bitrate for format without bitrate support");
            None
        }
        None => None,
    };

    let quality = match non_blank(options.quality.as_deref()) {
        Some(raw) if config.supports_quality => {
            let quality: i32 = raw.parse().map_err(|_| ValidationError::MalformedQuality {
                format,
                quality: raw.to_string(),
            })?;
            if !config.accepts_quality(quality) {
                let (min, max) = config.quality_range;
                return Err(ValidationError::QualityOutOfRange {
                    format,
                    quality,
                    min,
                    max,
                });
            }
            Some(quality)
        }
        Some(raw) => {
            debug!(%format, quality = raw, "Dropping quality for format without quality support");
            None
        }
        None => None,
    };

    if options.sample_rate == Some(0) {
        return Err(ValidationError::InvalidSampleRate);
    }
    if options.channels == Some(0) {
        return Err(ValidationError::InvalidChannels);
    }

    Ok(ValidatedOptions {
        format,
        bitrate,
        sample_rate: options.sample_rate,
        channels: options.channels,
        quality,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
