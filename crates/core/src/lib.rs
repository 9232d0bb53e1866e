pub mod config;
pub mod encoder;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use encoder::{
    EncodeOutput, EncodeResult, Encoder, EncoderConfig, EncoderError, FfmpegEncoder,
};
pub use events::{ProgressBroadcaster, ProgressReceiver};
pub use orchestrator::{
    AudioFile, ConversionOrchestrator, ConversionProgress, FileStatus, OrchestratorConfig,
    OrchestratorError, OrchestratorStatus, SubmittedBatch,
};
pub use registry::{
    all_formats, config_for, validate, ConversionOptions, FormatConfig, OutputFormat,
    ValidatedOptions, ValidationError,
};
