use serde::Serialize;
use soundshift_core::{Config, ConversionOrchestrator, Encoder};
use tracing::{error, info};

/// Result of probing the encoder binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EncoderStatus {
    Available { version: String },
    Unavailable { reason: String },
}

impl EncoderStatus {
    /// Probes `encoder` once and logs the outcome.
    pub async fn probe(encoder: &dyn Encoder) -> Self {
        match encoder.version().await {
            Ok(version) => {
                info!(encoder = encoder.name(), %version, "Encoder available");
                Self::Available { version }
            }
            Err(e) => {
                error!(
                    encoder = encoder.name(),
                    "Encoder unavailable, conversions are disabled until restart: {}", e
                );
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: ConversionOrchestrator,
    /// Encoder probe taken at startup; gates conversions.
    startup_encoder: EncoderStatus,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: ConversionOrchestrator,
        startup_encoder: EncoderStatus,
    ) -> Self {
        Self {
            config,
            orchestrator,
            startup_encoder,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &ConversionOrchestrator {
        &self.orchestrator
    }

    pub fn startup_encoder(&self) -> &EncoderStatus {
        &self.startup_encoder
    }
}
