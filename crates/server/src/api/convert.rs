//! Conversion API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use soundshift_core::{
    all_formats, AudioFile, ConversionOptions, FormatConfig, OrchestratorError,
    OrchestratorStatus, OutputFormat, SubmittedBatch,
};

use crate::state::{AppState, EncoderStatus};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a conversion batch
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Files to convert, in display order
    pub input_paths: Vec<PathBuf>,
    pub options: ConversionOptions,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

/// One row of the capability table
#[derive(Debug, Serialize)]
pub struct FormatEntry {
    pub format: OutputFormat,
    #[serde(flatten)]
    pub config: &'static FormatConfig,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/ffmpeg
///
/// Check that the encoder can be run and report its version.
pub async fn check_ffmpeg(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VersionResponse>, impl IntoResponse> {
    match state.orchestrator().encoder().version().await {
        Ok(version) => Ok(Json(VersionResponse { version })),
        Err(e) => Err(error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

/// POST /api/v1/convert
///
/// Start converting a batch. Returns as soon as the batch is dispatched;
/// progress arrives over the WebSocket.
pub async fn convert_audio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConvertRequest>,
) -> Result<(StatusCode, Json<SubmittedBatch>), impl IntoResponse> {
    if let EncoderStatus::Unavailable { reason } = state.startup_encoder() {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Encoder unavailable, restart after fixing it: {}", reason),
        ));
    }

    let requested = body.input_paths.len();
    match state
        .orchestrator()
        .convert(body.input_paths, body.options)
        .await
    {
        Ok(batch) => {
            info!(
                batch_id = %batch.batch_id,
                requested,
                total = batch.total,
                "Accepted conversion batch"
            );
            Ok((StatusCode::ACCEPTED, Json(batch)))
        }
        Err(e @ OrchestratorError::EmptyBatch) => {
            Err(error_response(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// GET /api/v1/formats
///
/// The per-format capability table.
pub async fn list_formats() -> Json<Vec<FormatEntry>> {
    Json(
        all_formats()
            .map(|(format, config)| FormatEntry { format, config })
            .collect(),
    )
}

/// GET /api/v1/files
///
/// Every tracked file with its latest state.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<Vec<AudioFile>> {
    Json(state.orchestrator().files().await)
}

/// GET /api/v1/status
///
/// Worker pool status.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status().await)
}
