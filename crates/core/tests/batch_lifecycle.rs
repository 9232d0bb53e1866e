//! Batch lifecycle integration tests.
//!
//! These tests verify the conversion orchestrator end to end:
//! - Per-file state transitions (pending -> converting -> done/error)
//! - Failure isolation within a batch
//! - Record reset when a batch is re-run
//! - Worker pool bounds
//! - Real ffmpeg encodes, when ffmpeg is installed

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use soundshift_core::{
    testing::{fixtures, MockEncoder},
    ConversionOptions, ConversionOrchestrator, ConversionProgress, Encoder, EncoderConfig,
    FfmpegEncoder, FileStatus, OrchestratorConfig, OutputFormat, ProgressReceiver,
};

/// Test helper wiring an orchestrator to a mock encoder.
struct TestHarness {
    orchestrator: ConversionOrchestrator,
    encoder: Arc<MockEncoder>,
    events: ProgressReceiver,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_pool(4)
    }

    fn with_pool(max_parallel_encodes: usize) -> Self {
        let encoder = Arc::new(MockEncoder::new());
        let config = OrchestratorConfig {
            max_parallel_encodes,
            ..Default::default()
        };
        let orchestrator =
            ConversionOrchestrator::new(config, Arc::clone(&encoder) as Arc<dyn Encoder>);
        let events = orchestrator.subscribe();

        Self {
            orchestrator,
            encoder,
            events,
        }
    }

    async fn run(&mut self, paths: &[&str], options: ConversionOptions) -> Vec<ConversionProgress> {
        let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        let total = paths.len();
        self.orchestrator
            .convert(paths, options)
            .await
            .expect("batch rejected");
        wait_for_terminal(&mut self.events, total).await
    }
}

async fn wait_for_terminal(
    rx: &mut ProgressReceiver,
    count: usize,
) -> Vec<ConversionProgress> {
    let mut events = Vec::new();
    let mut terminal = 0;
    while terminal < count {
        let event = tokio::time::timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("timed out waiting for progress")
            .expect("progress channel closed");
        if event.status.is_terminal() {
            terminal += 1;
        }
        events.push(event);
    }
    events
}

fn statuses_by_file(events: &[ConversionProgress]) -> HashMap<PathBuf, Vec<FileStatus>> {
    let mut by_file: HashMap<PathBuf, Vec<FileStatus>> = HashMap::new();
    for event in events {
        by_file
            .entry(event.file_path.clone())
            .or_default()
            .push(event.status);
    }
    by_file
}

#[tokio::test]
async fn test_every_file_walks_the_lifecycle() {
    let mut harness = TestHarness::new();
    harness.encoder.fail_on("/music/b.wav", "FFmpeg exited with code 1").await;

    let events = harness
        .run(
            &["/music/a.wav", "/music/b.wav", "/music/c.wav"],
            ConversionOptions::new(OutputFormat::Mp3).with_bitrate("192k"),
        )
        .await;

    let by_file = statuses_by_file(&events);
    assert_eq!(by_file.len(), 3);
    for (path, statuses) in &by_file {
        let expected_last = if path == Path::new("/music/b.wav") {
            FileStatus::Error
        } else {
            FileStatus::Done
        };
        assert_eq!(
            statuses,
            &vec![FileStatus::Pending, FileStatus::Converting, expected_last],
            "unexpected transitions for {}",
            path.display()
        );
    }

    // All pending events precede any converting event.
    let first_converting = events
        .iter()
        .position(|e| e.status == FileStatus::Converting)
        .unwrap();
    assert!(events[..first_converting]
        .iter()
        .all(|e| e.status == FileStatus::Pending));
    assert_eq!(first_converting, 3);
}

#[tokio::test]
async fn test_failure_is_isolated() {
    let mut harness = TestHarness::with_pool(1);
    harness.encoder.fail_on("/music/02.wav", "Cannot read input").await;

    let paths = ["/music/01.wav", "/music/02.wav", "/music/03.wav", "/music/04.wav"];
    harness
        .run(&paths, ConversionOptions::new(OutputFormat::Flac).with_quality("8"))
        .await;

    let files = harness.orchestrator.files().await;
    assert_eq!(files.len(), 4);
    let failed: Vec<_> = files.iter().filter(|f| f.status == FileStatus::Error).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path, PathBuf::from("/music/02.wav"));
    assert!(failed[0].output_path.is_none());
    assert_eq!(failed[0].error.as_deref(), Some("Cannot read input"));

    for file in files.iter().filter(|f| f.status == FileStatus::Done) {
        assert!(file.error.is_none());
        assert_eq!(file.output_path, Some(file.path.with_extension("flac")));
        assert_eq!(file.output_size, Some(1024));
    }
    assert_eq!(harness.encoder.encode_count().await, 4);
}

#[tokio::test]
async fn test_rerun_resets_previous_results() {
    let mut harness = TestHarness::new();
    harness.encoder.fail_on("/music/a.wav", "first run failure").await;

    harness
        .run(&["/music/a.wav"], ConversionOptions::new(OutputFormat::Ogg))
        .await;
    let first = harness.orchestrator.files().await;
    assert_eq!(first[0].status, FileStatus::Error);

    harness.encoder.clear_behaviors().await;
    let mut rx = harness.orchestrator.subscribe();
    harness
        .orchestrator
        .convert(vec!["/music/a.wav".into()], ConversionOptions::new(OutputFormat::Ogg))
        .await
        .unwrap();

    // The pending event of the re-run carries no leftovers.
    let pending = rx.recv().await.unwrap();
    assert_eq!(pending.status, FileStatus::Pending);
    assert!(pending.error.is_none());
    assert!(pending.output_path.is_none());
    assert!(pending.input_size.is_none());
    assert!(pending.output_size.is_none());

    wait_for_terminal(&mut rx, 1).await;
    let second = harness.orchestrator.files().await;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].status, FileStatus::Done);
    assert!(second[0].error.is_none());
}

#[tokio::test]
async fn test_worker_pool_bounds_concurrency() {
    let mut harness = TestHarness::with_pool(2);
    harness
        .encoder
        .set_encode_duration(Duration::from_millis(50))
        .await;

    let paths: Vec<String> = (0..6).map(|i| format!("/music/{}.wav", i)).collect();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    harness
        .run(&refs, ConversionOptions::new(OutputFormat::Wav))
        .await;

    assert!(harness.encoder.max_concurrent() <= 2);
    assert_eq!(harness.encoder.encode_count().await, 6);
    let status = harness.orchestrator.status().await;
    assert_eq!(status.active_encodes, 0);
    assert_eq!(status.queued_encodes, 0);
    assert_eq!(status.total_processed, 6);
}

#[tokio::test]
async fn test_events_carry_batch_id_and_positions() {
    let mut harness = TestHarness::new();
    let batch = harness
        .orchestrator
        .convert(
            vec!["/music/a.wav".into(), "/music/b.wav".into()],
            ConversionOptions::new(OutputFormat::M4a),
        )
        .await
        .unwrap();

    let events = wait_for_terminal(&mut harness.events, 2).await;
    assert_eq!(batch.total, 2);
    assert!(events.iter().all(|e| e.batch_id == batch.batch_id && e.total == 2));
    let a_index = events
        .iter()
        .find(|e| e.file_path == Path::new("/music/a.wav"))
        .unwrap()
        .index;
    assert_eq!(a_index, 0);
}

#[tokio::test]
async fn test_nonexistent_input_with_real_adapter() {
    // Fails before spawning, so no ffmpeg is needed.
    let encoder = FfmpegEncoder::new(EncoderConfig::with_path("/nonexistent/ffmpeg"));
    let orchestrator = ConversionOrchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(encoder) as Arc<dyn Encoder>,
    );
    let mut rx = orchestrator.subscribe();

    orchestrator
        .convert(
            vec!["/definitely/missing.wav".into()],
            ConversionOptions::new(OutputFormat::Mp3),
        )
        .await
        .unwrap();
    wait_for_terminal(&mut rx, 1).await;

    let file = &orchestrator.files().await[0];
    assert_eq!(file.status, FileStatus::Error);
    assert!(!file.error.as_deref().unwrap_or_default().is_empty());
    assert!(file.output_path.is_none());
}

#[tokio::test]
async fn test_wav_to_mp3_with_ffmpeg() {
    if !fixtures::ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }

    let source_dir = TempDir::new().unwrap();
    let good = fixtures::write_silent_wav(source_dir.path(), "a.wav", 500).unwrap();
    let missing = source_dir.path().join("missing.wav");

    let orchestrator = ConversionOrchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(FfmpegEncoder::with_defaults()) as Arc<dyn Encoder>,
    );
    let mut rx = orchestrator.subscribe();

    orchestrator
        .convert(
            vec![good.clone(), missing.clone()],
            ConversionOptions::new(OutputFormat::Mp3).with_bitrate("192k"),
        )
        .await
        .unwrap();
    wait_for_terminal(&mut rx, 2).await;

    let done = orchestrator.file(&good).await.unwrap();
    assert_eq!(done.status, FileStatus::Done, "error: {:?}", done.error);
    let output = done.output_path.unwrap();
    assert_eq!(output, source_dir.path().join("a.mp3"));
    assert!(output.exists());
    assert!(done.output_size.unwrap() > 0);
    assert!(done.input_size.unwrap() > 0);

    let failed = orchestrator.file(&missing).await.unwrap();
    assert_eq!(failed.status, FileStatus::Error);
}

#[tokio::test]
async fn test_same_format_writes_converted_copy_with_ffmpeg() {
    if !fixtures::ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }

    let source_dir = TempDir::new().unwrap();
    let input = fixtures::write_silent_wav(source_dir.path(), "a.wav", 200).unwrap();
    let before = std::fs::read(&input).unwrap();

    let orchestrator = ConversionOrchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(FfmpegEncoder::with_defaults()) as Arc<dyn Encoder>,
    );
    let mut rx = orchestrator.subscribe();
    orchestrator
        .convert(vec![input.clone()], ConversionOptions::new(OutputFormat::Wav))
        .await
        .unwrap();
    wait_for_terminal(&mut rx, 1).await;

    let file = orchestrator.file(&input).await.unwrap();
    assert_eq!(file.status, FileStatus::Done, "error: {:?}", file.error);
    assert_eq!(file.output_path, Some(source_dir.path().join("a_converted.wav")));
    assert_eq!(std::fs::read(&input).unwrap(), before);
}
