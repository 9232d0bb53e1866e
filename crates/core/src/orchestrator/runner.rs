//! Conversion orchestrator implementation.
//!
//! Each file of a batch runs in its own task and walks
//! `pending -> converting -> {done, error}`, publishing one event per step.
//! Tasks share one semaphore, so the pool bounds encodes across all batches.
//!
//! Output paths are planned when a batch is submitted. Two files never get
//! the same output and no output lands on an input: a clash is renamed to
//! `<stem>_<n>.<ext>`, counting up from 2. Encodes that read or write the
//! same file run one after another, even across batches.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::encoder::{collision_key, numbered_output_path, EncodeResult, Encoder};
use crate::events::{ProgressBroadcaster, ProgressReceiver};
use crate::metrics;
use crate::registry::{validate, ConversionOptions, OutputFormat, ValidatedOptions};

use super::config::OrchestratorConfig;
use super::locks::PathLocks;
use super::types::{
    AudioFile, ConversionProgress, FileStatus, OrchestratorError, OrchestratorStatus,
    SubmittedBatch,
};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

/// A tracked file plus the batch that last (re-)initialized it.
struct TrackedFile {
    batch_id: Uuid,
    file: AudioFile,
    /// Output reserved for the file's latest encode.
    output: PathBuf,
}

/// Files of the current batch plus unfinished files of earlier ones, in
/// first-submission order.
#[derive(Default)]
struct FileTable {
    order: Vec<PathBuf>,
    files: HashMap<PathBuf, TrackedFile>,
    current_batch: Option<Uuid>,
}

impl FileTable {
    /// Drops settled records whose path is not part of `batch`.
    fn evict_settled(&mut self, batch: &HashSet<PathBuf>) -> usize {
        let before = self.files.len();
        self.files
            .retain(|path, tracked| batch.contains(path) || !tracked.file.status.is_terminal());
        let files = &self.files;
        self.order.retain(|path| files.contains_key(path));
        before - self.files.len()
    }

    /// Picks one output per path so that no two outputs coincide and no
    /// output is an input of this batch or of a file still tracked.
    fn plan_outputs(
        &self,
        paths: &[PathBuf],
        encoder: &dyn Encoder,
        output_dir: Option<&Path>,
        format: OutputFormat,
    ) -> Vec<PathBuf> {
        let batch: HashSet<&PathBuf> = paths.iter().collect();
        let mut taken: HashSet<String> = paths.iter().map(|p| collision_key(p)).collect();
        for (path, tracked) in &self.files {
            if !batch.contains(path) {
                taken.insert(collision_key(path));
                taken.insert(collision_key(&tracked.output));
            }
        }

        paths
            .iter()
            .map(|path| {
                let base = encoder.output_path_for(path, output_dir, format);
                let mut output = base.clone();
                let mut n = 2;
                while !taken.insert(collision_key(&output)) {
                    output = numbered_output_path(&base, n);
                    n += 1;
                }
                output
            })
            .collect()
    }

    /// Resets `path` to a fresh pending record owned by `batch_id`.
    fn reset(&mut self, batch_id: Uuid, path: &Path, output: PathBuf) -> AudioFile {
        let file = AudioFile::pending(path);
        let previous = self.files.insert(
            path.to_path_buf(),
            TrackedFile {
                batch_id,
                file: file.clone(),
                output,
            },
        );
        if previous.is_none() {
            self.order.push(path.to_path_buf());
        }
        file
    }

    /// Stores `file` unless a newer batch has taken over its path.
    fn store(&mut self, batch_id: Uuid, file: &AudioFile) -> bool {
        match self.files.get_mut(&file.path) {
            Some(tracked) if tracked.batch_id == batch_id => {
                tracked.file = file.clone();
                true
            }
            _ => false,
        }
    }
}

/// One file's slot in a batch, handed to its worker task.
struct FileJob {
    batch_id: Uuid,
    file: AudioFile,
    output_path: PathBuf,
    index: usize,
    total: usize,
    format: OutputFormat,
    options: Arc<Result<ValidatedOptions, String>>,
    remaining: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

/// State shared between the orchestrator handle and its worker tasks.
struct Shared {
    config: OrchestratorConfig,
    encoder: Arc<dyn Encoder>,
    events: ProgressBroadcaster,
    semaphore: Arc<Semaphore>,
    pool_size: usize,
    stats: PoolStats,
    files: RwLock<FileTable>,
    path_locks: PathLocks,
}

/// Accepts batches of files and drives one encode per file.
#[derive(Clone)]
pub struct ConversionOrchestrator {
    shared: Arc<Shared>,
}

impl ConversionOrchestrator {
    /// Create a new orchestrator around `encoder`.
    pub fn new(config: OrchestratorConfig, encoder: Arc<dyn Encoder>) -> Self {
        let events = ProgressBroadcaster::new();
        Self::with_events(config, encoder, events)
    }

    /// Create an orchestrator publishing into an existing broadcaster.
    pub fn with_events(
        config: OrchestratorConfig,
        encoder: Arc<dyn Encoder>,
        events: ProgressBroadcaster,
    ) -> Self {
        let pool_size = config.effective_parallelism();
        info!(
            encoder = encoder.name(),
            pool_size,
            output_dir = ?config.output_dir,
            "Creating conversion orchestrator"
        );

        Self {
            shared: Arc::new(Shared {
                config,
                encoder,
                events,
                semaphore: Arc::new(Semaphore::new(pool_size)),
                pool_size,
                stats: PoolStats::default(),
                files: RwLock::new(FileTable::default()),
                path_locks: PathLocks::default(),
            }),
        }
    }

    pub fn events(&self) -> &ProgressBroadcaster {
        &self.shared.events
    }

    /// Subscribe to progress events published from now on.
    pub fn subscribe(&self) -> ProgressReceiver {
        self.shared.events.subscribe()
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.shared.encoder
    }

    /// Starts converting a batch and returns its id and size.
    ///
    /// Returns once every file is registered as `pending` and its worker is
    /// spawned; results arrive only as progress events. Duplicate paths are
    /// dropped, keeping the first occurrence. Settled files of earlier
    /// batches stop being tracked.
    pub async fn convert(
        &self,
        paths: Vec<PathBuf>,
        options: ConversionOptions,
    ) -> Result<SubmittedBatch, OrchestratorError> {
        let mut seen = HashSet::new();
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        if paths.is_empty() {
            return Err(OrchestratorError::EmptyBatch);
        }

        let batch_id = Uuid::new_v4();
        let total = paths.len();
        let format = options.format;

        let validated = validate(&options).map_err(|e| e.to_string());
        if let Err(reason) = &validated {
            warn!(%batch_id, %format, "Rejected conversion options: {}", reason);
        }
        let validated = Arc::new(validated);

        info!(%batch_id, %format, total, "Starting conversion batch");
        metrics::BATCHES_STARTED.inc();
        metrics::FILES_SUBMITTED.inc_by(total as u64);

        let planned: Vec<(AudioFile, PathBuf)> = {
            let mut table = self.shared.files.write().await;
            let evicted = table.evict_settled(&seen);
            if evicted > 0 {
                debug!(%batch_id, evicted, "Evicted settled records of earlier batches");
            }

            let outputs = table.plan_outputs(
                &paths,
                self.shared.encoder.as_ref(),
                self.shared.config.output_dir.as_deref(),
                format,
            );
            table.current_batch = Some(batch_id);
            paths
                .iter()
                .zip(outputs)
                .map(|(path, output)| (table.reset(batch_id, path, output.clone()), output))
                .collect()
        };

        // Pending events go out before any worker can publish.
        for (index, (file, _)) in planned.iter().enumerate() {
            self.shared
                .events
                .publish(ConversionProgress::from_file(batch_id, file, index, total));
        }

        let remaining = Arc::new(AtomicUsize::new(total));
        let failed = Arc::new(AtomicUsize::new(0));

        for (index, (file, output_path)) in planned.into_iter().enumerate() {
            let job = FileJob {
                batch_id,
                file,
                output_path,
                index,
                total,
                format,
                options: Arc::clone(&validated),
                remaining: Arc::clone(&remaining),
                failed: Arc::clone(&failed),
            };
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                shared.run_file(job).await;
            });
        }

        Ok(SubmittedBatch { batch_id, total })
    }

    /// Snapshot of every tracked file, in first-submission order.
    pub async fn files(&self) -> Vec<AudioFile> {
        let table = self.shared.files.read().await;
        table
            .order
            .iter()
            .filter_map(|p| table.files.get(p))
            .map(|t| t.file.clone())
            .collect()
    }

    /// Current tracked record for `path`, if any.
    pub async fn file(&self, path: &Path) -> Option<AudioFile> {
        let table = self.shared.files.read().await;
        table.files.get(path).map(|t| t.file.clone())
    }

    /// Returns the current worker pool status.
    pub async fn status(&self) -> OrchestratorStatus {
        let table = self.shared.files.read().await;
        let stats = &self.shared.stats;
        OrchestratorStatus {
            pool_size: self.shared.pool_size,
            active_encodes: stats.active.load(Ordering::Relaxed) as usize,
            queued_encodes: stats.queued.load(Ordering::Relaxed) as usize,
            total_processed: stats.total_processed.load(Ordering::Relaxed),
            total_failed: stats.total_failed.load(Ordering::Relaxed),
            current_batch: table.current_batch,
            tracked_files: table.files.len(),
        }
    }
}

impl Shared {
    /// Drives one file to a terminal state. Never panics on encoder failure.
    async fn run_file(&self, mut job: FileJob) {
        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        metrics::QUEUED_ENCODES.inc();

        // Held until the encode ends; the pool slot is taken only after it.
        let path_guard = self
            .path_locks
            .acquire(vec![
                collision_key(&job.file.path),
                collision_key(&job.output_path),
            ])
            .await;
        let permit = self.semaphore.acquire().await;

        self.stats.queued.fetch_sub(1, Ordering::Relaxed);
        metrics::QUEUED_ENCODES.dec();

        job.file.status = FileStatus::Converting;
        self.record(&job).await;

        let outcome = match (&permit, job.options.as_ref()) {
            (Err(_), _) => EncodeResult::Failure {
                reason: "worker pool is closed".to_string(),
                input_size: None,
            },
            (Ok(_), Err(reason)) => EncodeResult::Failure {
                reason: reason.clone(),
                input_size: None,
            },
            (Ok(_), Ok(options)) => self.encode(&job, options).await,
        };
        drop(permit);
        drop(path_guard);

        match outcome {
            EncodeResult::Success(output) => {
                info!(
                    batch_id = %job.batch_id,
                    file = %job.file.path.display(),
                    output = %output.output_path.display(),
                    duration_ms = output.duration_ms,
                    "Conversion done"
                );
                self.stats.total_processed.fetch_add(1, Ordering::Relaxed);
                metrics::OUTPUT_BYTES
                    .with_label_values(&[job.format.extension()])
                    .inc_by(output.output_size);

                job.file.status = FileStatus::Done;
                job.file.output_path = Some(output.output_path);
                job.file.input_size = Some(output.input_size);
                job.file.output_size = Some(output.output_size);
            }
            EncodeResult::Failure { reason, input_size } => {
                warn!(
                    batch_id = %job.batch_id,
                    file = %job.file.path.display(),
                    "Conversion failed: {}",
                    reason
                );
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                job.failed.fetch_add(1, Ordering::Relaxed);

                job.file.status = FileStatus::Error;
                job.file.error = Some(reason);
                job.file.input_size = input_size;
            }
        }
        self.record(&job).await;

        if job.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let failed = job.failed.load(Ordering::Relaxed);
            info!(
                batch_id = %job.batch_id,
                total = job.total,
                succeeded = job.total - failed,
                failed,
                "Conversion batch finished"
            );
        }
    }

    /// Runs the encoder for one file, turning a panic into a failure.
    async fn encode(&self, job: &FileJob, options: &ValidatedOptions) -> EncodeResult {
        let format = job.format.extension();
        metrics::ENCODES_STARTED.with_label_values(&[format]).inc();
        metrics::ACTIVE_ENCODES.inc();
        self.stats.active.fetch_add(1, Ordering::Relaxed);
        debug!(
            file = %job.file.path.display(),
            output = %job.output_path.display(),
            "Encoding"
        );

        let start = Instant::now();
        let outcome = AssertUnwindSafe(self.encoder.encode_to(
            &job.file.path,
            &job.output_path,
            options,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| EncodeResult::Failure {
            reason: format!("encoder panicked: {}", panic_message(panic.as_ref())),
            input_size: None,
        });

        self.stats.active.fetch_sub(1, Ordering::Relaxed);
        metrics::ACTIVE_ENCODES.dec();

        let result = if outcome.is_success() { "success" } else { "failure" };
        metrics::ENCODES_TOTAL
            .with_label_values(&[format, result])
            .inc();
        metrics::ENCODE_DURATION
            .with_label_values(&[format, result])
            .observe(start.elapsed().as_secs_f64());

        outcome
    }

    /// Stores the job's record and publishes it as an event.
    async fn record(&self, job: &FileJob) {
        let stored = self.files.write().await.store(job.batch_id, &job.file);
        if !stored {
            debug!(
                batch_id = %job.batch_id,
                file = %job.file.path.display(),
                "Record taken over by a newer batch, publishing only"
            );
        }
        self.events.publish(ConversionProgress::from_file(
            job.batch_id,
            &job.file,
            job.index,
            job.total,
        ));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
