//! End-to-end orchestrator tests.
//!
//! The engine is a bash script fixture; object storage is in memory; the
//! metadata store is a counting fake that can be told to fail.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use cad3d_cloud::memory::MemoryObjectStore;
use cad3d_core::engine::EngineCommand;
use cad3d_core::job::DEFAULT_PROMPT;
use cad3d_core::metadata::{MetadataError, MetadataStore, NewJobRecord};
use cad3d_core::outcome::JobOutcome;
use cad3d_pipeline::orchestrator::JOB_LOST_ERROR_TEXT;
use cad3d_pipeline::publisher::Publisher;
use cad3d_pipeline::{ConversionRequest, Orchestrator, OrchestratorConfig};
use tempfile::TempDir;

const PUBLIC_URL: &str = "http://storage.test";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeMetadata {
    fail: bool,
    next_id: AtomicU64,
    records: Mutex<Vec<NewJobRecord>>,
}

#[async_trait]
impl MetadataStore for FakeMetadata {
    async fn record(&self, record: &NewJobRecord) -> Result<String, MetadataError> {
        if self.fail {
            return Err(MetadataError::Unavailable("connection refused".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok((self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string())
    }
}

/// Metadata store whose insert panics, taking the job task down with it.
struct PanickingMetadata;

#[async_trait]
impl MetadataStore for PanickingMetadata {
    async fn record(&self, _record: &NewJobRecord) -> Result<String, MetadataError> {
        panic!("metadata driver crashed");
    }
}

/// Write `body` as a bash script in `dir` and run it through `/bin/bash`.
fn script_engine(dir: &Path, body: &str, budget: Duration) -> EngineCommand {
    let script = dir.join("engine.sh");
    std::fs::write(&script, format!("#!/bin/bash\n{body}")).unwrap();
    EngineCommand {
        program: "/bin/bash".into(),
        args: vec![script.to_string_lossy().into_owned()],
        timeout: budget,
    }
}

struct Harness {
    staging: TempDir,
    _scripts: TempDir,
    inputs: Arc<MemoryObjectStore>,
    outputs: Arc<MemoryObjectStore>,
    metadata: Arc<FakeMetadata>,
    orchestrator: Arc<Orchestrator>,
}

impl Harness {
    fn new(engine_body: &str) -> Self {
        Self::build(engine_body, Duration::from_secs(10), FakeMetadata::default(), true)
    }

    fn build(engine_body: &str, budget: Duration, metadata: FakeMetadata, with_db: bool) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let scripts = tempfile::tempdir().unwrap();
        let engine = script_engine(scripts.path(), engine_body, budget);

        let inputs = Arc::new(MemoryObjectStore::new("drawings", PUBLIC_URL));
        let outputs = Arc::new(MemoryObjectStore::new("models", PUBLIC_URL));
        let metadata = Arc::new(metadata);
        let metadata_store: Option<Arc<dyn MetadataStore>> = if with_db {
            Some(metadata.clone())
        } else {
            None
        };

        let orchestrator = Orchestrator::new(
            OrchestratorConfig::new(staging.path().join("jobs"), engine),
            Publisher::new(inputs.clone(), outputs.clone()),
            metadata_store,
        );

        Self {
            staging,
            _scripts: scripts,
            inputs,
            outputs,
            metadata,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Number of entries left in the staging root.
    fn staged_entries(&self) -> usize {
        count_entries(&self.staging.path().join("jobs"))
    }

    /// Bytes stored behind a published model URL.
    fn model_bytes(&self, outcome: &JobOutcome) -> Vec<u8> {
        let url = outcome.step_url.as_deref().expect("step url");
        let key = url
            .strip_prefix(&format!("{PUBLIC_URL}/models/"))
            .expect("model url prefix");
        self.outputs.get(key).expect("stored model").bytes
    }
}

fn count_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn png(payload: &str) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(payload.as_bytes());
    bytes
}

fn request(bytes: &[u8], file_name: &str, prompt: Option<&str>) -> ConversionRequest {
    ConversionRequest {
        image_data: base64::engine::general_purpose::STANDARD.encode(bytes),
        file_name: file_name.to_string(),
        prompt: prompt.map(str::to_string),
    }
}

/// Engine that "converts" by copying the drawing to the output path.
const COPY_ENGINE: &str = "cp \"$1\" \"$2\"\n";

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_conversion_publishes_both_artifacts() {
    let harness = Harness::new(COPY_ENGINE);
    let drawing = png("bracket");

    let outcome = harness
        .orchestrator
        .run(request(&drawing, "bracket.png", Some("an L bracket")))
        .await;

    assert!(outcome.success, "{outcome:?}");
    assert!(outcome.is_consistent());
    assert_eq!(outcome.model_id.as_deref(), Some("1"));
    assert!(outcome.image_url.as_deref().unwrap().starts_with(PUBLIC_URL));
    assert!(outcome.step_url.as_deref().unwrap().ends_with("-model.step"));
    assert_eq!(harness.model_bytes(&outcome), drawing);
    assert_eq!(harness.inputs.len(), 1);

    let records = harness.metadata.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "an L bracket");
    assert_eq!(Some(records[0].step_url.as_str()), outcome.step_url.as_deref());
    drop(records);

    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn engine_failure_reports_stderr() {
    let harness = Harness::new("echo 'Error: unsupported geometry' >&2\nexit 1\n");

    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("unsupported geometry"));
    assert!(harness.inputs.is_empty());
    assert!(harness.outputs.is_empty());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn missing_output_reports_artifact_not_generated() {
    let harness = Harness::new("exit 0\n");

    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("artifact not generated"));
    assert!(harness.outputs.is_empty());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn slow_engine_reports_timeout_within_budget() {
    let harness = Harness::build(
        "echo partial > \"$2\"\nexec sleep 60\n",
        Duration::from_millis(300),
        FakeMetadata::default(),
        true,
    );

    let start = Instant::now();
    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("processing timeout"));
    assert!(start.elapsed() < Duration::from_secs(5), "took {:?}", start.elapsed());
    assert!(harness.outputs.is_empty());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn output_upload_rejection_reports_store_reason() {
    let harness = Harness::new(COPY_ENGINE);
    harness.outputs.reject_uploads("bucket quota exceeded");

    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("bucket quota exceeded"));
    assert!(harness.metadata.records.lock().unwrap().is_empty());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn input_upload_rejection_reports_store_reason() {
    let harness = Harness::new(COPY_ENGINE);
    harness.inputs.reject_uploads("permission denied");

    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("permission denied"));
    assert!(harness.outputs.is_empty());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn metadata_failure_keeps_success_with_null_model_id() {
    let harness = Harness::build(
        COPY_ENGINE,
        Duration::from_secs(10),
        FakeMetadata {
            fail: true,
            ..FakeMetadata::default()
        },
        true,
    );

    let outcome = harness.orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(outcome.success, "{outcome:?}");
    assert!(outcome.model_id.is_none());
    assert!(outcome.image_url.is_some() && outcome.step_url.is_some());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn disabled_metadata_store_keeps_success() {
    let harness = Harness::build(COPY_ENGINE, Duration::from_secs(10), FakeMetadata::default(), false);

    let outcome = harness.orchestrator.run(request(&png("x"), "x.jpg", None)).await;

    assert!(outcome.success);
    assert!(outcome.model_id.is_none());
    assert!(outcome.image_url.as_deref().unwrap().ends_with("-drawing.jpg"));
}

#[tokio::test]
async fn undecodable_image_is_a_staging_failure() {
    let harness = Harness::new(COPY_ENGINE);

    let outcome = harness
        .orchestrator
        .run(ConversionRequest {
            image_data: "%%% not base64 %%%".into(),
            file_name: "x.png".into(),
            prompt: None,
        })
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("base64"));
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn missing_engine_binary_is_an_engine_failure() {
    let staging = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::new(staging.path(), EngineCommand::new("/nonexistent/engine")),
        Publisher::new(
            Arc::new(MemoryObjectStore::new("drawings", PUBLIC_URL)),
            Arc::new(MemoryObjectStore::new("models", PUBLIC_URL)),
        ),
        None,
    );

    let outcome = orchestrator.run(request(&png("x"), "x.png", None)).await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("failed to start engine"));
    assert_eq!(count_entries(staging.path()), 0);
}

// ---------------------------------------------------------------------------
// Prompt handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_reaches_engine_and_defaults_when_absent() {
    let harness = Harness::new("printf '%s' \"$4\" > \"$2\"\n");

    let custom = harness
        .orchestrator
        .run(request(&png("a"), "a.png", Some("a hex nut")))
        .await;
    let default = harness.orchestrator.run(request(&png("b"), "b.png", None)).await;

    assert_eq!(harness.model_bytes(&custom), b"a hex nut");
    assert_eq!(harness.model_bytes(&default), DEFAULT_PROMPT.as_bytes());
}

// ---------------------------------------------------------------------------
// Cleanup, completion and isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_of_jobs_leaves_no_staged_files() {
    // Odd-sized drawings fail in the engine, even-sized ones succeed.
    let harness = Harness::new(
        "if [ $(( $(wc -c < \"$1\") % 2 )) -eq 1 ]; then echo odd >&2; exit 1; fi\ncp \"$1\" \"$2\"\n",
    );
    assert_eq!(harness.staged_entries(), 0);

    let mut successes = 0;
    for i in 0..8 {
        let payload = "x".repeat(i);
        let outcome = harness
            .orchestrator
            .run(request(&png(&payload), "p.png", None))
            .await;
        assert!(outcome.is_consistent());
        if outcome.success {
            successes += 1;
        }
        assert_eq!(harness.staged_entries(), 0, "after job {i}");
    }

    assert_eq!(successes, 4);
}

#[tokio::test]
async fn submitted_job_signals_completion_once() {
    let harness = Harness::new(COPY_ENGINE);

    let handle = harness.orchestrator.submit(request(&png("x"), "x.png", None));
    let job_id = handle.job_id();
    let outcome = handle.outcome().await;

    assert!(outcome.success);
    assert!(outcome.step_url.as_deref().unwrap().contains(&job_id.to_string()));
}

#[tokio::test]
async fn dropped_handle_still_cleans_up() {
    let harness = Harness::new("sleep 0.2\ncp \"$1\" \"$2\"\n");

    drop(harness.orchestrator.submit(request(&png("x"), "x.png", None)));

    let deadline = Instant::now() + Duration::from_secs(5);
    while harness.outputs.is_empty() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // Give the job a moment to release its workspace after publishing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(harness.outputs.len(), 1);
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_jobs_do_not_share_staged_files() {
    let harness = Harness::new("sleep 0.2\ncp \"$1\" \"$2\"\n");

    let drawings: Vec<Vec<u8>> = (0..6).map(|i| png(&format!("drawing-{i}"))).collect();
    let handles: Vec<_> = drawings
        .iter()
        .map(|d| harness.orchestrator.submit(request(d, "same-name.png", None)))
        .collect();

    for (drawing, handle) in drawings.iter().zip(handles) {
        let outcome = handle.outcome().await;
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(&harness.model_bytes(&outcome), drawing);
    }

    assert_eq!(harness.outputs.len(), 6);
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn panicking_job_task_reports_lost_job_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let scripts = tempfile::tempdir().unwrap();
    let root = staging.path().join("jobs");
    let outputs = Arc::new(MemoryObjectStore::new("models", PUBLIC_URL));
    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig::new(
            root.clone(),
            script_engine(scripts.path(), COPY_ENGINE, Duration::from_secs(10)),
        ),
        Publisher::new(
            Arc::new(MemoryObjectStore::new("drawings", PUBLIC_URL)),
            outputs.clone(),
        ),
        Some(Arc::new(PanickingMetadata)),
    ));

    let outcome = orchestrator
        .submit(request(&png("x"), "x.png", None))
        .outcome()
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some(JOB_LOST_ERROR_TEXT));
    assert!(outcome.step_url.is_none());
    assert_eq!(outputs.len(), 1);

    let deadline = Instant::now() + Duration::from_secs(2);
    while count_entries(&root) > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(count_entries(&root), 0);
}
