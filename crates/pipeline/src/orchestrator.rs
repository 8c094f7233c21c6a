//! Conversion job orchestrator.
//!
//! Runs one job at a time per call, in the fixed stage order. Callers that
//! want throughput submit many jobs; each becomes its own Tokio task with
//! its own staging namespace, and nothing else is shared between them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cad3d_core::engine::EngineCommand;
use cad3d_core::job::{Job, DEFAULT_PROMPT};
use cad3d_core::metadata::MetadataStore;
use cad3d_core::outcome::{JobOutcome, JobState};
use cad3d_core::types::JobId;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::cleanup::StagingWorkspace;
use crate::error::PipelineError;
use crate::invoker::EngineInvoker;
use crate::publisher::Publisher;
use crate::recorder::{Recorder, DEFAULT_METADATA_TIMEOUT};
use crate::reporter::{self, Completed};
use crate::stager::Stager;

/// Error text reported when a job task ends without producing an outcome.
pub const JOB_LOST_ERROR_TEXT: &str = "conversion job terminated unexpectedly";

// ---------------------------------------------------------------------------
// Request / configuration
// ---------------------------------------------------------------------------

/// One inbound conversion request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Base64-encoded image bytes, without a data-URI prefix.
    pub image_data: String,
    /// Original file name; its extension selects the content type.
    pub file_name: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Static orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub staging_dir: PathBuf,
    pub engine: EngineCommand,
    pub default_prompt: String,
    pub metadata_timeout: Duration,
}

impl OrchestratorConfig {
    pub fn new(staging_dir: impl Into<PathBuf>, engine: EngineCommand) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            engine,
            default_prompt: DEFAULT_PROMPT.to_string(),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Job handle
// ---------------------------------------------------------------------------

/// Completion signal for a submitted job. Resolves exactly once.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    receiver: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Wait for the job's outcome.
    pub async fn outcome(self) -> JobOutcome {
        let job_id = self.job_id;
        self.receiver.await.unwrap_or_else(|_| {
            tracing::error!(job_id = %job_id, "Job task ended without reporting");
            JobOutcome::failed(JOB_LOST_ERROR_TEXT)
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    stager: Stager,
    invoker: EngineInvoker,
    publisher: Publisher,
    recorder: Recorder,
    default_prompt: String,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        publisher: Publisher,
        metadata: Option<Arc<dyn MetadataStore>>,
    ) -> Self {
        Self {
            stager: Stager::new(config.staging_dir),
            invoker: EngineInvoker::new(config.engine),
            publisher,
            recorder: Recorder::new(metadata, config.metadata_timeout),
            default_prompt: config.default_prompt,
        }
    }

    /// Run one job to completion on the current task.
    pub async fn run(&self, request: ConversionRequest) -> JobOutcome {
        let job = self.admit(&request);
        let span = job_span(&job);
        self.execute(job, request.image_data).instrument(span).await
    }

    /// Run one job on its own task and return its completion signal.
    ///
    /// The job keeps running (and cleans up) even if the handle is dropped.
    pub fn submit(self: &Arc<Self>, request: ConversionRequest) -> JobHandle {
        let job = self.admit(&request);
        let job_id = job.id;
        let span = job_span(&job);
        let (sender, receiver) = oneshot::channel();

        let this = Arc::clone(self);
        tokio::spawn(
            async move {
                let outcome = this.execute(job, request.image_data).await;
                if sender.send(outcome).is_err() {
                    tracing::debug!("Job handle dropped before completion");
                }
            }
            .instrument(span),
        );

        JobHandle { job_id, receiver }
    }

    fn admit(&self, request: &ConversionRequest) -> Job {
        let job = Job::admit(&request.file_name, request.prompt.as_deref(), &self.default_prompt);
        tracing::info!(job_id = %job.id, file_name = %job.file_name, "Conversion job received");
        job
    }

    async fn execute(&self, job: Job, image_data: String) -> JobOutcome {
        let mut state = StateTracker::new();

        let result = match self.stager.stage(&job, &image_data).await {
            Ok(workspace) => {
                state.advance(JobState::Staged);
                let result = self.run_staged(&job, &workspace, &mut state).await;
                if let Err(e) = &result {
                    fail(&mut state, e);
                }
                if let Err(e) = workspace.release().await {
                    tracing::error!(error = %e, "Failed to remove staged artifacts");
                }
                result
            }
            Err(e) => {
                fail(&mut state, &e);
                Err(e)
            }
        };
        state.advance(JobState::CleanedUp);

        let outcome = reporter::report(&result);
        state.advance(JobState::Reported);
        tracing::info!(
            success = outcome.success,
            model_id = ?outcome.model_id,
            "Conversion job reported",
        );
        outcome
    }

    async fn run_staged(
        &self,
        job: &Job,
        workspace: &StagingWorkspace,
        state: &mut StateTracker,
    ) -> Result<Completed, PipelineError> {
        self.invoker.invoke(job, workspace).await?;
        state.advance(JobState::Invoked);

        let input = self.publisher.publish_input(job, workspace.input()).await?;
        let output = self
            .publisher
            .publish_output(job, workspace.output_path())
            .await?;
        state.advance(JobState::Published);

        let record = self.recorder.record(job, &input, &output).await;
        state.advance(JobState::Recorded);

        Ok(Completed {
            input,
            output,
            record,
        })
    }
}

fn job_span(job: &Job) -> tracing::Span {
    tracing::info_span!("conversion_job", job_id = %job.id)
}

fn fail(state: &mut StateTracker, error: &PipelineError) {
    tracing::warn!(stage = error.stage(), error = %error, "Conversion job failed");
    state.advance(JobState::Failed);
}

/// Tracks the job through its lifecycle; transitions never go backwards.
struct StateTracker {
    current: JobState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: JobState::Received,
        }
    }

    fn advance(&mut self, next: JobState) {
        if !self.current.can_transition_to(next) {
            tracing::error!(from = ?self.current, to = ?next, "Illegal job state transition");
            debug_assert!(false, "illegal job state transition {:?} -> {next:?}", self.current);
        }
        tracing::debug!(from = ?self.current, to = ?next, "Job state changed");
        self.current = next;
    }
}
