//! Map the pipeline's terminal state onto the reported [`JobOutcome`].

use cad3d_core::artifact::PublishedArtifact;
use cad3d_core::outcome::JobOutcome;

use crate::error::PipelineError;
use crate::recorder::MetadataRecord;

/// Everything a fully successful pipeline produced.
#[derive(Debug, Clone)]
pub struct Completed {
    pub input: PublishedArtifact,
    pub output: PublishedArtifact,
    pub record: MetadataRecord,
}

/// Build the outcome. The metadata record only ever affects `model_id`.
pub fn report(result: &Result<Completed, PipelineError>) -> JobOutcome {
    match result {
        Ok(done) => JobOutcome::succeeded(
            done.input.url.clone(),
            done.output.url.clone(),
            done.record.id().map(str::to_string),
        ),
        Err(e) => JobOutcome::failed(e.error_text()),
    }
}
