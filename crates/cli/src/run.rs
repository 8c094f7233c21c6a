//! One-shot conversion against the local storage backend.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use cad3d_cloud::local::LocalObjectStore;
use cad3d_core::engine::EngineCommand;
use cad3d_core::outcome::JobOutcome;
use cad3d_core::storage::{DEFAULT_INPUT_BUCKET, DEFAULT_OUTPUT_BUCKET};
use cad3d_pipeline::publisher::Publisher;
use cad3d_pipeline::{ConversionRequest, Orchestrator, OrchestratorConfig};

use crate::cli::Cli;

/// Run the whole pipeline for `cli.image` and return its outcome.
///
/// Problems before the job starts (unreadable image, unusable output
/// directory) are reported as failure outcomes too.
pub async fn convert(cli: &Cli) -> JobOutcome {
    let bytes = match tokio::fs::read(&cli.image).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return JobOutcome::failed(format!("cannot read {}: {e}", cli.image.display()));
        }
    };

    let out_dir = match prepare_out_dir(&cli.out_dir).await {
        Ok(dir) => dir,
        Err(e) => {
            return JobOutcome::failed(format!(
                "cannot use output directory {}: {e}",
                cli.out_dir.display()
            ));
        }
    };
    let public_base = format!("file://{}", out_dir.display());

    let engine = EngineCommand {
        program: cli.engine.clone(),
        args: cli.engine_args.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let staging_dir = cli
        .staging_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("cad3d-staging"));

    let orchestrator = Orchestrator::new(
        OrchestratorConfig::new(staging_dir, engine),
        Publisher::new(
            Arc::new(LocalObjectStore::new(&out_dir, DEFAULT_INPUT_BUCKET, &public_base)),
            Arc::new(LocalObjectStore::new(&out_dir, DEFAULT_OUTPUT_BUCKET, &public_base)),
        ),
        None,
    );

    let file_name = cli
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.image.display().to_string());

    orchestrator
        .run(ConversionRequest {
            image_data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            file_name,
            prompt: cli.prompt.clone(),
        })
        .await
}

async fn prepare_out_dir(dir: &Path) -> std::io::Result<std::path::PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::canonicalize(dir).await
}
