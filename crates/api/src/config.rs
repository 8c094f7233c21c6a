use std::path::PathBuf;
use std::time::Duration;

use cad3d_cloud::StorageConfig;
use cad3d_core::engine::{EngineCommand, DEFAULT_ENGINE_TIMEOUT};
use cad3d_core::job::DEFAULT_PROMPT;
use cad3d_core::storage::{StorageBackendType, DEFAULT_INPUT_BUCKET, DEFAULT_OUTPUT_BUCKET};
use cad3d_pipeline::OrchestratorConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `330`). Must exceed the
    /// engine budget or the layer answers 408 while the job is still running.
    pub request_timeout_secs: u64,
    /// Largest accepted request body (default: 20 MiB).
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `330`                      |
    /// | `MAX_BODY_BYTES`       | `20971520`                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = var("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "330".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_body_bytes: usize = var("MAX_BODY_BYTES")
            .unwrap_or_else(|| "20971520".into())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_body_bytes,
        }
    }
}

/// Everything a conversion job needs besides the database.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub engine: EngineCommand,
    pub staging_dir: PathBuf,
    pub default_prompt: String,
    pub storage: StorageConfig,
}

impl ConversionConfig {
    /// Load conversion settings from environment variables with defaults.
    ///
    /// | Env Var               | Default                           |
    /// |-----------------------|-----------------------------------|
    /// | `ENGINE_PROGRAM`      | `cad3dify-engine`                 |
    /// | `ENGINE_ARGS`         | (none, whitespace-separated)      |
    /// | `ENGINE_TIMEOUT_SECS` | `300`                             |
    /// | `STAGING_DIR`         | `<tmp>/cad3d-staging`             |
    /// | `DEFAULT_PROMPT`      | built-in drawing prompt           |
    /// | `STORAGE_BACKEND`     | `local` (`local` or `s3`)         |
    /// | `INPUT_BUCKET`        | `drawings`                        |
    /// | `OUTPUT_BUCKET`       | `models`                          |
    /// | `STORAGE_PUBLIC_URL`  | `http://localhost:3000/storage`   |
    /// | `LOCAL_STORAGE_ROOT`  | `./storage`                       |
    /// | `S3_ENDPOINT`         | (unset)                           |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let program = var("ENGINE_PROGRAM").unwrap_or_else(|| "cad3dify-engine".into());
        let args: Vec<String> = var("ENGINE_ARGS")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let timeout = match var("ENGINE_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .expect("ENGINE_TIMEOUT_SECS must be a valid u64"),
            ),
            None => DEFAULT_ENGINE_TIMEOUT,
        };

        let staging_dir = var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("cad3d-staging"));

        let default_prompt = var("DEFAULT_PROMPT")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let backend = StorageBackendType::from_name(
            &var("STORAGE_BACKEND").unwrap_or_else(|| "local".into()),
        )
        .expect("STORAGE_BACKEND must be 'local' or 's3'");

        let storage = StorageConfig {
            backend,
            input_bucket: var("INPUT_BUCKET").unwrap_or_else(|| DEFAULT_INPUT_BUCKET.into()),
            output_bucket: var("OUTPUT_BUCKET").unwrap_or_else(|| DEFAULT_OUTPUT_BUCKET.into()),
            public_base_url: var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|| "http://localhost:3000/storage".into()),
            local_root: var("LOCAL_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./storage")),
            s3_endpoint: var("S3_ENDPOINT").filter(|e| !e.is_empty()),
        };

        Self {
            engine: EngineCommand {
                program: program.into(),
                args,
                timeout,
            },
            staging_dir,
            default_prompt,
            storage,
        }
    }

    /// Orchestrator settings derived from this configuration.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new(self.staging_dir.clone(), self.engine.clone());
        config.default_prompt = self.default_prompt.clone();
        config
    }
}
