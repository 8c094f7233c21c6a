use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cad3d_api::config::{ConversionConfig, ServerConfig};
use cad3d_api::router::build_app_router;
use cad3d_api::state::AppState;
use cad3d_core::metadata::MetadataStore;
use cad3d_core::storage::StorageBackendType;
use cad3d_pipeline::publisher::Publisher;
use cad3d_pipeline::Orchestrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cad3d_api=debug,cad3d_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let conversion = ConversionConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    tracing::info!(
        engine = %conversion.engine.program.display(),
        budget_secs = conversion.engine.timeout.as_secs(),
        staging_dir = %conversion.staging_dir.display(),
        storage = conversion.storage.backend.label(),
        "Loaded conversion configuration",
    );
    if config.request_timeout_secs <= conversion.engine.timeout.as_secs() {
        tracing::warn!(
            request_timeout_secs = config.request_timeout_secs,
            engine_timeout_secs = conversion.engine.timeout.as_secs(),
            "Request timeout does not exceed the engine budget; slow jobs will answer 408",
        );
    }

    // --- Database (optional) ---
    let pool = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = cad3d_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            cad3d_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            cad3d_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");
            Some(pool)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; conversions will not be recorded");
            None
        }
    };

    // --- Object storage ---
    let buckets = cad3d_cloud::build_buckets(&conversion.storage).await;
    tracing::info!(
        inputs = buckets.inputs.bucket(),
        outputs = buckets.outputs.bucket(),
        "Object storage ready",
    );

    // --- Orchestrator ---
    let metadata = pool
        .clone()
        .map(|pool| Arc::new(cad3d_db::PgMetadataStore::new(pool)) as Arc<dyn MetadataStore>);
    let orchestrator = Arc::new(Orchestrator::new(
        conversion.orchestrator_config(),
        Publisher::new(buckets.inputs, buckets.outputs),
        metadata,
    ));

    // --- App state ---
    let local_storage = match conversion.storage.backend {
        StorageBackendType::Local => Some(conversion.storage.local_root.clone()),
        StorageBackendType::S3 => None,
    };
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator,
        local_storage,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
///
/// Requests still waiting on a conversion are answered before the server
/// exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
