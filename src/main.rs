use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use bellhop::auth::TokenAuth;
use bellhop::engine::Engine;
use bellhop::payment::SimulatedGateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("BELLHOP_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    bellhop::observability::init(metrics_port);

    let port = std::env::var("BELLHOP_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("BELLHOP_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("BELLHOP_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let tokens = std::env::var("BELLHOP_TOKENS").unwrap_or_default();
    let compact_threshold: u64 = std::env::var("BELLHOP_COMPACT_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;
    let wal_path = PathBuf::from(&data_dir).join("bellhop.wal");

    let auth = Arc::new(TokenAuth::parse(&tokens));
    if auth.is_empty() {
        tracing::warn!("no tokens configured (BELLHOP_TOKENS empty), all requests will be 401");
    }

    let engine = Arc::new(Engine::new(wal_path, Arc::new(SimulatedGateway))?);
    tokio::spawn(bellhop::maintenance::run_compactor(
        engine.clone(),
        compact_threshold,
    ));

    let app = bellhop::http::router(engine, auth);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("bellhop listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!("  compact_threshold: {compact_threshold}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight requests
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
        info!("shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("bellhop stopped");
    Ok(())
}
