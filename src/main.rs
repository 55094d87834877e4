use anyhow::{Context, Result};
use clap::Parser;
use pathos::{
    create_router, AnnotationLayer, AppState, Config, DetectionController, FrameSize,
    FrameSourceFactory, OverlayRenderer, RemoteClassifier, SessionConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "pathos", version, about = "Live facial emotion overlay service")]
struct Args {
    /// Config file path, without extension
    #[arg(long, default_value = "config/pathos")]
    config: String,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Pathos v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Inference backend: {}", cfg.backend.url);

    let viewport = FrameSize::new(cfg.overlay.viewport_width, cfg.overlay.viewport_height);
    let layer = Arc::new(AnnotationLayer::new(viewport));
    let renderer = Arc::new(
        OverlayRenderer::new(layer.clone()).with_min_confidence(cfg.detection.min_confidence),
    );

    let capture = FrameSourceFactory::create(&cfg.capture)?;
    let remote = Arc::new(
        RemoteClassifier::new(
            &cfg.backend.url,
            Duration::from_millis(cfg.backend.health_timeout_ms),
        )
        .context("Invalid backend URL")?,
    );

    let session_config = SessionConfig::from_settings(&cfg.detection, &cfg.backend);
    let controller = Arc::new(DetectionController::new(
        session_config,
        capture.source,
        remote,
        renderer,
    ));

    let state = AppState::new(controller.clone(), layer).with_feed(capture.feed);
    let app = create_router(state);

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Err(e) = controller.stop().await {
        error!("Failed to stop detection: {}", e);
    }

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
