use anyhow::{Context, Result};
use facepause_core::ImageCanvas;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod attention;
mod camera_source;
mod config;
mod dbus_interface;
mod detection;
mod engine;
mod face_detector;
mod page;
mod player;
mod session;
#[cfg(test)]
mod testing;

use attention::AttentionController;
use camera_source::{CameraSource, SharedCanvas};
use config::Config;
use dbus_interface::{FacepauseService, BUS_NAME, OBJECT_PATH};
use detection::DetectionLoop;
use engine::HardwareBackend;
use face_detector::FaceDetector;
use page::Page;
use player::MprisPlayer;
use session::SessionController;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("facepaused starting");

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(
        camera = config.camera_device.as_deref().unwrap_or("auto"),
        model = %config.model_path(),
        interval_ms = config.check_interval_ms,
        player = config.player.as_deref().unwrap_or("auto"),
        "configuration loaded"
    );

    let backend = HardwareBackend::new(config.camera_device.clone(), config.model_path());
    let engine = engine::spawn_engine(backend, config.warmup_frames)?;

    let connection = zbus::Connection::session()
        .await
        .context("failed to connect to the session bus")?;

    let page = Page::shared();
    let canvas: SharedCanvas = Arc::new(Mutex::new(ImageCanvas::default()));
    let player = MprisPlayer::new(connection.clone(), config.player.clone());

    let detection = DetectionLoop::new(
        CameraSource::new(engine.clone(), config.capture_request(), Arc::clone(&canvas)),
        FaceDetector::new(engine),
        AttentionController::new(page.clone(), player),
        Arc::clone(&canvas),
        config.check_interval(),
    );
    let session = SessionController::new(detection, page.clone());
    let service = FacepauseService::new(session, page, canvas);

    connection.object_server().at(OBJECT_PATH, service).await?;
    connection
        .request_name(BUS_NAME)
        .await
        .with_context(|| format!("failed to acquire bus name {BUS_NAME}"))?;

    tracing::info!(name = BUS_NAME, path = OBJECT_PATH, "facepaused ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("facepaused shutting down");

    Ok(())
}
