use crate::engine::{EngineError, EngineHandle};
use facepause_core::{DrawingSurface, ImageCanvas};
use facepause_hw::CaptureRequest;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedCanvas = Arc<Mutex<ImageCanvas>>;

/// Binds the user-facing camera and sizes the overlay canvas to it.
pub struct CameraSource {
    engine: EngineHandle,
    request: CaptureRequest,
    canvas: SharedCanvas,
}

impl CameraSource {
    pub fn new(engine: EngineHandle, request: CaptureRequest, canvas: SharedCanvas) -> Self {
        Self {
            engine,
            request,
            canvas,
        }
    }

    /// Bind the camera stream. Returns once the stream is open; the canvas
    /// is resized later, once, when the first frame reports its size.
    pub async fn init_camera(&self) -> Result<(), EngineError> {
        tracing::info!(
            width = self.request.width,
            height = self.request.height,
            "requesting camera"
        );
        let metadata = self.engine.bind_camera(self.request.clone()).await?;

        let canvas = Arc::clone(&self.canvas);
        tokio::spawn(async move {
            if let Ok(size) = metadata.await {
                canvas.lock().await.resize(size.width, size.height);
                tracing::debug!(width = size.width, height = size.height, "canvas resized");
            }
        });
        Ok(())
    }
}
