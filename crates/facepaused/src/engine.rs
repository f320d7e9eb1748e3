use facepause_core::{BlazeFaceDetector, DetectorError, Dimensions, FaceBox, FaceEstimator};
use facepause_hw::{Camera, CameraError, CaptureRequest, Frame, FrameSource};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("face detection model is not loaded")]
    ModelNotLoaded,
    #[error("no camera is bound")]
    CameraNotBound,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Identifies one successful model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHandle(u64);

/// A captured frame and the faces found in it.
pub struct Detection {
    pub frame: Frame,
    pub faces: Vec<FaceBox>,
}

/// Opens the blocking resources the engine thread owns.
pub trait Backend: Send + 'static {
    fn open_camera(&mut self, request: &CaptureRequest) -> Result<Box<dyn FrameSource>, CameraError>;

    fn load_model(&mut self) -> Result<Box<dyn FaceEstimator>, DetectorError>;
}

/// V4L2 camera plus the BlazeFace ONNX model.
pub struct HardwareBackend {
    camera_device: Option<String>,
    model_path: String,
}

impl HardwareBackend {
    pub fn new(camera_device: Option<String>, model_path: String) -> Self {
        Self {
            camera_device,
            model_path,
        }
    }
}

impl Backend for HardwareBackend {
    fn open_camera(&mut self, request: &CaptureRequest) -> Result<Box<dyn FrameSource>, CameraError> {
        let camera = match &self.camera_device {
            Some(path) => Camera::open(path, request)?,
            None => Camera::open_user_facing(request)?,
        };
        tracing::info!(
            device = %camera.device_path,
            width = camera.width,
            height = camera.height,
            "camera bound"
        );
        Ok(Box::new(camera))
    }

    fn load_model(&mut self) -> Result<Box<dyn FaceEstimator>, DetectorError> {
        let detector = BlazeFaceDetector::load(&self.model_path)?;
        tracing::info!(path = %self.model_path, "BlazeFace detector loaded");
        Ok(Box::new(detector))
    }
}

/// Messages sent from async tasks to the engine thread.
enum EngineRequest {
    BindCamera {
        request: CaptureRequest,
        reply: oneshot::Sender<Result<(), EngineError>>,
        metadata: oneshot::Sender<Dimensions>,
    },
    LoadModel {
        reply: oneshot::Sender<Result<ModelHandle, EngineError>>,
    },
    Detect {
        reply: oneshot::Sender<Result<Detection, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Bind the camera. Resolves once the stream is open; the returned
    /// receiver yields the frame size after the first frame is decoded.
    pub async fn bind_camera(
        &self,
        request: CaptureRequest,
    ) -> Result<oneshot::Receiver<Dimensions>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let (metadata_tx, metadata_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::BindCamera {
                request,
                reply: reply_tx,
                metadata: metadata_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)??;
        Ok(metadata_rx)
    }

    /// Load (or reload) the face detection model.
    pub async fn load_model(&self) -> Result<ModelHandle, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::LoadModel { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Capture the current frame and run face detection on it.
    pub async fn detect(&self) -> Result<Detection, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Detect { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Nothing is opened up front: the camera and model are acquired on
/// request, so the daemon starts without hardware and reports failures
/// per toggle.
pub fn spawn_engine<B: Backend>(backend: B, warmup_frames: usize) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("facepause-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let mut state = EngineState::new(backend, warmup_frames);
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::BindCamera {
                        request,
                        reply,
                        metadata,
                    } => state.bind_camera(&request, reply, metadata),
                    EngineRequest::LoadModel { reply } => {
                        let _ = reply.send(state.load_model());
                    }
                    EngineRequest::Detect { reply } => {
                        let _ = reply.send(state.detect());
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

struct EngineState<B> {
    backend: B,
    warmup_frames: usize,
    camera: Option<Box<dyn FrameSource>>,
    model: Option<(ModelHandle, Box<dyn FaceEstimator>)>,
    loads: u64,
}

impl<B: Backend> EngineState<B> {
    fn new(backend: B, warmup_frames: usize) -> Self {
        Self {
            backend,
            warmup_frames,
            camera: None,
            model: None,
            loads: 0,
        }
    }

    fn bind_camera(
        &mut self,
        request: &CaptureRequest,
        reply: oneshot::Sender<Result<(), EngineError>>,
        metadata: oneshot::Sender<Dimensions>,
    ) {
        // Release the previous stream before reopening the device.
        self.camera = None;
        let mut camera = match self.backend.open_camera(request) {
            Ok(camera) => camera,
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };
        let _ = reply.send(Ok(()));

        if self.warmup_frames > 0 {
            tracing::debug!(count = self.warmup_frames, "discarding warmup frames");
            for _ in 0..self.warmup_frames {
                let _ = camera.capture_frame();
            }
        }

        // Dropping `metadata` on failure leaves the canvas at its old size.
        match camera.capture_frame() {
            Ok(frame) => {
                tracing::debug!(width = frame.width, height = frame.height, "first frame decoded");
                let _ = metadata.send(Dimensions::new(frame.width, frame.height));
            }
            Err(e) => tracing::warn!(error = %e, "first frame capture failed"),
        }
        self.camera = Some(camera);
    }

    fn load_model(&mut self) -> Result<ModelHandle, EngineError> {
        let estimator = self.backend.load_model()?;
        self.loads += 1;
        let handle = ModelHandle(self.loads);
        self.model = Some((handle, estimator));
        Ok(handle)
    }

    fn detect(&mut self) -> Result<Detection, EngineError> {
        let (handle, estimator) = self.model.as_mut().ok_or(EngineError::ModelNotLoaded)?;
        let camera = self.camera.as_mut().ok_or(EngineError::CameraNotBound)?;

        let frame = camera.capture_frame()?;
        let faces = estimator.estimate_faces(&frame.data, frame.width, frame.height)?;
        tracing::debug!(
            model = handle.0,
            sequence = frame.sequence,
            faces = faces.len(),
            "detection complete"
        );
        Ok(Detection { frame, faces })
    }
}
