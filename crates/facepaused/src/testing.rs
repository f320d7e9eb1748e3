//! In-process fakes for the camera, model and media player.

use crate::engine::Backend;
use crate::player::{MediaPlayer, PlayerError};
use facepause_core::{DetectorError, FaceBox, FaceEstimator};
use facepause_hw::{CameraError, CaptureRequest, Frame, FrameSource};
use image::RgbImage;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared knobs and counters observed by tests.
#[derive(Default)]
pub struct Rig {
    pub faces: Mutex<Vec<FaceBox>>,
    pub estimate_delay_ms: AtomicU64,
    pub estimate_calls: AtomicUsize,
    pub frames_captured: AtomicUsize,
    pub camera_opens: AtomicUsize,
    pub model_loads: AtomicUsize,
    pub fail_camera: AtomicBool,
    pub fail_model: AtomicBool,
    pub fail_estimate: AtomicBool,
}

impl Rig {
    pub fn set_faces(&self, faces: Vec<FaceBox>) {
        *self.faces.lock().unwrap() = faces;
    }
}

pub struct FakeBackend {
    rig: Arc<Rig>,
    width: u32,
    height: u32,
}

impl FakeBackend {
    pub fn new(rig: Arc<Rig>, width: u32, height: u32) -> Self {
        Self {
            rig,
            width,
            height,
        }
    }
}

impl Backend for FakeBackend {
    fn open_camera(&mut self, _request: &CaptureRequest) -> Result<Box<dyn FrameSource>, CameraError> {
        if self.rig.fail_camera.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied("/dev/video0".into()));
        }
        self.rig.camera_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSource {
            rig: Arc::clone(&self.rig),
            width: self.width,
            height: self.height,
            sequence: AtomicU32::new(0),
        }))
    }

    fn load_model(&mut self) -> Result<Box<dyn FaceEstimator>, DetectorError> {
        if self.rig.fail_model.load(Ordering::SeqCst) {
            return Err(DetectorError::ModelNotFound("face_detection_short_range.onnx".into()));
        }
        self.rig.model_loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEstimator {
            rig: Arc::clone(&self.rig),
        }))
    }
}

struct FakeSource {
    rig: Arc<Rig>,
    width: u32,
    height: u32,
    sequence: AtomicU32,
}

impl FrameSource for FakeSource {
    fn capture_frame(&mut self) -> Result<Frame, CameraError> {
        self.rig.frames_captured.fetch_add(1, Ordering::SeqCst);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let image = RgbImage::from_pixel(self.width, self.height, image::Rgb([90, 120, 150]));
        Ok(Frame::from_rgb_image(image, sequence))
    }
}

struct FakeEstimator {
    rig: Arc<Rig>,
}

impl FaceEstimator for FakeEstimator {
    fn estimate_faces(
        &mut self,
        _rgb: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<FaceBox>, DetectorError> {
        self.rig.estimate_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.rig.estimate_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        if self.rig.fail_estimate.load(Ordering::SeqCst) {
            return Err(DetectorError::InferenceFailed("backend unavailable".into()));
        }
        Ok(self.rig.faces.lock().unwrap().clone())
    }
}

/// Records play/pause commands in order.
#[derive(Clone, Default)]
pub struct FakePlayer {
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    pub fail: Arc<AtomicBool>,
}

impl FakePlayer {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), PlayerError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlayerError::NoPlayer);
        }
        Ok(())
    }
}

impl MediaPlayer for FakePlayer {
    async fn play(&self) -> Result<(), PlayerError> {
        self.record("play")
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.record("pause")
    }
}

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
