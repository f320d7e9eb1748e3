use crate::engine::{Detection, EngineError, EngineHandle, ModelHandle};

/// Owns the loaded model handle and runs detection against the current
/// camera frame.
#[derive(Clone)]
pub struct FaceDetector {
    engine: EngineHandle,
    model: Option<ModelHandle>,
}

impl FaceDetector {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            model: None,
        }
    }

    /// Load the model, replacing any previously loaded one.
    pub async fn load_model(&mut self) -> Result<ModelHandle, EngineError> {
        let handle = self.engine.load_model().await?;
        self.model = Some(handle);
        Ok(handle)
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Detect faces in the current camera frame. Fails with
    /// `ModelNotLoaded` without touching the camera or the model when
    /// `load_model` has not succeeded.
    pub async fn detect_faces(&self) -> Result<Detection, EngineError> {
        if self.model.is_none() {
            return Err(EngineError::ModelNotLoaded);
        }
        self.engine.detect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_engine;
    use crate::testing::{FakeBackend, Rig};
    use facepause_core::FaceBox;
    use facepause_hw::CaptureRequest;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_detect_requires_model() {
        let rig = Arc::new(Rig::default());
        let engine = spawn_engine(FakeBackend::new(Arc::clone(&rig), 32, 24), 0).unwrap();
        engine.bind_camera(CaptureRequest::default()).await.unwrap();
        let detector = FaceDetector::new(engine);

        assert!(!detector.is_loaded());
        assert!(matches!(detector.detect_faces().await, Err(EngineError::ModelNotLoaded)));
        assert_eq!(rig.estimate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detect_after_load() {
        let rig = Arc::new(Rig::default());
        rig.set_faces(vec![
            FaceBox::from_corners([2.0, 2.0], [10.0, 10.0]),
            FaceBox::from_corners([12.0, 4.0], [20.0, 14.0]),
        ]);
        let engine = spawn_engine(FakeBackend::new(Arc::clone(&rig), 32, 24), 0).unwrap();
        engine.bind_camera(CaptureRequest::default()).await.unwrap();
        let mut detector = FaceDetector::new(engine);

        detector.load_model().await.unwrap();
        let detection = detector.detect_faces().await.unwrap();
        assert_eq!(detection.faces.len(), 2);
        assert_eq!(rig.estimate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_detector_unloaded() {
        let rig = Arc::new(Rig::default());
        rig.fail_model.store(true, Ordering::SeqCst);
        let engine = spawn_engine(FakeBackend::new(rig, 32, 24), 0).unwrap();
        let mut detector = FaceDetector::new(engine);

        assert!(matches!(detector.load_model().await, Err(EngineError::Detector(_))));
        assert!(!detector.is_loaded());
    }
}
