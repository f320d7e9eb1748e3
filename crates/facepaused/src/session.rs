use crate::detection::DetectionLoop;
use crate::page::SharedPage;
use crate::player::MediaPlayer;

/// The start/stop button: Idle or Detecting.
pub struct SessionController<P> {
    detecting: bool,
    detection: DetectionLoop<P>,
    page: SharedPage,
}

impl<P: MediaPlayer> SessionController<P> {
    pub fn new(detection: DetectionLoop<P>, page: SharedPage) -> Self {
        Self {
            detecting: false,
            detection,
            page,
        }
    }

    #[cfg(test)]
    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    /// Flip between Idle and Detecting and return whether detection is now
    /// running. Startup failures are logged and leave the session Idle.
    pub async fn toggle(&mut self) -> bool {
        if self.detecting {
            self.detection.stop_detecting();
            self.detecting = false;
            tracing::info!("session stopped");
        } else {
            match self.detection.start_detecting().await {
                Ok(()) => {
                    self.detecting = true;
                    tracing::info!("session started");
                }
                Err(e) => {
                    self.detecting = false;
                    tracing::warn!(error = %e, "failed to start detection");
                }
            }
        }

        self.page.lock().await.set_detecting(self.detecting);
        self.detecting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attention::AttentionController;
    use crate::camera_source::{CameraSource, SharedCanvas};
    use crate::engine::spawn_engine;
    use crate::face_detector::FaceDetector;
    use crate::page::Page;
    use crate::testing::{wait_until, FakeBackend, FakePlayer, Rig};
    use facepause_core::ImageCanvas;
    use facepause_hw::CaptureRequest;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    const PERIOD: Duration = Duration::from_millis(100);
    const DEADLINE: Duration = Duration::from_secs(2);

    fn session(rig: &Arc<Rig>) -> (SessionController<FakePlayer>, SharedPage, FakePlayer) {
        let engine = spawn_engine(FakeBackend::new(Arc::clone(rig), 64, 48), 0).unwrap();
        let page = Page::shared();
        let player = FakePlayer::default();
        let canvas: SharedCanvas = Arc::new(Mutex::new(ImageCanvas::default()));
        let detection = DetectionLoop::new(
            CameraSource::new(engine.clone(), CaptureRequest::default(), Arc::clone(&canvas)),
            FaceDetector::new(engine),
            AttentionController::new(page.clone(), player.clone()),
            canvas,
            PERIOD,
        );
        (SessionController::new(detection, page.clone()), page, player)
    }

    #[tokio::test]
    async fn test_toggle_on_and_off() {
        let rig = Arc::new(Rig::default());
        let (mut session, page, _player) = session(&rig);

        assert!(session.toggle().await);
        assert!(session.is_detecting());
        assert!(page.lock().await.detecting);
        assert_eq!(page.lock().await.button_label, "Stop");

        assert!(!session.toggle().await);
        assert!(!session.is_detecting());
        assert!(!page.lock().await.detecting);
        assert_eq!(page.lock().await.button_label, "Start");
    }

    #[tokio::test]
    async fn test_permission_denied_stays_idle() {
        let rig = Arc::new(Rig::default());
        rig.fail_camera.store(true, Ordering::SeqCst);
        let (mut session, page, player) = session(&rig);

        assert!(!session.toggle().await);
        assert_eq!(page.lock().await.button_label, "Start");

        assert!(!session.toggle().await);
        assert!(!session.is_detecting());
        assert_eq!(page.lock().await.button_label, "Start");

        tokio::time::sleep(PERIOD * 2).await;
        assert!(player.calls().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_stays_idle() {
        let rig = Arc::new(Rig::default());
        rig.fail_model.store(true, Ordering::SeqCst);
        let (mut session, page, _player) = session(&rig);

        assert!(!session.toggle().await);
        assert_eq!(page.lock().await.button_label, "Start");
    }

    #[tokio::test]
    async fn test_recovers_after_failed_start() {
        let rig = Arc::new(Rig::default());
        rig.fail_camera.store(true, Ordering::SeqCst);
        let (mut session, _page, player) = session(&rig);
        assert!(!session.toggle().await);

        rig.fail_camera.store(false, Ordering::SeqCst);
        assert!(session.toggle().await);
        assert!(wait_until(DEADLINE, || !player.calls().is_empty()).await);
    }

    #[tokio::test]
    async fn test_stop_halts_attention_updates() {
        let rig = Arc::new(Rig::default());
        let (mut session, page, player) = session(&rig);
        session.toggle().await;
        assert!(wait_until(DEADLINE, || player.calls().len() >= 2).await);

        session.toggle().await;
        tokio::time::sleep(PERIOD).await;
        assert!(
            wait_until(DEADLINE, || {
                rig.estimate_calls.load(Ordering::SeqCst) == player.calls().len()
            })
            .await
        );
        let calls = player.calls().len();
        let status = page.lock().await.status_text.clone();

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(player.calls().len(), calls);
        assert_eq!(page.lock().await.status_text, status);
    }
}
