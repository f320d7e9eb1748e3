use crate::attention::AttentionController;
use crate::camera_source::{CameraSource, SharedCanvas};
use crate::engine::EngineError;
use crate::face_detector::FaceDetector;
use crate::player::{MediaPlayer, PlayerError};
use facepause_core::visualize_faces;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Error, Debug)]
pub enum TickError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("player error: {0}")]
    Player(#[from] PlayerError),
    #[error("frame {0} is shorter than its dimensions")]
    MalformedFrame(u32),
}

/// Periodic detect → visualize → attention cycle.
pub struct DetectionLoop<P> {
    camera: CameraSource,
    detector: FaceDetector,
    canvas: SharedCanvas,
    attention: Arc<AttentionController<P>>,
    period: Duration,
    timer: Option<JoinHandle<()>>,
}

impl<P: MediaPlayer> DetectionLoop<P> {
    pub fn new(
        camera: CameraSource,
        detector: FaceDetector,
        attention: AttentionController<P>,
        canvas: SharedCanvas,
        period: Duration,
    ) -> Self {
        Self {
            camera,
            detector,
            canvas,
            attention: Arc::new(attention),
            period,
            timer: None,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Bind the camera, load the model, then schedule a tick every period.
    /// The first tick fires one period after this returns.
    ///
    /// Ticks run as independent tasks: a slow tick does not delay the next
    /// one, and a failed tick is logged and does not stop the schedule.
    pub async fn start_detecting(&mut self) -> Result<(), EngineError> {
        self.camera.init_camera().await?;
        self.detector.load_model().await?;

        if let Some(previous) = self.timer.take() {
            previous.abort();
        }

        let tick = Tick {
            detector: self.detector.clone(),
            canvas: Arc::clone(&self.canvas),
            attention: Arc::clone(&self.attention),
        };
        let period = self.period;
        self.timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let tick = tick.clone();
                tokio::spawn(async move {
                    match tick.run().await {
                        Ok(faces) => tracing::debug!(faces, "tick complete"),
                        Err(e) => tracing::warn!(error = %e, "detection tick failed"),
                    }
                });
            }
        }));

        tracing::info!(period_ms = period.as_millis() as u64, "detection started");
        Ok(())
    }

    /// Cancel the schedule. Ticks already running are allowed to finish.
    pub fn stop_detecting(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::info!("detection stopped");
        }
    }
}

impl<P> Drop for DetectionLoop<P> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Tick<P> {
    detector: FaceDetector,
    canvas: SharedCanvas,
    attention: Arc<AttentionController<P>>,
}

impl<P> Clone for Tick<P> {
    fn clone(&self) -> Self {
        Self {
            detector: self.detector.clone(),
            canvas: Arc::clone(&self.canvas),
            attention: Arc::clone(&self.attention),
        }
    }
}

impl<P: MediaPlayer> Tick<P> {
    /// One cycle; returns the number of faces found.
    async fn run(&self) -> Result<usize, TickError> {
        let detection = self.detector.detect_faces().await?;
        let frame = detection
            .frame
            .to_rgb_image()
            .ok_or(TickError::MalformedFrame(detection.frame.sequence))?;

        {
            let mut canvas = self.canvas.lock().await;
            visualize_faces(&mut *canvas, &frame, &detection.faces);
        }

        let present = !detection.faces.is_empty();
        self.attention.handle_attention_state(present).await?;
        Ok(detection.faces.len())
    }
}
