use crate::camera_source::SharedCanvas;
use crate::page::{Page, SharedPage};
use crate::player::MprisPlayer;
use crate::session::SessionController;
use facepause_core::{Dimensions, DrawingSurface};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use zbus::interface;

pub const BUS_NAME: &str = "org.facepause.Daemon1";
pub const OBJECT_PATH: &str = "/org/facepause/Daemon1";

/// D-Bus interface for the facepause daemon.
///
/// Bus name: org.facepause.Daemon1
/// Object path: /org/facepause/Daemon1
pub struct FacepauseService {
    session: Arc<Mutex<SessionController<MprisPlayer>>>,
    page: SharedPage,
    canvas: SharedCanvas,
}

impl FacepauseService {
    pub fn new(
        session: SessionController<MprisPlayer>,
        page: SharedPage,
        canvas: SharedCanvas,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            page,
            canvas,
        }
    }
}

#[interface(name = "org.facepause.Daemon1")]
impl FacepauseService {
    /// Press the start/stop button. Returns whether detection is running.
    async fn toggle(&self) -> bool {
        tracing::info!("toggle requested");
        let mut session = self.session.lock().await;
        session.toggle().await
    }

    /// Return session, page and canvas state as JSON. Does not wait for a
    /// toggle in progress.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let page = self.page.lock().await.clone();
        let canvas = self.canvas.lock().await.dimensions();
        Ok(status_json(&page, canvas).to_string())
    }

    /// Write the current canvas to a PNG file.
    async fn snapshot(&self, path: &str) -> zbus::fdo::Result<()> {
        tracing::info!(path, "snapshot requested");
        self.canvas
            .lock()
            .await
            .save_png(Path::new(path))
            .map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }
}

fn status_json(page: &Page, canvas: Dimensions) -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "detecting": page.detecting,
        "button_label": page.button_label,
        "status_text": page.status_text,
        "status_class": page.status_class,
        "root_classes": page.root_classes,
        "canvas": {
            "width": canvas.width,
            "height": canvas.height,
        },
    })
}
