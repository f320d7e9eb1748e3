//! facepause-core — Face detection and detection overlay rendering.
//!
//! Uses BlazeFace for face detection via ONNX Runtime, and draws detection
//! results onto a raster drawing surface.

pub mod canvas;
pub mod detector;
pub mod types;
pub mod visualizer;

use std::path::PathBuf;

pub use canvas::{CanvasError, DrawingSurface, ImageCanvas, SurfaceRect};
pub use detector::{BlazeFaceDetector, DetectorError, FaceEstimator, BLAZEFACE_MODEL_FILE};
pub use types::{Dimensions, FaceBox};
pub use visualizer::visualize_faces;

/// Default directory holding the ONNX model: `$XDG_DATA_HOME/facepause/models`,
/// falling back to `~/.local/share/facepause/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facepause")
        .join("models")
}
