//! BlazeFace face detector via ONNX Runtime.
//!
//! Runs the MediaPipe BlazeFace short-range model (128×128 input, 896 anchors)
//! and decodes its regressor/classificator outputs into corner boxes in frame
//! pixel space.

use crate::types::FaceBox;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

/// File name of the BlazeFace model inside the model directory.
pub const BLAZEFACE_MODEL_FILE: &str = "face_detection_short_range.onnx";

const BLAZEFACE_INPUT_SIZE: usize = 128;
const BLAZEFACE_NUM_ANCHORS: usize = 896;
const BLAZEFACE_REGRESSOR_LEN: usize = 16;
const BLAZEFACE_NUM_LANDMARKS: usize = 6;
/// (stride, anchors per cell) for the two feature maps.
const BLAZEFACE_ANCHOR_LAYERS: [(usize, usize); 2] = [(8, 2), (16, 6)];
const BLAZEFACE_SCORE_THRESHOLD: f32 = 0.75;
const BLAZEFACE_IOU_THRESHOLD: f32 = 0.3;
const BLAZEFACE_MAX_FACES: usize = 10;
const BLAZEFACE_SCORE_CLIP: f32 = 100.0;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0}; download the MediaPipe BlazeFace short-range model into the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Anything that turns an RGB frame into face boxes.
///
/// Implementations own their model and may mutate it per call.
pub trait FaceEstimator: Send {
    fn estimate_faces(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBox>, DetectorError>;
}

/// Output tensor indices: (regressors, classificators).
type OutputIndices = (usize, usize);

/// BlazeFace detector backed by an ONNX Runtime session.
pub struct BlazeFaceDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    outputs: OutputIndices,
}

impl BlazeFaceDetector {
    /// Load the BlazeFace ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded BlazeFace model"
        );

        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "BlazeFace model requires 2 outputs (regressors, classificators), got {}",
                output_names.len()
            )));
        }

        let outputs = discover_output_indices(&output_names);
        tracing::debug!(?outputs, "BlazeFace output tensor mapping");

        Ok(Self {
            session,
            anchors: generate_anchors(),
            outputs,
        })
    }
}

impl FaceEstimator for BlazeFaceDetector {
    fn estimate_faces(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBox>, DetectorError> {
        let input = preprocess(rgb, width as usize, height as usize)?;

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (reg_idx, cls_idx) = self.outputs;
        let (_, regressors) = outputs[reg_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("regressors: {e}")))?;
        let (_, scores) = outputs[cls_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("classificators: {e}")))?;

        let candidates = decode(
            regressors,
            scores,
            &self.anchors,
            width as f32,
            height as f32,
            BLAZEFACE_SCORE_THRESHOLD,
        );
        let mut faces = nms(candidates, BLAZEFACE_IOU_THRESHOLD);
        faces.truncate(BLAZEFACE_MAX_FACES);

        tracing::trace!(count = faces.len(), "BlazeFace detections");
        Ok(faces)
    }
}

/// Discover output tensor ordering by name.
///
/// MediaPipe exports name the outputs "regressors" and "classificators";
/// converted models sometimes use generic names, in which case the standard
/// positional ordering [regressors, classificators] is assumed.
fn discover_output_indices(names: &[String]) -> OutputIndices {
    let find = |needle: &str| names.iter().position(|n| n.contains(needle));

    match (find("regressor"), find("classificator")) {
        (Some(reg), Some(cls)) => (reg, cls),
        _ => {
            tracing::info!(
                ?names,
                "BlazeFace: output names not recognized, using positional mapping [0]=regressors, [1]=classificators"
            );
            (0, 1)
        }
    }
}

/// Resize an RGB24 frame to 128×128 (bilinear, no letterbox) and normalize
/// to [-1, 1] in NCHW layout.
fn preprocess(rgb: &[u8], width: usize, height: usize) -> Result<Array4<f32>, DetectorError> {
    if width == 0 || height == 0 || rgb.len() < width * height * 3 {
        return Err(DetectorError::InferenceFailed(format!(
            "RGB frame too short: {width}x{height} needs {} bytes, got {}",
            width * height * 3,
            rgb.len()
        )));
    }

    let size = BLAZEFACE_INPUT_SIZE;
    let scale_x = width as f32 / size as f32;
    let scale_y = height as f32 / size as f32;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        let src_y = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let y0 = (src_y.floor() as usize).min(height - 1);
        let y1 = (y0 + 1).min(height - 1);
        let fy = src_y - y0 as f32;

        for x in 0..size {
            let src_x = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let x0 = (src_x.floor() as usize).min(width - 1);
            let x1 = (x0 + 1).min(width - 1);
            let fx = src_x - x0 as f32;

            for c in 0..3 {
                let px = |xx: usize, yy: usize| rgb[(yy * width + xx) * 3 + c] as f32;
                let val = px(x0, y0) * (1.0 - fx) * (1.0 - fy)
                    + px(x1, y0) * fx * (1.0 - fy)
                    + px(x0, y1) * (1.0 - fx) * fy
                    + px(x1, y1) * fx * fy;
                tensor[[0, c, y, x]] = val / 127.5 - 1.0;
            }
        }
    }

    Ok(tensor)
}

/// Normalized anchor centers for the short-range model: a 16×16 grid with
/// two anchors per cell followed by an 8×8 grid with six.
fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(BLAZEFACE_NUM_ANCHORS);

    for &(stride, per_cell) in &BLAZEFACE_ANCHOR_LAYERS {
        let grid = BLAZEFACE_INPUT_SIZE / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Decode raw model outputs into face boxes in frame pixel space.
fn decode(
    regressors: &[f32],
    scores: &[f32],
    anchors: &[[f32; 2]],
    frame_width: f32,
    frame_height: f32,
    threshold: f32,
) -> Vec<FaceBox> {
    let input = BLAZEFACE_INPUT_SIZE as f32;
    let mut faces = Vec::new();

    for (idx, anchor) in anchors.iter().enumerate() {
        let Some(&logit) = scores.get(idx) else {
            break;
        };
        let probability = sigmoid(logit.clamp(-BLAZEFACE_SCORE_CLIP, BLAZEFACE_SCORE_CLIP));
        if probability < threshold {
            continue;
        }

        let off = idx * BLAZEFACE_REGRESSOR_LEN;
        let Some(reg) = regressors.get(off..off + BLAZEFACE_REGRESSOR_LEN) else {
            break;
        };

        let cx = anchor[0] + reg[0] / input;
        let cy = anchor[1] + reg[1] / input;
        let w = reg[2] / input;
        let h = reg[3] / input;

        let mut landmarks = [[0.0f32; 2]; BLAZEFACE_NUM_LANDMARKS];
        for (k, lm) in landmarks.iter_mut().enumerate() {
            lm[0] = (anchor[0] + reg[4 + k * 2] / input) * frame_width;
            lm[1] = (anchor[1] + reg[5 + k * 2] / input) * frame_height;
        }

        faces.push(FaceBox {
            top_left: [(cx - w / 2.0) * frame_width, (cy - h / 2.0) * frame_height],
            bottom_right: [(cx + w / 2.0) * frame_width, (cy + h / 2.0) * frame_height],
            probability,
            landmarks: Some(landmarks),
        });
    }

    faces
}

/// Non-Maximum Suppression: keep the most probable of overlapping boxes.
fn nms(mut faces: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    faces.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; faces.len()];

    for i in 0..faces.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(faces[i].clone());

        for j in (i + 1)..faces.len() {
            if !suppressed[j] && faces[i].iou(&faces[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
