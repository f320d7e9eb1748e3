use serde::{Deserialize, Serialize};

/// Bounding box of one detected face, in frame pixel coordinates.
///
/// Corners follow the detector's convention: `top_left` is the minimum
/// corner and `bottom_right` the maximum one. Coordinates may fall outside
/// the frame when a face is partially out of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub top_left: [f32; 2],
    pub bottom_right: [f32; 2],
    /// Model confidence in [0, 1].
    pub probability: f32,
    /// Six keypoints: [right_eye, left_eye, nose, mouth, right_ear, left_ear].
    pub landmarks: Option<[[f32; 2]; 6]>,
}

impl FaceBox {
    /// Build a box from its two corners with no landmarks.
    pub fn from_corners(top_left: [f32; 2], bottom_right: [f32; 2]) -> Self {
        Self {
            top_left,
            bottom_right,
            probability: 1.0,
            landmarks: None,
        }
    }

    pub fn width(&self) -> f32 {
        self.bottom_right[0] - self.top_left[0]
    }

    pub fn height(&self) -> f32 {
        self.bottom_right[1] - self.top_left[1]
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &FaceBox) -> f32 {
        let x1 = self.top_left[0].max(other.top_left[0]);
        let y1 = self.top_left[1].max(other.top_left[1]);
        let x2 = self.bottom_right[0].min(other.bottom_right[0]);
        let y2 = self.bottom_right[1].min(other.bottom_right[1]);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Pixel dimensions of a frame or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
