//! facepause-hw — Hardware abstraction for webcam capture.
//!
//! Provides V4L2-based camera access delivering RGB frames at a requested
//! resolution, plus discovery of the user-facing capture device.

pub mod camera;
pub mod frame;

pub use camera::{
    select_user_facing, Camera, CameraError, CaptureRequest, DeviceInfo, FrameSource, PixelFormat,
};
pub use frame::Frame;
