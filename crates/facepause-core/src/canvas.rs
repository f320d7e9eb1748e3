//! 2D drawing surface abstraction and its RGBA raster implementation.

use crate::types::Dimensions;
use image::{imageops, DynamicImage, Pixel, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;
use thiserror::Error;

/// Initial size of a fresh canvas, matching an HTML canvas element.
pub const DEFAULT_CANVAS_WIDTH: u32 = 300;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 150;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Axis-aligned rectangle in surface pixel space, given by its origin and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners.
    pub fn from_corners(top_left: [f32; 2], bottom_right: [f32; 2]) -> Self {
        Self::new(
            top_left[0],
            top_left[1],
            bottom_right[0] - top_left[0],
            bottom_right[1] - top_left[1],
        )
    }
}

/// Immediate-mode drawing operations the visualizer needs.
pub trait DrawingSurface {
    fn dimensions(&self) -> Dimensions;

    /// Resize the surface; contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Reset every pixel to transparent black.
    fn clear(&mut self);

    /// Copy a frame onto the surface with its top-left corner at (0, 0).
    /// Parts of the frame beyond the surface are cropped.
    fn draw_frame(&mut self, frame: &RgbImage);

    /// Fill a rectangle, alpha-blending `color` over the current contents.
    fn fill_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>);

    /// Stroke the outline of a rectangle with the given line width, the
    /// stroke centered on the rectangle's edges.
    fn stroke_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>, line_width: u32);
}

/// Drawing surface backed by an in-memory RGBA image.
pub struct ImageCanvas {
    image: RgbaImage,
}

impl Default for ImageCanvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Encode the current contents as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), CanvasError> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

impl DrawingSurface for ImageCanvas {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_frame(&mut self, frame: &RgbImage) {
        let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
        imageops::replace(&mut self.image, &rgba, 0, 0);
    }

    fn fill_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>) {
        let (w, h) = self.image.dimensions();
        let x0 = rect.x.round().clamp(0.0, w as f32) as u32;
        let y0 = rect.y.round().clamp(0.0, h as f32) as u32;
        let x1 = (rect.x + rect.width).round().clamp(0.0, w as f32) as u32;
        let y1 = (rect.y + rect.height).round().clamp(0.0, h as f32) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                self.image.get_pixel_mut(x, y).blend(&color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>, line_width: u32) {
        // Edges are clamped to just beyond the surface so that huge or
        // non-finite corners stay in i32 range; NaN casts to 0.
        let (w, h) = self.image.dimensions();
        let margin = line_width as f32 + 1.0;
        let clamp_x = |v: f32| v.clamp(-margin, w as f32 + margin);
        let clamp_y = |v: f32| v.clamp(-margin, h as f32 + margin);
        let (x0, x1) = (clamp_x(rect.x), clamp_x(rect.x + rect.width));
        let (y0, y1) = (clamp_y(rect.y), clamp_y(rect.y + rect.height));

        let left = x0.min(x1).round() as i32;
        let top = y0.min(y1).round() as i32;
        let width = (x0.max(x1).round() as i32 - left).max(1);
        let height = (y0.max(y1).round() as i32 - top).max(1);

        // Nested one-pixel outlines, half outside and half inside the edge.
        let outer = (line_width / 2) as i32;
        for i in 0..line_width.max(1) as i32 {
            let offset = outer - i;
            let w = width + 2 * offset;
            let h = height + 2 * offset;
            if w <= 0 || h <= 0 {
                break;
            }
            let outline = Rect::at(left - offset, top - offset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut self.image, outline, color);
        }
    }
}
