//! Detection overlay rendering.

use crate::canvas::{DrawingSurface, SurfaceRect};
use crate::types::FaceBox;
use image::{Rgba, RgbImage};

/// Translucent red laid over the whole surface when nobody is in view
/// (`rgba(255, 0, 0, 0.3)`).
pub const NO_FACE_OVERLAY: Rgba<u8> = Rgba([255, 0, 0, 77]);
/// Outline color for detected faces (CSS `green`).
pub const FACE_STROKE: Rgba<u8> = Rgba([0, 128, 0, 255]);
pub const FACE_STROKE_WIDTH: u32 = 2;

/// Redraw `frame` on the surface and overlay the detection result.
///
/// No faces: a red veil over the whole surface. Otherwise one green outline
/// per face, in the order given.
pub fn visualize_faces<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    frame: &RgbImage,
    faces: &[FaceBox],
) {
    surface.clear();
    surface.draw_frame(frame);

    if faces.is_empty() {
        let dims = surface.dimensions();
        surface.fill_rect(
            SurfaceRect::new(0.0, 0.0, dims.width as f32, dims.height as f32),
            NO_FACE_OVERLAY,
        );
        return;
    }

    for face in faces {
        surface.stroke_rect(
            SurfaceRect::from_corners(face.top_left, face.bottom_right),
            FACE_STROKE,
            FACE_STROKE_WIDTH,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ImageCanvas;
    use crate::types::Dimensions;
    use image::Rgb;

    #[derive(Debug, PartialEq)]
    enum Op {
        Clear,
        Frame,
        Fill(SurfaceRect, Rgba<u8>),
        Stroke(SurfaceRect, Rgba<u8>, u32),
    }

    struct RecordingSurface {
        dims: Dimensions,
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                dims: Dimensions::new(width, height),
                ops: Vec::new(),
            }
        }

        fn fills(&self) -> usize {
            self.ops.iter().filter(|op| matches!(op, Op::Fill(..))).count()
        }

        fn strokes(&self) -> Vec<SurfaceRect> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Stroke(rect, _, _) => Some(*rect),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn dimensions(&self) -> Dimensions {
            self.dims
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.dims = Dimensions::new(width, height);
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn draw_frame(&mut self, _frame: &RgbImage) {
            self.ops.push(Op::Frame);
        }
        fn fill_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>) {
            self.ops.push(Op::Fill(rect, color));
        }
        fn stroke_rect(&mut self, rect: SurfaceRect, color: Rgba<u8>, line_width: u32) {
            self.ops.push(Op::Stroke(rect, color, line_width));
        }
    }

    fn frame() -> RgbImage {
        RgbImage::from_pixel(320, 240, Rgb([90, 90, 90]))
    }

    #[test]
    fn test_no_faces_single_red_overlay() {
        let mut surface = RecordingSurface::new(320, 240);
        visualize_faces(&mut surface, &frame(), &[]);

        assert_eq!(
            surface.ops,
            vec![
                Op::Clear,
                Op::Frame,
                Op::Fill(SurfaceRect::new(0.0, 0.0, 320.0, 240.0), NO_FACE_OVERLAY),
            ]
        );
        assert!(surface.strokes().is_empty());
    }

    #[test]
    fn test_each_face_stroked_in_order() {
        let faces = vec![
            FaceBox::from_corners([10.0, 20.0], [110.0, 140.0]),
            FaceBox::from_corners([200.0, 30.0], [260.0, 100.0]),
            // Duplicates are drawn as given.
            FaceBox::from_corners([10.0, 20.0], [110.0, 140.0]),
        ];
        let mut surface = RecordingSurface::new(320, 240);
        visualize_faces(&mut surface, &frame(), &faces);

        assert_eq!(surface.fills(), 0);
        let strokes = surface.strokes();
        assert_eq!(strokes.len(), faces.len());
        for (rect, face) in strokes.iter().zip(&faces) {
            assert_eq!(rect.x, face.top_left[0]);
            assert_eq!(rect.y, face.top_left[1]);
            assert_eq!(rect.x + rect.width, face.bottom_right[0]);
            assert_eq!(rect.y + rect.height, face.bottom_right[1]);
        }
        assert!(surface
            .ops
            .iter()
            .all(|op| !matches!(op, Op::Stroke(_, c, w) if *c != FACE_STROKE || *w != 2)));
    }

    #[test]
    fn test_clear_and_frame_precede_overlay() {
        let mut surface = RecordingSurface::new(320, 240);
        visualize_faces(
            &mut surface,
            &frame(),
            &[FaceBox::from_corners([0.0, 0.0], [5.0, 5.0])],
        );
        assert_eq!(surface.ops[0], Op::Clear);
        assert_eq!(surface.ops[1], Op::Frame);
    }

    #[test]
    fn test_image_canvas_red_veil() {
        let mut canvas = ImageCanvas::new(320, 240);
        visualize_faces(&mut canvas, &frame(), &[]);

        let px = canvas.image().get_pixel(160, 120);
        assert!(px[0] > px[1], "expected a red tint, got {px:?}");
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_image_canvas_face_outline() {
        let mut canvas = ImageCanvas::new(320, 240);
        let face = FaceBox::from_corners([100.0, 50.0], [200.0, 150.0]);
        visualize_faces(&mut canvas, &frame(), &[face]);

        assert_eq!(*canvas.image().get_pixel(100, 100), FACE_STROKE);
        // Inside the box the raw frame shows through.
        assert_eq!(*canvas.image().get_pixel(150, 100), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_out_of_range_faces_still_stroked() {
        let faces = vec![
            FaceBox::from_corners([-1e10, -1e10], [1e10, 1e10]),
            FaceBox::from_corners([f32::NAN, 1.0], [10.0, f32::INFINITY]),
        ];

        let mut surface = RecordingSurface::new(32, 24);
        visualize_faces(&mut surface, &frame(), &faces);
        assert_eq!(surface.strokes().len(), 2);

        let mut canvas = ImageCanvas::new(32, 24);
        visualize_faces(&mut canvas, &frame(), &faces);
        assert_eq!(canvas.dimensions(), Dimensions::new(32, 24));
    }
}
