//! Synthetic skeleton renderer.
//!
//! The group classifier was trained on line drawings of the hand, not on
//! camera pixels. Reproducing that drawing exactly matters more than making
//! it pretty:
//!
//! ```text
//! white background → 21 green bones (3 px) → 21 blue joints (wrist r=3, others r=2)
//! ```
//!
//! Joints are drawn last so bones never cover them.

use image::{imageops::FilterType, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::landmarks::{LandmarkSet, BONE_CONNECTIONS, WRIST};

/// Square 3-channel raster handed to the classifier.
pub type Canvas = RgbImage;

/// Side length the group classifier expects.
pub const CLASSIFIER_INPUT_SIZE: u32 = 400;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BONE_INK: Rgb<u8> = Rgb([0, 255, 0]);
const JOINT_INK: Rgb<u8> = Rgb([0, 0, 255]);
const BONE_WIDTH: i32 = 3;
const WRIST_RADIUS: i32 = 3;
const JOINT_RADIUS: i32 = 2;

/// Draw a normalized hand onto a fresh `canvas_size` × `canvas_size` canvas.
pub fn render(normalized: &LandmarkSet, canvas_size: u32) -> Canvas {
    let mut canvas = RgbImage::from_pixel(canvas_size, canvas_size, BACKGROUND);

    for (a, b) in BONE_CONNECTIONS {
        let start = (normalized[a].x, normalized[a].y);
        let end = (normalized[b].x, normalized[b].y);
        draw_thick_line(&mut canvas, start, end);
    }

    for (idx, point) in normalized.points().iter().enumerate() {
        let radius = if idx == WRIST {
            WRIST_RADIUS
        } else {
            JOINT_RADIUS
        };
        let center = (point.x.round() as i32, point.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, center, radius, JOINT_INK);
    }

    canvas
}

/// Approximate a `BONE_WIDTH` stroke with parallel one-pixel segments offset
/// across the line's minor axis.
fn draw_thick_line(canvas: &mut Canvas, start: (f32, f32), end: (f32, f32)) {
    let mostly_horizontal = (end.0 - start.0).abs() >= (end.1 - start.1).abs();
    let half = BONE_WIDTH / 2;
    for offset in -half..=half {
        let o = offset as f32;
        let (s, e) = if mostly_horizontal {
            ((start.0, start.1 + o), (end.0, end.1 + o))
        } else {
            ((start.0 + o, start.1), (end.0 + o, end.1))
        };
        draw_line_segment_mut(canvas, s, e, BONE_INK);
    }
}

/// Flatten a canvas into the classifier's NHWC input: `side` × `side` × 3
/// values scaled to `[0, 1]`, resizing first if the canvas differs in size.
pub fn canvas_to_input(canvas: &Canvas, side: u32) -> Vec<f32> {
    let resized;
    let source = if canvas.width() == side && canvas.height() == side {
        canvas
    } else {
        resized = image::imageops::resize(canvas, side, side, FilterType::Triangle);
        &resized
    };

    let mut input = Vec::with_capacity((side * side * 3) as usize);
    for pixel in source.pixels() {
        input.extend(pixel.0.iter().map(|c| f32::from(*c) / 255.0));
    }
    input
}
