//! Translate a raw hand into the centre of the classifier canvas.
//!
//! ## Algorithm
//!
//! 1. Bounding box of all 21 points (x and y independently).
//! 2. `offset = (canvas - extent) / 2 - min` on each axis.
//! 3. Translate every point by the offset.
//! 4. Clamp each coordinate into `[0, canvas - 1]`.
//!
//! No scaling happens: distances between landmarks survive unchanged (up to
//! clamping), which keeps hand size meaningful for the geometric rules.

use super::{Landmark, LandmarkSet};

/// Centre `raw` on a `canvas_size` × `canvas_size` canvas.
///
/// A degenerate hand (zero-width or zero-height box) still yields finite
/// coordinates; it simply renders as a point or a line.
pub fn normalize(raw: &LandmarkSet, canvas_size: u32) -> LandmarkSet {
    let canvas = canvas_size as f32;
    let (min_x, min_y, max_x, max_y) = raw.bounds();
    let hand_width = max_x - min_x;
    let hand_height = max_y - min_y;

    let offset_x = (canvas - hand_width) / 2.0 - min_x;
    let offset_y = (canvas - hand_height) / 2.0 - min_y;
    let upper = (canvas - 1.0).max(0.0);

    raw.map(|p| Landmark {
        x: clamp_finite(p.x + offset_x, upper),
        y: clamp_finite(p.y + offset_y, upper),
        z: p.z,
    })
}

fn clamp_finite(v: f32, upper: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, upper)
    } else {
        0.0
    }
}
